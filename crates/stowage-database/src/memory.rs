//! In-memory catalog used by tests and `backend = "memory"` dev runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::types::{FileId, FolderId, SizeMb, UserId};
use stowage_entity::file::{CreateFileItem, FileItem};
use stowage_entity::folder::{CreateFolder, Folder};
use stowage_entity::user::{CreateUser, User};

use crate::catalog::{
    CascadeOutcome, Catalog, SubtreeCascade, is_beneath, rewrite_prefix,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    folders: HashMap<FolderId, Folder>,
    files: HashMap<FileId, FileItem>,
}

/// Catalog kept entirely in process memory.
///
/// A cascade runs inside a single write-lock section, which gives it the
/// same all-or-nothing visibility as a database transaction.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_name<T>(items: &mut [T], name: impl Fn(&T) -> String) {
    items.sort_by_key(|item| name(item).to_lowercase());
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_user(&self, data: &CreateUser) -> AppResult<User> {
        let user = User {
            id: UserId::new(),
            full_name: data.full_name.clone(),
            department: data.department.clone(),
            total_storage_mb: data.total_storage_mb,
            used_storage_mb: SizeMb::ZERO,
            created_at: Utc::now(),
        };
        self.tables.write().await.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.tables.read().await.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn add_used_storage(&self, id: UserId, delta: SizeMb) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.used_storage_mb += delta;
        Ok(user.clone())
    }

    async fn release_used_storage(&self, id: UserId, delta: SizeMb) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.used_storage_mb = user.used_storage_mb.saturating_sub(delta);
        Ok(user.clone())
    }

    async fn find_folder(
        &self,
        user_id: UserId,
        id: FolderId,
        is_deleted: bool,
    ) -> AppResult<Option<Folder>> {
        Ok(self
            .tables
            .read()
            .await
            .folders
            .get(&id)
            .filter(|f| f.user_id == user_id && f.is_deleted == is_deleted)
            .cloned())
    }

    async fn find_folder_by_name(
        &self,
        user_id: UserId,
        parent: Option<FolderId>,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        Ok(self
            .tables
            .read()
            .await
            .folders
            .values()
            .find(|f| {
                f.user_id == user_id
                    && !f.is_deleted
                    && f.parent_folder_id == parent
                    && f.name.to_lowercase() == name.to_lowercase()
            })
            .cloned())
    }

    async fn list_folders(&self, user_id: UserId, is_deleted: bool) -> AppResult<Vec<Folder>> {
        let mut folders: Vec<Folder> = self
            .tables
            .read()
            .await
            .folders
            .values()
            .filter(|f| f.user_id == user_id && f.is_deleted == is_deleted)
            .cloned()
            .collect();
        by_name(&mut folders, |f| f.name.clone());
        Ok(folders)
    }

    async fn list_child_folders(
        &self,
        user_id: UserId,
        parent: Option<FolderId>,
        is_deleted: bool,
    ) -> AppResult<Vec<Folder>> {
        let mut folders = self.list_folders(user_id, is_deleted).await?;
        folders.retain(|f| f.parent_folder_id == parent);
        Ok(folders)
    }

    async fn search_folders(
        &self,
        user_id: UserId,
        keyword: &str,
        is_deleted: bool,
    ) -> AppResult<Vec<Folder>> {
        let needle = keyword.to_lowercase();
        let mut folders = self.list_folders(user_id, is_deleted).await?;
        folders.retain(|f| f.name.to_lowercase().contains(&needle));
        Ok(folders)
    }

    async fn folder_sibling_names(
        &self,
        user_id: UserId,
        parent: Option<FolderId>,
        exclude: Option<FolderId>,
    ) -> AppResult<Vec<String>> {
        Ok(self
            .list_child_folders(user_id, parent, false)
            .await?
            .into_iter()
            .filter(|f| Some(f.id) != exclude)
            .map(|f| f.name)
            .collect())
    }

    async fn create_folder(&self, data: &CreateFolder) -> AppResult<Folder> {
        let folder = Folder {
            id: FolderId::new(),
            user_id: data.user_id,
            name: data.name.clone(),
            parent_folder_id: data.parent_folder_id,
            path: data.path.clone(),
            created_at: Utc::now(),
            is_deleted: false,
            recycle_path: None,
        };
        self.tables
            .write()
            .await
            .folders
            .insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn apply_cascade(&self, cascade: &SubtreeCascade) -> AppResult<CascadeOutcome> {
        let mut tables = self.tables.write().await;
        let Tables { folders, files, .. } = &mut *tables;

        let owned = folders
            .get(&cascade.root_id)
            .is_some_and(|f| f.user_id == cascade.user_id);
        if !owned {
            return Err(AppError::not_found(format!(
                "Folder {} not found",
                cascade.root_id
            )));
        }
        let old_path = cascade.old_path.clone();

        // Separately deleted folders inside the subtree keep their own rows.
        let shields: Vec<String> = if cascade.match_deleted {
            folders
                .values()
                .filter(|f| {
                    f.id != cascade.root_id
                        && f.user_id == cascade.user_id
                        && f.is_deleted
                        && f.recycle_path.is_some()
                        && is_beneath(&f.path, &old_path)
                })
                .map(|f| f.path.clone())
                .collect()
        } else {
            Vec::new()
        };

        let matches = |user_id: UserId, path: &str, is_deleted: bool, recycle: &Option<String>| {
            user_id == cascade.user_id
                && is_deleted == cascade.match_deleted
                && recycle.is_none()
                && is_beneath(path, &old_path)
                && !shields.iter().any(|s| is_beneath(path, s))
        };

        let old_prefix = cascade.old_prefix();
        let new_prefix = cascade.new_prefix();

        let mut folders_updated = 0;
        for folder in folders.values_mut() {
            if folder.id != cascade.root_id
                && matches(folder.user_id, &folder.path, folder.is_deleted, &folder.recycle_path)
            {
                if let Some(path) = rewrite_prefix(&folder.path, &old_prefix, &new_prefix) {
                    folder.path = path;
                }
                folder.is_deleted = cascade.set_deleted;
                folders_updated += 1;
            }
        }

        let mut files_updated = 0;
        for file in files.values_mut() {
            if matches(file.user_id, &file.path, file.is_deleted, &file.recycle_path) {
                if let Some(path) = rewrite_prefix(&file.path, &old_prefix, &new_prefix) {
                    file.path = path;
                }
                file.is_deleted = cascade.set_deleted;
                files_updated += 1;
            }
        }

        if cascade.carry_deleted {
            let beneath = |user_id: UserId, path: &str, is_deleted: bool| {
                user_id == cascade.user_id && is_deleted && is_beneath(path, &old_path)
            };
            for folder in folders.values_mut() {
                if folder.id != cascade.root_id
                    && beneath(folder.user_id, &folder.path, folder.is_deleted)
                {
                    if let Some(path) = rewrite_prefix(&folder.path, &old_prefix, &new_prefix) {
                        folder.path = path;
                    }
                }
            }
            for file in files.values_mut() {
                if beneath(file.user_id, &file.path, file.is_deleted) {
                    if let Some(path) = rewrite_prefix(&file.path, &old_prefix, &new_prefix) {
                        file.path = path;
                    }
                }
            }
        }

        let root = folders
            .get_mut(&cascade.root_id)
            .ok_or_else(|| AppError::not_found(format!("Folder {} not found", cascade.root_id)))?;
        if let Some(name) = &cascade.new_name {
            root.name = name.clone();
        }
        root.path = cascade.new_path.clone();
        root.is_deleted = cascade.set_deleted;
        root.recycle_path = cascade.recycle_path.clone();

        debug!(
            folder_id = %cascade.root_id,
            folders_updated,
            files_updated,
            "Applied subtree cascade"
        );

        Ok(CascadeOutcome {
            root: root.clone(),
            folders_updated,
            files_updated,
        })
    }

    async fn delete_folder(&self, user_id: UserId, id: FolderId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .folders
            .get(&id)
            .is_some_and(|f| f.user_id == user_id);
        if !owned {
            return Ok(false);
        }
        tables.folders.remove(&id);
        for folder in tables.folders.values_mut() {
            if folder.parent_folder_id == Some(id) {
                folder.parent_folder_id = None;
            }
        }
        for file in tables.files.values_mut() {
            if file.folder_id == Some(id) {
                file.folder_id = None;
            }
        }
        Ok(true)
    }

    async fn find_file(
        &self,
        user_id: UserId,
        id: FileId,
        is_deleted: bool,
    ) -> AppResult<Option<FileItem>> {
        Ok(self
            .tables
            .read()
            .await
            .files
            .get(&id)
            .filter(|f| f.user_id == user_id && f.is_deleted == is_deleted)
            .cloned())
    }

    async fn list_files(&self, user_id: UserId, is_deleted: bool) -> AppResult<Vec<FileItem>> {
        let mut files: Vec<FileItem> = self
            .tables
            .read()
            .await
            .files
            .values()
            .filter(|f| f.user_id == user_id && f.is_deleted == is_deleted)
            .cloned()
            .collect();
        by_name(&mut files, FileItem::file_name);
        Ok(files)
    }

    async fn list_child_files(
        &self,
        user_id: UserId,
        folder: Option<FolderId>,
        is_deleted: bool,
    ) -> AppResult<Vec<FileItem>> {
        let mut files = self.list_files(user_id, is_deleted).await?;
        files.retain(|f| f.folder_id == folder);
        Ok(files)
    }

    async fn search_files(
        &self,
        user_id: UserId,
        keyword: &str,
        is_deleted: bool,
    ) -> AppResult<Vec<FileItem>> {
        let needle = keyword.to_lowercase();
        let mut files = self.list_files(user_id, is_deleted).await?;
        files.retain(|f| {
            f.name.to_lowercase().contains(&needle) || f.file_type.to_lowercase().contains(&needle)
        });
        Ok(files)
    }

    async fn file_sibling_names(
        &self,
        user_id: UserId,
        folder: Option<FolderId>,
        exclude: Option<FileId>,
    ) -> AppResult<Vec<String>> {
        Ok(self
            .list_child_files(user_id, folder, false)
            .await?
            .into_iter()
            .filter(|f| Some(f.id) != exclude)
            .map(|f| f.file_name())
            .collect())
    }

    async fn create_file(&self, data: &CreateFileItem) -> AppResult<FileItem> {
        let file = FileItem {
            id: FileId::new(),
            user_id: data.user_id,
            name: data.name.clone(),
            file_type: data.file_type.clone(),
            size_mb: data.size_mb,
            folder_id: data.folder_id,
            path: data.path.clone(),
            uploaded_at: Utc::now(),
            is_deleted: false,
            recycle_path: None,
        };
        self.tables.write().await.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn update_file(&self, file: &FileItem) -> AppResult<FileItem> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .files
            .get_mut(&file.id)
            .filter(|f| f.user_id == file.user_id)
            .ok_or_else(|| AppError::not_found(format!("File {} not found", file.id)))?;
        stored.name = file.name.clone();
        stored.path = file.path.clone();
        stored.is_deleted = file.is_deleted;
        stored.recycle_path = file.recycle_path.clone();
        Ok(stored.clone())
    }

    async fn delete_file(&self, user_id: UserId, id: FileId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables.files.get(&id).is_some_and(|f| f.user_id == user_id);
        if owned {
            tables.files.remove(&id);
        }
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use std::path::MAIN_SEPARATOR;

    use super::*;

    fn join(parts: &[&str]) -> String {
        parts.join(&MAIN_SEPARATOR.to_string())
    }

    async fn user(catalog: &MemoryCatalog) -> User {
        catalog
            .create_user(&CreateUser {
                full_name: "Ada".into(),
                department: None,
                total_storage_mb: SizeMb::from_whole_mb(200),
            })
            .await
            .unwrap()
    }

    async fn folder(
        catalog: &MemoryCatalog,
        user: &User,
        parent: Option<&Folder>,
        name: &str,
    ) -> Folder {
        let path = match parent {
            Some(p) => join(&[&p.path, name]),
            None => join(&["", "root", name]),
        };
        catalog
            .create_folder(&CreateFolder {
                user_id: user.id,
                name: name.into(),
                parent_folder_id: parent.map(|p| p.id),
                path,
            })
            .await
            .unwrap()
    }

    async fn file(catalog: &MemoryCatalog, user: &User, parent: &Folder, name: &str) -> FileItem {
        catalog
            .create_file(&CreateFileItem {
                user_id: user.id,
                name: name.into(),
                file_type: "txt".into(),
                size_mb: SizeMb::from_whole_mb(1),
                folder_id: Some(parent.id),
                path: join(&[&parent.path, &format!("{name}.txt")]),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_rename_cascade_is_boundary_safe() {
        let catalog = MemoryCatalog::new();
        let u = user(&catalog).await;
        let foo = folder(&catalog, &u, None, "Foo").await;
        let foo2 = folder(&catalog, &u, None, "Foo2").await;
        let inner = folder(&catalog, &u, Some(&foo), "inner").await;
        let a = file(&catalog, &u, &inner, "a").await;
        let b = file(&catalog, &u, &foo2, "b").await;

        let new_path = join(&["", "root", "Bar"]);
        let outcome = catalog
            .apply_cascade(&SubtreeCascade::rename(&foo, "Bar", &new_path))
            .await
            .unwrap();
        assert_eq!(outcome.root.name, "Bar");
        assert_eq!(outcome.folders_updated, 1);
        assert_eq!(outcome.files_updated, 1);

        let inner = catalog.find_folder(u.id, inner.id, false).await.unwrap().unwrap();
        assert_eq!(inner.path, join(&["", "root", "Bar", "inner"]));
        let a = catalog.find_file(u.id, a.id, false).await.unwrap().unwrap();
        assert_eq!(a.path, join(&["", "root", "Bar", "inner", "a.txt"]));
        let b_after = catalog.find_file(u.id, b.id, false).await.unwrap().unwrap();
        assert_eq!(b_after.path, b.path);
        let foo2_after = catalog.find_folder(u.id, foo2.id, false).await.unwrap().unwrap();
        assert_eq!(foo2_after.path, foo2.path);
    }

    #[tokio::test]
    async fn test_soft_delete_and_recover_cascade() {
        let catalog = MemoryCatalog::new();
        let u = user(&catalog).await;
        let docs = folder(&catalog, &u, None, "Docs").await;
        let sub = folder(&catalog, &u, Some(&docs), "Sub").await;
        let f = file(&catalog, &u, &sub, "notes").await;

        let bin = join(&["", "root", "RecycleBin", "Docs"]);
        let outcome = catalog
            .apply_cascade(&SubtreeCascade::soft_delete(&docs, &bin))
            .await
            .unwrap();
        assert!(outcome.root.is_deleted);
        assert_eq!(outcome.root.path, docs.path);
        assert_eq!(outcome.root.recycle_path.as_deref(), Some(bin.as_str()));
        assert!(catalog.find_folder(u.id, sub.id, true).await.unwrap().is_some());
        assert!(catalog.find_file(u.id, f.id, true).await.unwrap().is_some());

        let deleted = catalog.find_folder(u.id, docs.id, true).await.unwrap().unwrap();
        let new_path = join(&["", "root", "Docs (2)"]);
        let outcome = catalog
            .apply_cascade(&SubtreeCascade::recover(&deleted, "Docs (2)", &new_path))
            .await
            .unwrap();
        assert!(!outcome.root.is_deleted);
        assert!(outcome.root.recycle_path.is_none());

        let f = catalog.find_file(u.id, f.id, false).await.unwrap().unwrap();
        assert_eq!(f.path, join(&["", "root", "Docs (2)", "Sub", "notes.txt"]));
    }

    #[tokio::test]
    async fn test_recover_leaves_separately_deleted_items() {
        let catalog = MemoryCatalog::new();
        let u = user(&catalog).await;
        let docs = folder(&catalog, &u, None, "Docs").await;
        let f = file(&catalog, &u, &docs, "alone").await;

        let mut alone = f.clone();
        alone.is_deleted = true;
        alone.recycle_path = Some(join(&["", "root", "RecycleBin", "alone.txt"]));
        catalog.update_file(&alone).await.unwrap();

        catalog
            .apply_cascade(&SubtreeCascade::soft_delete(&docs, "bin"))
            .await
            .unwrap();
        let deleted = catalog.find_folder(u.id, docs.id, true).await.unwrap().unwrap();
        let outcome = catalog
            .apply_cascade(&SubtreeCascade::recover(&deleted, "Docs", &docs.path))
            .await
            .unwrap();
        assert_eq!(outcome.files_updated, 0);
        assert!(catalog.find_file(u.id, f.id, true).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rename_carries_deleted_rows_without_reviving_them() {
        let catalog = MemoryCatalog::new();
        let u = user(&catalog).await;
        let docs = folder(&catalog, &u, None, "Docs").await;
        let f = file(&catalog, &u, &docs, "gone").await;

        let bin_copy = join(&["", "root", "RecycleBin", "gone.txt"]);
        let mut gone = f.clone();
        gone.is_deleted = true;
        gone.recycle_path = Some(bin_copy.clone());
        catalog.update_file(&gone).await.unwrap();

        let new_path = join(&["", "root", "Papers"]);
        let outcome = catalog
            .apply_cascade(&SubtreeCascade::rename(&docs, "Papers", &new_path))
            .await
            .unwrap();
        assert_eq!(outcome.files_updated, 0);

        let gone = catalog.find_file(u.id, f.id, true).await.unwrap().unwrap();
        assert_eq!(gone.path, join(&["", "root", "Papers", "gone.txt"]));
        assert_eq!(gone.recycle_path.as_deref(), Some(bin_copy.as_str()));
    }

    #[tokio::test]
    async fn test_find_folder_by_name_ignores_case() {
        let catalog = MemoryCatalog::new();
        let u = user(&catalog).await;
        let docs = folder(&catalog, &u, None, "Docs").await;

        let found = catalog.find_folder_by_name(u.id, None, "DOCS").await.unwrap();
        assert_eq!(found.map(|f| f.id), Some(docs.id));
    }

    #[tokio::test]
    async fn test_lookups_are_owner_scoped() {
        let catalog = MemoryCatalog::new();
        let owner = user(&catalog).await;
        let other = user(&catalog).await;
        let docs = folder(&catalog, &owner, None, "Docs").await;

        assert!(catalog.find_folder(other.id, docs.id, false).await.unwrap().is_none());
        assert!(catalog.find_folder(owner.id, docs.id, true).await.unwrap().is_none());
        assert!(!catalog.delete_folder(other.id, docs.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_clamps_at_zero() {
        let catalog = MemoryCatalog::new();
        let u = user(&catalog).await;
        catalog
            .add_used_storage(u.id, SizeMb::from_whole_mb(2))
            .await
            .unwrap();
        let after = catalog
            .release_used_storage(u.id, SizeMb::from_whole_mb(5))
            .await
            .unwrap();
        assert_eq!(after.used_storage_mb, SizeMb::ZERO);
    }

    #[tokio::test]
    async fn test_sibling_names_exclude_self_and_deleted() {
        let catalog = MemoryCatalog::new();
        let u = user(&catalog).await;
        let a = folder(&catalog, &u, None, "A").await;
        folder(&catalog, &u, None, "B").await;
        let gone = folder(&catalog, &u, None, "C").await;
        catalog
            .apply_cascade(&SubtreeCascade::soft_delete(&gone, "bin"))
            .await
            .unwrap();

        let names = catalog
            .folder_sibling_names(u.id, None, Some(a.id))
            .await
            .unwrap();
        assert_eq!(names, vec!["B".to_string()]);
    }
}
