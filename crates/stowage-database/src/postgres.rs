//! PostgreSQL-backed [`Catalog`].

use async_trait::async_trait;

use stowage_core::result::AppResult;
use stowage_core::types::{FileId, FolderId, SizeMb, UserId};
use stowage_entity::file::{CreateFileItem, FileItem};
use stowage_entity::folder::{CreateFolder, Folder};
use stowage_entity::user::{CreateUser, User};

use crate::catalog::{CascadeOutcome, Catalog, SubtreeCascade};
use crate::connection::DatabasePool;
use crate::repositories::{FileRepository, FolderRepository, UserRepository};

/// Catalog stored in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    db: DatabasePool,
    users: UserRepository,
    folders: FolderRepository,
    files: FileRepository,
}

impl PgCatalog {
    /// Build the repositories over an open pool.
    pub fn new(db: DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            users: UserRepository::new(pool.clone()),
            folders: FolderRepository::new(pool.clone()),
            files: FileRepository::new(pool),
            db,
        }
    }

    /// The underlying pool wrapper.
    pub fn database(&self) -> &DatabasePool {
        &self.db
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn health_check(&self) -> AppResult<bool> {
        self.db.health_check().await
    }

    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        self.users.find_by_id(id).await
    }

    async fn create_user(&self, data: &CreateUser) -> AppResult<User> {
        self.users.create(data).await
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.users.find_all().await
    }

    async fn add_used_storage(&self, id: UserId, delta: SizeMb) -> AppResult<User> {
        self.users.add_usage(id, delta).await
    }

    async fn release_used_storage(&self, id: UserId, delta: SizeMb) -> AppResult<User> {
        self.users.release_usage(id, delta).await
    }

    async fn find_folder(
        &self,
        user_id: UserId,
        id: FolderId,
        is_deleted: bool,
    ) -> AppResult<Option<Folder>> {
        self.folders.find_by_id(user_id, id, is_deleted).await
    }

    async fn find_folder_by_name(
        &self,
        user_id: UserId,
        parent: Option<FolderId>,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        self.folders.find_by_name(user_id, parent, name).await
    }

    async fn list_folders(&self, user_id: UserId, is_deleted: bool) -> AppResult<Vec<Folder>> {
        self.folders.find_all(user_id, is_deleted).await
    }

    async fn list_child_folders(
        &self,
        user_id: UserId,
        parent: Option<FolderId>,
        is_deleted: bool,
    ) -> AppResult<Vec<Folder>> {
        self.folders.find_children(user_id, parent, is_deleted).await
    }

    async fn search_folders(
        &self,
        user_id: UserId,
        keyword: &str,
        is_deleted: bool,
    ) -> AppResult<Vec<Folder>> {
        self.folders.search(user_id, keyword, is_deleted).await
    }

    async fn folder_sibling_names(
        &self,
        user_id: UserId,
        parent: Option<FolderId>,
        exclude: Option<FolderId>,
    ) -> AppResult<Vec<String>> {
        self.folders.sibling_names(user_id, parent, exclude).await
    }

    async fn create_folder(&self, data: &CreateFolder) -> AppResult<Folder> {
        self.folders.create(data).await
    }

    async fn apply_cascade(&self, cascade: &SubtreeCascade) -> AppResult<CascadeOutcome> {
        self.folders.apply_cascade(cascade).await
    }

    async fn delete_folder(&self, user_id: UserId, id: FolderId) -> AppResult<bool> {
        self.folders.delete(user_id, id).await
    }

    async fn find_file(
        &self,
        user_id: UserId,
        id: FileId,
        is_deleted: bool,
    ) -> AppResult<Option<FileItem>> {
        self.files.find_by_id(user_id, id, is_deleted).await
    }

    async fn list_files(&self, user_id: UserId, is_deleted: bool) -> AppResult<Vec<FileItem>> {
        self.files.find_all(user_id, is_deleted).await
    }

    async fn list_child_files(
        &self,
        user_id: UserId,
        folder: Option<FolderId>,
        is_deleted: bool,
    ) -> AppResult<Vec<FileItem>> {
        self.files.find_by_folder(user_id, folder, is_deleted).await
    }

    async fn search_files(
        &self,
        user_id: UserId,
        keyword: &str,
        is_deleted: bool,
    ) -> AppResult<Vec<FileItem>> {
        self.files.search(user_id, keyword, is_deleted).await
    }

    async fn file_sibling_names(
        &self,
        user_id: UserId,
        folder: Option<FolderId>,
        exclude: Option<FileId>,
    ) -> AppResult<Vec<String>> {
        self.files.sibling_names(user_id, folder, exclude).await
    }

    async fn create_file(&self, data: &CreateFileItem) -> AppResult<FileItem> {
        self.files.create(data).await
    }

    async fn update_file(&self, file: &FileItem) -> AppResult<FileItem> {
        self.files.update(file).await
    }

    async fn delete_file(&self, user_id: UserId, id: FileId) -> AppResult<bool> {
        self.files.delete(user_id, id).await
    }
}
