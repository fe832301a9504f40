//! The Catalog: transactional metadata store for users, folders and files.
//!
//! Two implementations exist: [`crate::PgCatalog`] for PostgreSQL and
//! [`crate::MemoryCatalog`] for tests and ephemeral runs. Both must agree on
//! the subtree cascade rules implemented by [`SubtreeCascade`].

use std::path::MAIN_SEPARATOR;

use async_trait::async_trait;

use stowage_core::result::AppResult;
use stowage_core::types::{FileId, FolderId, SizeMb, UserId};
use stowage_entity::file::{CreateFileItem, FileItem};
use stowage_entity::folder::{CreateFolder, Folder};
use stowage_entity::user::{CreateUser, User};

/// An atomic update of a folder and everything recorded beneath it.
///
/// Descendants are matched by a boundary-safe prefix on their stored path
/// (`old_path + SEP`), by owner, and by delete-state. Rows carrying a
/// `recycle_path` were soft-deleted on their own and own separate bin
/// entries: when matching deleted rows they, and anything recorded beneath
/// such a folder, are left alone.
#[derive(Debug, Clone)]
pub struct SubtreeCascade {
    /// Owner of the subtree.
    pub user_id: UserId,
    /// The folder at the top of the subtree.
    pub root_id: FolderId,
    /// Path of the root before the operation.
    pub old_path: String,
    /// Path of the root after the operation (equal to `old_path` when only
    /// the delete-state changes).
    pub new_path: String,
    /// New name for the root, if it changes.
    pub new_name: Option<String>,
    /// Delete-state descendants must currently have to be included.
    pub match_deleted: bool,
    /// Delete-state written to the root and every matched descendant.
    pub set_deleted: bool,
    /// Recycle-bin location written to the root.
    pub recycle_path: Option<String>,
    /// Also move the stored path of deleted rows beneath the root, leaving
    /// their delete-state and bin location alone.
    pub carry_deleted: bool,
}

impl SubtreeCascade {
    /// Rename a live folder from `old_path` to `new_path`.
    pub fn rename(folder: &Folder, new_name: &str, new_path: &str) -> Self {
        Self {
            user_id: folder.user_id,
            root_id: folder.id,
            old_path: folder.path.clone(),
            new_path: new_path.to_string(),
            new_name: Some(new_name.to_string()),
            match_deleted: false,
            set_deleted: false,
            recycle_path: None,
            carry_deleted: true,
        }
    }

    /// Soft-delete a live folder whose directory now sits at `recycle_path`.
    pub fn soft_delete(folder: &Folder, recycle_path: &str) -> Self {
        Self {
            user_id: folder.user_id,
            root_id: folder.id,
            old_path: folder.path.clone(),
            new_path: folder.path.clone(),
            new_name: None,
            match_deleted: false,
            set_deleted: true,
            recycle_path: Some(recycle_path.to_string()),
            carry_deleted: false,
        }
    }

    /// Recover a deleted folder to `new_path` under `new_name`.
    pub fn recover(folder: &Folder, new_name: &str, new_path: &str) -> Self {
        Self {
            user_id: folder.user_id,
            root_id: folder.id,
            old_path: folder.path.clone(),
            new_path: new_path.to_string(),
            new_name: Some(new_name.to_string()),
            match_deleted: true,
            set_deleted: false,
            recycle_path: None,
            carry_deleted: false,
        }
    }

    /// `old_path + SEP`, the prefix every descendant path starts with.
    pub fn old_prefix(&self) -> String {
        with_separator(&self.old_path)
    }

    /// `new_path + SEP`.
    pub fn new_prefix(&self) -> String {
        with_separator(&self.new_path)
    }
}

/// Rows touched by a cascade.
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    /// The root folder as stored after the cascade.
    pub root: Folder,
    /// Descendant folders updated.
    pub folders_updated: u64,
    /// Descendant files updated.
    pub files_updated: u64,
}

/// Append the platform separator to a stored path.
pub fn with_separator(path: &str) -> String {
    let mut prefixed = path.trim_end_matches(MAIN_SEPARATOR).to_string();
    prefixed.push(MAIN_SEPARATOR);
    prefixed
}

/// Whether `path` lies strictly below `ancestor`, respecting component
/// boundaries (`/a/Foo2` is not below `/a/Foo`).
pub fn is_beneath(path: &str, ancestor: &str) -> bool {
    path.starts_with(&with_separator(ancestor))
}

/// Replace the `old_prefix` of `path` with `new_prefix`, if it has it.
pub fn rewrite_prefix(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    path.strip_prefix(old_prefix)
        .map(|rest| format!("{new_prefix}{rest}"))
}

/// Transactional store for catalog records.
///
/// Every lookup is scoped by owner: a record belonging to another user is
/// indistinguishable from a missing one.
#[async_trait]
pub trait Catalog: Send + Sync + std::fmt::Debug + 'static {
    /// Check that the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    // ── Users ──────────────────────────────────────────────────────

    /// Find a user by id.
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>>;

    /// Provision a user with zero usage.
    async fn create_user(&self, data: &CreateUser) -> AppResult<User>;

    /// All users, oldest first.
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Add `delta` to a user's usage in one update.
    async fn add_used_storage(&self, id: UserId, delta: SizeMb) -> AppResult<User>;

    /// Subtract `delta` from a user's usage, clamping at zero.
    async fn release_used_storage(&self, id: UserId, delta: SizeMb) -> AppResult<User>;

    // ── Folders ────────────────────────────────────────────────────

    /// Find a folder owned by `user_id` in the given delete-state.
    async fn find_folder(
        &self,
        user_id: UserId,
        id: FolderId,
        is_deleted: bool,
    ) -> AppResult<Option<Folder>>;

    /// Find a live folder under `parent` whose name matches ignoring case.
    async fn find_folder_by_name(
        &self,
        user_id: UserId,
        parent: Option<FolderId>,
        name: &str,
    ) -> AppResult<Option<Folder>>;

    /// Every folder of the user in the given delete-state.
    async fn list_folders(&self, user_id: UserId, is_deleted: bool) -> AppResult<Vec<Folder>>;

    /// Direct child folders of `parent` (the user root when `None`).
    async fn list_child_folders(
        &self,
        user_id: UserId,
        parent: Option<FolderId>,
        is_deleted: bool,
    ) -> AppResult<Vec<Folder>>;

    /// Folders whose name contains `keyword`, case-insensitively.
    async fn search_folders(
        &self,
        user_id: UserId,
        keyword: &str,
        is_deleted: bool,
    ) -> AppResult<Vec<Folder>>;

    /// Names of live folders under `parent`, optionally excluding one.
    async fn folder_sibling_names(
        &self,
        user_id: UserId,
        parent: Option<FolderId>,
        exclude: Option<FolderId>,
    ) -> AppResult<Vec<String>>;

    /// Insert a live folder row.
    async fn create_folder(&self, data: &CreateFolder) -> AppResult<Folder>;

    /// Apply a subtree cascade atomically.
    async fn apply_cascade(&self, cascade: &SubtreeCascade) -> AppResult<CascadeOutcome>;

    /// Remove a folder row. Rows that referenced it lose their parent.
    async fn delete_folder(&self, user_id: UserId, id: FolderId) -> AppResult<bool>;

    // ── Files ──────────────────────────────────────────────────────

    /// Find a file owned by `user_id` in the given delete-state.
    async fn find_file(
        &self,
        user_id: UserId,
        id: FileId,
        is_deleted: bool,
    ) -> AppResult<Option<FileItem>>;

    /// Every file of the user in the given delete-state.
    async fn list_files(&self, user_id: UserId, is_deleted: bool) -> AppResult<Vec<FileItem>>;

    /// Files directly inside `folder` (the user root when `None`).
    async fn list_child_files(
        &self,
        user_id: UserId,
        folder: Option<FolderId>,
        is_deleted: bool,
    ) -> AppResult<Vec<FileItem>>;

    /// Files whose name or type contains `keyword`, case-insensitively.
    async fn search_files(
        &self,
        user_id: UserId,
        keyword: &str,
        is_deleted: bool,
    ) -> AppResult<Vec<FileItem>>;

    /// `name.type` of live files inside `folder`, optionally excluding one.
    async fn file_sibling_names(
        &self,
        user_id: UserId,
        folder: Option<FolderId>,
        exclude: Option<FileId>,
    ) -> AppResult<Vec<String>>;

    /// Insert a live file row.
    async fn create_file(&self, data: &CreateFileItem) -> AppResult<FileItem>;

    /// Persist a file's name, path, delete-state and recycle location.
    async fn update_file(&self, file: &FileItem) -> AppResult<FileItem>;

    /// Remove a file row.
    async fn delete_file(&self, user_id: UserId, id: FileId) -> AppResult<bool>;
}
