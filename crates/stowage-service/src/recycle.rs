//! The per-user recycle bin directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use stowage_core::result::AppResult;
use stowage_core::traits::{BlobEntry, BlobStore};
use stowage_core::types::UserId;
use stowage_entity::file::FileItem;
use stowage_entity::folder::Folder;

use crate::naming::{self, NameUniquifier};
use crate::paths::PathResolver;

/// Places soft-deleted items into the bin and finds them again.
#[derive(Debug, Clone)]
pub struct RecycleBin {
    blobs: Arc<dyn BlobStore>,
    paths: PathResolver,
    names: NameUniquifier,
}

impl RecycleBin {
    /// Create a recycle bin manager.
    pub fn new(blobs: Arc<dyn BlobStore>, paths: PathResolver) -> Self {
        Self {
            names: NameUniquifier::new(blobs.clone()),
            blobs,
            paths,
        }
    }

    /// Move a live file into the bin, returning where it landed.
    pub async fn place_file(&self, file: &FileItem) -> AppResult<PathBuf> {
        let bin = self.paths.ensure_recycle_bin(file.user_id).await?;
        let name = self
            .names
            .bin_file_name(&bin, &file.name, &naming::dotted(&file.file_type))
            .await?;
        let target = bin.join(name);
        self.blobs.move_file(file.physical_path(), &target).await?;
        debug!(file_id = %file.id, target = %target.display(), "File placed in recycle bin");
        Ok(target)
    }

    /// Move a live folder's directory into the bin, returning where it landed.
    pub async fn place_folder(&self, folder: &Folder) -> AppResult<PathBuf> {
        let bin = self.paths.ensure_recycle_bin(folder.user_id).await?;
        let name = self.names.bin_folder_name(&bin, &folder.name).await?;
        let target = bin.join(name);
        self.blobs.move_tree(folder.physical_path(), &target).await?;
        debug!(folder_id = %folder.id, target = %target.display(), "Folder placed in recycle bin");
        Ok(target)
    }

    /// Find the binned copy of a deleted file.
    ///
    /// Prefers the recorded location, then the most recently modified
    /// `{name}*{.ext}` entry.
    pub async fn locate_file(&self, file: &FileItem) -> AppResult<Option<PathBuf>> {
        if let Some(recorded) = self.recorded(file.user_id, file.recycle_path.as_deref()) {
            if self.blobs.is_file(&recorded).await? {
                return Ok(Some(recorded));
            }
        }

        let ext = naming::dotted(&file.file_type);
        let entries = self.entries(file.user_id).await?;
        Ok(newest(
            entries
                .into_iter()
                .filter(|e| !e.is_directory && naming::is_bin_file_name(&e.name, &file.name, &ext)),
        ))
    }

    /// Find the binned directory of a deleted folder.
    ///
    /// Prefers the recorded location, then the most recently modified
    /// `name` or `name (N)` directory.
    pub async fn locate_folder(&self, folder: &Folder) -> AppResult<Option<PathBuf>> {
        if let Some(recorded) = self.recorded(folder.user_id, folder.recycle_path.as_deref()) {
            if self.blobs.is_dir(&recorded).await? {
                return Ok(Some(recorded));
            }
        }

        let entries = self.entries(folder.user_id).await?;
        Ok(newest(
            entries
                .into_iter()
                .filter(|e| e.is_directory && naming::is_bin_folder_name(&e.name, &folder.name)),
        ))
    }

    /// A recorded bin path, if it still points inside the user's bin.
    fn recorded(&self, user_id: UserId, recycle_path: Option<&str>) -> Option<PathBuf> {
        let path = Path::new(recycle_path?);
        let bin = self.paths.recycle_bin(user_id);
        (path.starts_with(&bin) && self.paths.ensure_within(user_id, path).is_ok())
            .then(|| path.to_path_buf())
    }

    async fn entries(&self, user_id: UserId) -> AppResult<Vec<BlobEntry>> {
        self.blobs.list(&self.paths.recycle_bin(user_id)).await
    }
}

fn newest(entries: impl Iterator<Item = BlobEntry>) -> Option<PathBuf> {
    entries.max_by_key(|e| e.last_modified).map(|e| e.path)
}
