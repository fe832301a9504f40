//! File lifecycle: upload, rename, soft-delete, recover, permanent delete.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use stowage_core::config::StorageConfig;
use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::traits::BlobStore;
use stowage_core::types::{FileId, FolderId, SizeMb};
use stowage_database::Catalog;
use stowage_entity::file::FileItem;

use crate::context::AuthContext;
use crate::engine::Engine;
use crate::naming;
use crate::upload::{self, UploadItem, UploadOutcome};

/// Result of recovering an item from the recycle bin.
#[derive(Debug, Clone, Serialize)]
pub struct RecoverOutcome<T> {
    /// The name the item came back under (possibly renumbered).
    pub name: String,
    /// The restored record.
    pub item: T,
}

/// Result of a permanent delete.
#[derive(Debug, Clone, Serialize)]
pub struct PurgeOutcome {
    /// Quota released.
    pub freed_mb: SizeMb,
    /// Rows removed.
    pub removed: u64,
}

/// Manages files in a user's hierarchy.
#[derive(Debug, Clone)]
pub struct FileService {
    pub(crate) engine: Engine,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        blobs: Arc<dyn BlobStore>,
        config: &StorageConfig,
    ) -> Self {
        Self {
            engine: Engine::new(catalog, blobs, config),
        }
    }

    /// Loads a live file owned by the caller.
    pub async fn get_file(&self, ctx: &AuthContext, file_id: FileId) -> AppResult<FileItem> {
        self.load(ctx, file_id, false).await
    }

    async fn load(&self, ctx: &AuthContext, file_id: FileId, deleted: bool) -> AppResult<FileItem> {
        self.engine
            .catalog
            .find_file(ctx.user_id, file_id, deleted)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))
    }

    /// Uploads files into `parent` (the user root when `None`).
    ///
    /// The whole batch is checked against the quota first. Each file is
    /// stored independently; empty files and failed writes are reported in
    /// the outcome and quota is committed once for what was actually stored.
    pub async fn upload_files(
        &self,
        ctx: &AuthContext,
        items: Vec<UploadItem>,
        parent: Option<FolderId>,
    ) -> AppResult<UploadOutcome> {
        if items.is_empty() {
            return Err(AppError::bad_request("No files uploaded"));
        }

        let target = self.engine.paths.resolve_parent_path(ctx.user_id, parent).await?;
        self.engine
            .quota
            .check(ctx.user_id, upload::total_size(&items))
            .await?;

        let mut siblings = self
            .engine
            .catalog
            .file_sibling_names(ctx.user_id, target.folder_id(), None)
            .await?;

        let mut outcome = UploadOutcome::default();
        for item in items {
            if item.data.is_empty() {
                outcome.failed(&item.file_name, &upload::empty_file());
                continue;
            }
            let stored = upload::store_file(
                &self.engine,
                ctx.user_id,
                &target.path,
                target.folder_id(),
                &item.file_name,
                item.data.clone(),
                &mut siblings,
            )
            .await;
            match stored {
                Ok(file) => outcome.stored(file),
                Err(err) => outcome.failed(&item.file_name, &err),
            }
        }

        self.engine.quota.commit(ctx.user_id, outcome.added_mb).await?;

        info!(
            user_id = %ctx.user_id,
            stored = outcome.files.len(),
            failed = outcome.failures.len(),
            added_mb = %outcome.added_mb,
            "Files uploaded"
        );
        Ok(outcome)
    }

    /// Renames a live file, keeping its type.
    pub async fn rename_file(
        &self,
        ctx: &AuthContext,
        file_id: FileId,
        new_name: &str,
    ) -> AppResult<FileItem> {
        let base = upload::validate_component(naming::strip_extension(new_name), "File")?;
        let file = self.load(ctx, file_id, false).await?;
        if base == file.name {
            return Ok(file);
        }

        let old_path = PathBuf::from(&file.path);
        self.engine.paths.ensure_within(ctx.user_id, &old_path)?;
        let dir = parent_dir(&old_path)?;

        let ext = naming::dotted(&file.file_type);
        let siblings = self
            .engine
            .catalog
            .file_sibling_names(ctx.user_id, file.folder_id, Some(file.id))
            .await?;
        let name = self.engine.names.unique_name(dir, &base, &ext, &siblings).await?;
        let new_path = dir.join(format!("{name}{ext}"));
        let catalog_path = self.engine.paths.catalog_path(&new_path)?;

        self.engine.blobs.move_file(&old_path, &new_path).await?;

        let mut renamed = file.clone();
        renamed.name = name;
        renamed.path = catalog_path;
        let updated = match self.engine.catalog.update_file(&renamed).await {
            Ok(updated) => updated,
            Err(err) => {
                self.undo_move(&new_path, &old_path).await;
                return Err(err);
            }
        };

        info!(user_id = %ctx.user_id, file_id = %file.id, name = %updated.name, "File renamed");
        Ok(updated)
    }

    /// Soft-deletes a live file into the recycle bin.
    pub async fn delete_file(&self, ctx: &AuthContext, file_id: FileId) -> AppResult<FileItem> {
        let file = self.load(ctx, file_id, false).await?;
        self.engine.paths.ensure_within(ctx.user_id, file.physical_path())?;

        let placed = self.engine.bin.place_file(&file).await?;

        let mut deleted = file.clone();
        deleted.is_deleted = true;
        deleted.recycle_path = Some(placed.to_string_lossy().into_owned());
        let updated = match self.engine.catalog.update_file(&deleted).await {
            Ok(updated) => updated,
            Err(err) => {
                self.undo_move(&placed, file.physical_path()).await;
                return Err(err);
            }
        };

        info!(user_id = %ctx.user_id, file_id = %file.id, "File moved to recycle bin");
        Ok(updated)
    }

    /// Restores a soft-deleted file to its original folder.
    pub async fn recover_file(
        &self,
        ctx: &AuthContext,
        file_id: FileId,
    ) -> AppResult<RecoverOutcome<FileItem>> {
        let file = self.load(ctx, file_id, true).await?;
        let original = PathBuf::from(&file.path);
        self.engine.paths.ensure_within(ctx.user_id, &original)?;

        let source = self
            .engine
            .bin
            .locate_file(&file)
            .await?
            .ok_or_else(|| AppError::not_found("File not found in recycle bin"))?;

        let dir = self
            .engine
            .restore_dir(ctx.user_id, file.folder_id, &original)
            .await?;
        let dir = dir.as_path();
        self.engine.blobs.create_dir(dir).await?;

        let ext = naming::dotted(&file.file_type);
        let siblings = self
            .engine
            .catalog
            .file_sibling_names(ctx.user_id, file.folder_id, Some(file.id))
            .await?;
        let name = self
            .engine
            .names
            .unique_name(dir, &file.name, &ext, &siblings)
            .await?;
        let target = dir.join(format!("{name}{ext}"));
        let catalog_path = self.engine.paths.catalog_path(&target)?;

        self.engine.blobs.move_file(&source, &target).await?;

        let mut restored = file.clone();
        restored.name = name.clone();
        restored.path = catalog_path;
        restored.is_deleted = false;
        restored.recycle_path = None;
        let item = match self.engine.catalog.update_file(&restored).await {
            Ok(item) => item,
            Err(err) => {
                self.undo_move(&target, &source).await;
                return Err(err);
            }
        };

        info!(user_id = %ctx.user_id, file_id = %file.id, name = %name, "File recovered");
        Ok(RecoverOutcome {
            name: item.file_name(),
            item,
        })
    }

    /// Removes a soft-deleted file for good and releases its quota.
    pub async fn permanent_delete_file(
        &self,
        ctx: &AuthContext,
        file_id: FileId,
    ) -> AppResult<PurgeOutcome> {
        let file = self.load(ctx, file_id, true).await?;
        self.purge_file(&file).await?;
        self.engine.quota.release(ctx.user_id, file.size_mb).await?;

        info!(user_id = %ctx.user_id, file_id = %file.id, freed_mb = %file.size_mb, "File permanently deleted");
        Ok(PurgeOutcome {
            freed_mb: file.size_mb,
            removed: 1,
        })
    }

    /// Delete a deleted file's bytes and row, without touching quota.
    ///
    /// The binned copy is removed; the original location is only cleared
    /// when no live file has since taken that path.
    async fn purge_file(&self, file: &FileItem) -> AppResult<()> {
        match self.engine.bin.locate_file(file).await? {
            Some(binned) => self.engine.blobs.delete_file(&binned).await?,
            None => {
                let original = PathBuf::from(&file.path);
                if self.engine.paths.ensure_within(file.user_id, &original).is_ok()
                    && !self.path_is_live(file).await?
                {
                    self.engine.blobs.delete_file(&original).await?;
                }
            }
        }
        self.engine.catalog.delete_file(file.user_id, file.id).await?;
        Ok(())
    }

    async fn path_is_live(&self, file: &FileItem) -> AppResult<bool> {
        Ok(self
            .engine
            .catalog
            .list_child_files(file.user_id, file.folder_id, false)
            .await?
            .iter()
            .any(|f| f.path == file.path))
    }

    async fn undo_move(&self, from: &Path, to: &Path) {
        if let Err(err) = self.engine.blobs.move_file(from, to).await {
            warn!(
                from = %from.display(),
                to = %to.display(),
                error = %err,
                "Failed to roll back file move"
            );
        }
    }
}

/// The directory containing a stored path.
pub(crate) fn parent_dir(path: &Path) -> AppResult<&Path> {
    path.parent()
        .ok_or_else(|| AppError::invalid_location(format!("No parent for {}", path.display())))
}
