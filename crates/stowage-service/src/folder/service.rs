//! Folder lifecycle with subtree cascades.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use stowage_core::config::StorageConfig;
use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::traits::BlobStore;
use stowage_core::types::{FolderId, SizeMb, UserId};
use stowage_database::{Catalog, SubtreeCascade};
use stowage_entity::folder::{CreateFolder, Folder, FolderDetails, descendant_folder_ids};

use crate::context::AuthContext;
use crate::engine::Engine;
use crate::file::service::parent_dir;
use crate::file::{FileService, PurgeOutcome, RecoverOutcome};
use crate::upload;

/// Manages folders and keeps their subtrees consistent.
#[derive(Debug, Clone)]
pub struct FolderService {
    pub(crate) engine: Engine,
    pub(crate) files: FileService,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        blobs: Arc<dyn BlobStore>,
        config: &StorageConfig,
    ) -> Self {
        Self {
            engine: Engine::new(catalog.clone(), blobs.clone(), config),
            files: FileService::new(catalog, blobs, config),
        }
    }

    async fn load(&self, ctx: &AuthContext, folder_id: FolderId, deleted: bool) -> AppResult<Folder> {
        self.engine
            .catalog
            .find_folder(ctx.user_id, folder_id, deleted)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// Loads a live folder owned by the caller.
    pub async fn get_folder(&self, ctx: &AuthContext, folder_id: FolderId) -> AppResult<Folder> {
        self.load(ctx, folder_id, false).await
    }

    /// Folder metadata with counts of its live direct children.
    pub async fn details(&self, ctx: &AuthContext, folder_id: FolderId) -> AppResult<FolderDetails> {
        let folder = self.load(ctx, folder_id, false).await?;
        let subfolders = self
            .engine
            .catalog
            .list_child_folders(ctx.user_id, Some(folder.id), false)
            .await?;
        let files = self
            .engine
            .catalog
            .list_child_files(ctx.user_id, Some(folder.id), false)
            .await?;

        Ok(FolderDetails {
            folder,
            file_count: files.len() as u64,
            subfolder_count: subfolders.len() as u64,
        })
    }

    /// Creates a folder under `parent` (the user root when `None`).
    ///
    /// The name is uniquified among live siblings and on disk. The
    /// directory exists before the row is inserted.
    pub async fn create_folder(
        &self,
        ctx: &AuthContext,
        name: &str,
        parent: Option<FolderId>,
    ) -> AppResult<Folder> {
        let name = upload::validate_component(name, "Folder")?;
        let target = self.engine.paths.resolve_parent_path(ctx.user_id, parent).await?;
        let folder = self
            .create_unique(ctx.user_id, &target.path, target.folder_id(), &name)
            .await?;

        info!(user_id = %ctx.user_id, folder_id = %folder.id, name = %folder.name, "Folder created");
        Ok(folder)
    }

    /// Create a uniquified folder named after `base` inside `dir`.
    pub(crate) async fn create_unique(
        &self,
        user_id: UserId,
        dir: &Path,
        parent: Option<FolderId>,
        base: &str,
    ) -> AppResult<Folder> {
        let siblings = self
            .engine
            .catalog
            .folder_sibling_names(user_id, parent, None)
            .await?;
        let name = self.engine.names.unique_name(dir, base, "", &siblings).await?;
        self.materialize(user_id, dir, parent, &name).await
    }

    /// Reuse the live folder named exactly `name` under `parent`, or create it.
    pub(crate) async fn ensure_child(
        &self,
        user_id: UserId,
        dir: &Path,
        parent: Option<FolderId>,
        name: &str,
    ) -> AppResult<(Folder, bool)> {
        if let Some(existing) = self
            .engine
            .catalog
            .find_folder_by_name(user_id, parent, name)
            .await?
        {
            self.engine.blobs.create_dir(existing.physical_path()).await?;
            return Ok((existing, false));
        }
        let created = self.materialize(user_id, dir, parent, name).await?;
        Ok((created, true))
    }

    async fn materialize(
        &self,
        user_id: UserId,
        dir: &Path,
        parent: Option<FolderId>,
        name: &str,
    ) -> AppResult<Folder> {
        let path = dir.join(name);
        self.engine.paths.ensure_within(user_id, &path)?;
        let catalog_path = self.engine.paths.catalog_path(&path)?;

        self.engine.blobs.create_dir(&path).await?;

        let created = self
            .engine
            .catalog
            .create_folder(&CreateFolder {
                user_id,
                name: name.to_string(),
                parent_folder_id: parent,
                path: catalog_path,
            })
            .await;

        match created {
            Ok(folder) => Ok(folder),
            Err(err) => {
                if let Err(cleanup) = self.engine.blobs.delete_tree(&path).await {
                    warn!(path = %path.display(), error = %cleanup, "Failed to remove orphaned directory");
                }
                Err(err)
            }
        }
    }

    /// Renames a live folder and rewrites every descendant path.
    pub async fn rename_folder(
        &self,
        ctx: &AuthContext,
        folder_id: FolderId,
        new_name: &str,
    ) -> AppResult<Folder> {
        let base = upload::validate_component(new_name, "Folder")?;
        let folder = self.load(ctx, folder_id, false).await?;
        if base == folder.name {
            return Ok(folder);
        }

        let old_path = PathBuf::from(&folder.path);
        self.engine.paths.ensure_within(ctx.user_id, &old_path)?;
        let dir = parent_dir(&old_path)?;

        let siblings = self
            .engine
            .catalog
            .folder_sibling_names(ctx.user_id, folder.parent_folder_id, Some(folder.id))
            .await?;
        let name = self.engine.names.unique_name(dir, &base, "", &siblings).await?;
        let new_path = dir.join(&name);
        let catalog_path = self.engine.paths.catalog_path(&new_path)?;

        self.engine.blobs.move_tree(&old_path, &new_path).await?;

        let cascade = SubtreeCascade::rename(&folder, &name, &catalog_path);
        let outcome = match self.engine.catalog.apply_cascade(&cascade).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.undo_move(&new_path, &old_path).await;
                return Err(err);
            }
        };

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            name = %name,
            folders = outcome.folders_updated,
            files = outcome.files_updated,
            "Folder renamed"
        );
        Ok(outcome.root)
    }

    /// Soft-deletes a live folder and its live subtree.
    pub async fn delete_folder(&self, ctx: &AuthContext, folder_id: FolderId) -> AppResult<Folder> {
        let folder = self.load(ctx, folder_id, false).await?;
        self.engine.paths.ensure_within(ctx.user_id, folder.physical_path())?;

        let placed = self.engine.bin.place_folder(&folder).await?;
        let cascade = SubtreeCascade::soft_delete(&folder, &placed.to_string_lossy());
        let outcome = match self.engine.catalog.apply_cascade(&cascade).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.undo_move(&placed, folder.physical_path()).await;
                return Err(err);
            }
        };

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            folders = outcome.folders_updated,
            files = outcome.files_updated,
            "Folder moved to recycle bin"
        );
        Ok(outcome.root)
    }

    /// Restores a soft-deleted folder and the subtree deleted with it.
    ///
    /// Descendants that were deleted on their own stay in the bin.
    pub async fn recover_folder(
        &self,
        ctx: &AuthContext,
        folder_id: FolderId,
    ) -> AppResult<RecoverOutcome<Folder>> {
        let folder = self.load(ctx, folder_id, true).await?;
        let original = PathBuf::from(&folder.path);
        self.engine.paths.ensure_within(ctx.user_id, &original)?;

        let source = self
            .engine
            .bin
            .locate_folder(&folder)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found in recycle bin"))?;

        let dir = self
            .engine
            .restore_dir(ctx.user_id, folder.parent_folder_id, &original)
            .await?;
        let dir = dir.as_path();
        self.engine.blobs.create_dir(dir).await?;

        let siblings = self
            .engine
            .catalog
            .folder_sibling_names(ctx.user_id, folder.parent_folder_id, Some(folder.id))
            .await?;
        let name = self
            .engine
            .names
            .unique_name(dir, &folder.name, "", &siblings)
            .await?;
        let target = dir.join(&name);
        let catalog_path = self.engine.paths.catalog_path(&target)?;

        self.engine.blobs.move_tree(&source, &target).await?;

        let cascade = SubtreeCascade::recover(&folder, &name, &catalog_path);
        let outcome = match self.engine.catalog.apply_cascade(&cascade).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.undo_move(&target, &source).await;
                return Err(err);
            }
        };

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            name = %name,
            folders = outcome.folders_updated,
            files = outcome.files_updated,
            "Folder recovered"
        );
        Ok(RecoverOutcome {
            name,
            item: outcome.root,
        })
    }

    /// Removes a soft-deleted folder and everything deleted beneath it.
    ///
    /// Children go first, deepest folders before their parents. Quota is
    /// released once for the whole subtree.
    pub async fn permanent_delete_folder(
        &self,
        ctx: &AuthContext,
        folder_id: FolderId,
    ) -> AppResult<PurgeOutcome> {
        let folder = self.load(ctx, folder_id, true).await?;

        let deleted_folders = self.engine.catalog.list_folders(ctx.user_id, true).await?;
        let mut subtree = descendant_folder_ids(&deleted_folders, folder.id);
        let deleted_files = self.engine.catalog.list_files(ctx.user_id, true).await?;

        let mut freed = SizeMb::ZERO;
        let mut removed = 0u64;

        for file in deleted_files.iter().filter(|f| {
            f.folder_id
                .is_some_and(|id| id == folder.id || subtree.contains(&id))
        }) {
            self.discard_recorded(ctx.user_id, file.recycle_path.as_deref(), false)
                .await?;
            self.engine.catalog.delete_file(ctx.user_id, file.id).await?;
            freed += file.size_mb;
            removed += 1;
        }

        subtree.reverse();
        for id in subtree {
            if let Some(child) = deleted_folders.iter().find(|f| f.id == id) {
                self.discard_recorded(ctx.user_id, child.recycle_path.as_deref(), true)
                    .await?;
            }
            self.engine.catalog.delete_folder(ctx.user_id, id).await?;
            removed += 1;
        }

        match self.engine.bin.locate_folder(&folder).await? {
            Some(binned) => self.engine.blobs.delete_tree(&binned).await?,
            None => {
                let original = PathBuf::from(&folder.path);
                if self.engine.paths.ensure_within(ctx.user_id, &original).is_ok()
                    && !self.path_is_live(&folder).await?
                {
                    self.engine.blobs.delete_tree(&original).await?;
                }
            }
        }
        self.engine.catalog.delete_folder(ctx.user_id, folder.id).await?;
        removed += 1;

        self.engine.quota.release(ctx.user_id, freed).await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            removed,
            freed_mb = %freed,
            "Folder permanently deleted"
        );
        Ok(PurgeOutcome {
            freed_mb: freed,
            removed,
        })
    }

    /// Delete a descendant's own bin entry, if it has one inside the bin.
    ///
    /// Descendants deleted together with an ancestor have no entry of their
    /// own; their bytes go with the ancestor's directory.
    async fn discard_recorded(
        &self,
        user_id: UserId,
        recycle_path: Option<&str>,
        is_dir: bool,
    ) -> AppResult<()> {
        let Some(recorded) = recycle_path.map(PathBuf::from) else {
            return Ok(());
        };
        if !recorded.starts_with(self.engine.paths.recycle_bin(user_id))
            || self.engine.paths.ensure_within(user_id, &recorded).is_err()
        {
            return Ok(());
        }
        if is_dir {
            self.engine.blobs.delete_tree(&recorded).await
        } else {
            self.engine.blobs.delete_file(&recorded).await
        }
    }

    async fn path_is_live(&self, folder: &Folder) -> AppResult<bool> {
        Ok(self
            .engine
            .catalog
            .list_child_folders(folder.user_id, folder.parent_folder_id, false)
            .await?
            .iter()
            .any(|f| f.path == folder.path))
    }

    async fn undo_move(&self, from: &Path, to: &Path) {
        if let Err(err) = self.engine.blobs.move_tree(from, to).await {
            warn!(
                from = %from.display(),
                to = %to.display(),
                error = %err,
                "Failed to roll back folder move"
            );
        }
    }
}
