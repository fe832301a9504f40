//! Keyword search and structural listings.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use stowage_core::config::StorageConfig;
use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::traits::BlobStore;
use stowage_core::types::FolderId;
use stowage_database::Catalog;
use stowage_entity::file::FileItem;
use stowage_entity::folder::{Folder, descendant_folder_ids};

use crate::context::AuthContext;
use crate::engine::Engine;

/// Folders and files matched by a query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    /// Matching folders.
    pub folders: Vec<Folder>,
    /// Matching files.
    pub files: Vec<FileItem>,
}

impl SearchResults {
    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}

/// Parameters of a keyword search.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Substring matched case-insensitively.
    pub keyword: String,
    /// Restrict to this folder's subtree (ignored for deleted items).
    pub parent: Option<FolderId>,
    /// Search the recycle bin instead of the live hierarchy.
    pub deleted_only: bool,
}

/// Read-only queries over a user's hierarchy.
#[derive(Debug, Clone)]
pub struct SearchService {
    engine: Engine,
}

impl SearchService {
    /// Creates a new search service.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        blobs: Arc<dyn BlobStore>,
        config: &StorageConfig,
    ) -> Self {
        Self {
            engine: Engine::new(catalog, blobs, config),
        }
    }

    /// Keyword search over folder names and file names or types.
    ///
    /// With a parent, folders must lie below it and files inside it or
    /// below it. Live results whose bytes are missing on disk are dropped.
    pub async fn search(&self, ctx: &AuthContext, query: &SearchQuery) -> AppResult<SearchResults> {
        let keyword = query.keyword.trim();
        if keyword.is_empty() {
            return Ok(SearchResults::default());
        }

        let catalog = &self.engine.catalog;
        let mut folders = catalog
            .search_folders(ctx.user_id, keyword, query.deleted_only)
            .await?;
        let mut files = catalog
            .search_files(ctx.user_id, keyword, query.deleted_only)
            .await?;

        if query.deleted_only {
            return Ok(SearchResults { folders, files });
        }

        if let Some(parent) = query.parent {
            self.require_live_folder(ctx, parent).await?;
            let all = catalog.list_folders(ctx.user_id, false).await?;
            let subtree: HashSet<FolderId> = descendant_folder_ids(&all, parent).into_iter().collect();

            folders.retain(|f| subtree.contains(&f.id));
            files.retain(|f| {
                f.folder_id
                    .is_some_and(|id| id == parent || subtree.contains(&id))
            });
        }

        debug!(user_id = %ctx.user_id, keyword, folders = folders.len(), files = files.len(), "Search matched");
        self.present(folders, files).await
    }

    /// Direct live children of `parent` (the user root when `None`).
    pub async fn list_children(
        &self,
        ctx: &AuthContext,
        parent: Option<FolderId>,
    ) -> AppResult<SearchResults> {
        if let Some(parent) = parent {
            self.require_live_folder(ctx, parent).await?;
        }
        let folders = self
            .engine
            .catalog
            .list_child_folders(ctx.user_id, parent, false)
            .await?;
        let files = self
            .engine
            .catalog
            .list_child_files(ctx.user_id, parent, false)
            .await?;
        self.present(folders, files).await
    }

    /// Everything in the recycle bin.
    pub async fn deleted_items(&self, ctx: &AuthContext) -> AppResult<SearchResults> {
        Ok(SearchResults {
            folders: self.engine.catalog.list_folders(ctx.user_id, true).await?,
            files: self.engine.catalog.list_files(ctx.user_id, true).await?,
        })
    }

    /// The whole live hierarchy.
    pub async fn all_items(&self, ctx: &AuthContext) -> AppResult<SearchResults> {
        let folders = self.engine.catalog.list_folders(ctx.user_id, false).await?;
        let files = self.engine.catalog.list_files(ctx.user_id, false).await?;
        self.present(folders, files).await
    }

    /// The bin when `deleted_only`, else the children of `parent`.
    pub async fn contextual(
        &self,
        ctx: &AuthContext,
        parent: Option<FolderId>,
        deleted_only: bool,
    ) -> AppResult<SearchResults> {
        if deleted_only {
            self.deleted_items(ctx).await
        } else {
            self.list_children(ctx, parent).await
        }
    }

    async fn require_live_folder(&self, ctx: &AuthContext, folder_id: FolderId) -> AppResult<Folder> {
        self.engine
            .catalog
            .find_folder(ctx.user_id, folder_id, false)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// Drop live rows whose bytes are gone. Storage errors are returned.
    async fn present(&self, folders: Vec<Folder>, files: Vec<FileItem>) -> AppResult<SearchResults> {
        let mut results = SearchResults::default();

        for folder in folders {
            if self.engine.blobs.is_dir(folder.physical_path()).await? {
                results.folders.push(folder);
            } else {
                warn!(folder_id = %folder.id, path = %folder.path, "Folder missing on disk, hidden");
            }
        }
        for file in files {
            if self.engine.blobs.is_file(file.physical_path()).await? {
                results.files.push(file);
            } else {
                warn!(file_id = %file.id, path = %file.path, "File missing on disk, hidden");
            }
        }
        Ok(results)
    }
}
