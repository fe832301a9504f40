//! Download service: streams single files and zips folders.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use stowage_core::config::StorageConfig;
use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::traits::{BlobStore, ByteStream};
use stowage_core::types::{FileId, FolderId};
use stowage_database::Catalog;

use crate::context::AuthContext;
use crate::engine::Engine;

/// A file body ready to stream.
pub struct FileDownload {
    /// Suggested name for `Content-Disposition`.
    pub file_name: String,
    /// The content.
    pub stream: ByteStream,
}

impl std::fmt::Debug for FileDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDownload")
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// A zipped folder.
#[derive(Debug, Clone)]
pub struct ArchiveDownload {
    /// `{folder name}.zip`.
    pub file_name: String,
    /// The archive bytes.
    pub data: Bytes,
}

/// Serves downloads of live files and folders.
#[derive(Debug, Clone)]
pub struct DownloadService {
    engine: Engine,
}

impl DownloadService {
    /// Creates a new download service.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        blobs: Arc<dyn BlobStore>,
        config: &StorageConfig,
    ) -> Self {
        Self {
            engine: Engine::new(catalog, blobs, config),
        }
    }

    /// Opens a live file for streaming.
    ///
    /// A row whose bytes are gone from disk is `NotFound`.
    pub async fn download_file(&self, ctx: &AuthContext, file_id: FileId) -> AppResult<FileDownload> {
        let file = self
            .engine
            .catalog
            .find_file(ctx.user_id, file_id, false)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        let path = file.physical_path();
        self.engine.paths.ensure_within(ctx.user_id, path)?;
        if !self.engine.blobs.is_file(path).await? {
            return Err(AppError::not_found("File content is missing"));
        }

        let stream = self.engine.blobs.read(path).await?;
        info!(user_id = %ctx.user_id, file_id = %file.id, "File download started");
        Ok(FileDownload {
            file_name: file.file_name(),
            stream,
        })
    }

    /// Zips a live folder's directory.
    pub async fn download_folder(
        &self,
        ctx: &AuthContext,
        folder_id: FolderId,
    ) -> AppResult<ArchiveDownload> {
        let folder = self
            .engine
            .catalog
            .find_folder(ctx.user_id, folder_id, false)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        let path = PathBuf::from(&folder.path);
        self.engine.paths.ensure_within(ctx.user_id, &path)?;
        if !self.engine.blobs.is_dir(&path).await? {
            return Err(AppError::not_found("Folder content is missing"));
        }

        let data = self.engine.blobs.zip_tree(&path).await?;
        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            bytes = data.len(),
            "Folder archived for download"
        );
        Ok(ArchiveDownload {
            file_name: format!("{}.zip", folder.name),
            data,
        })
    }
}
