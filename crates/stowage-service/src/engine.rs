//! Collaborators shared by the hierarchy services.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use stowage_core::config::StorageConfig;
use stowage_core::result::AppResult;
use stowage_core::traits::BlobStore;
use stowage_core::types::{FolderId, UserId};
use stowage_database::Catalog;

use crate::file::service::parent_dir;
use crate::naming::NameUniquifier;
use crate::paths::PathResolver;
use crate::quota::QuotaAccountant;
use crate::recycle::RecycleBin;

/// Everything an engine operation needs, built once per service.
#[derive(Debug, Clone)]
pub(crate) struct Engine {
    pub(crate) catalog: Arc<dyn Catalog>,
    pub(crate) blobs: Arc<dyn BlobStore>,
    pub(crate) paths: PathResolver,
    pub(crate) names: NameUniquifier,
    pub(crate) quota: QuotaAccountant,
    pub(crate) bin: RecycleBin,
}

impl Engine {
    pub(crate) fn new(
        catalog: Arc<dyn Catalog>,
        blobs: Arc<dyn BlobStore>,
        config: &StorageConfig,
    ) -> Self {
        let paths = PathResolver::new(catalog.clone(), blobs.clone(), config);
        Self {
            names: NameUniquifier::new(blobs.clone()),
            quota: QuotaAccountant::new(catalog.clone()),
            bin: RecycleBin::new(blobs.clone(), paths.clone()),
            paths,
            catalog,
            blobs,
        }
    }

    /// Directory a recovered item goes back into.
    ///
    /// A live parent is followed to wherever it sits now; otherwise the
    /// item returns beside its last stored path.
    pub(crate) async fn restore_dir(
        &self,
        user_id: UserId,
        parent: Option<FolderId>,
        stored: &Path,
    ) -> AppResult<PathBuf> {
        if let Some(parent_id) = parent {
            if let Some(folder) = self.catalog.find_folder(user_id, parent_id, false).await? {
                let dir = folder.physical_path().to_path_buf();
                self.paths.ensure_within(user_id, &dir)?;
                return Ok(dir);
            }
        }
        Ok(parent_dir(stored)?.to_path_buf())
    }
}
