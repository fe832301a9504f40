//! Physical locations for users, folders and the recycle bin.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use stowage_core::config::StorageConfig;
use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::traits::BlobStore;
use stowage_core::types::{FolderId, UserId};
use stowage_database::Catalog;
use stowage_entity::folder::Folder;

/// A resolved upload or create target.
#[derive(Debug, Clone)]
pub struct ResolvedParent {
    /// The parent folder record (None at the user root).
    pub folder: Option<Folder>,
    /// Physical directory of the parent.
    pub path: PathBuf,
}

impl ResolvedParent {
    /// The parent folder id, if any.
    pub fn folder_id(&self) -> Option<FolderId> {
        self.folder.as_ref().map(|f| f.id)
    }
}

/// Maps users and folders onto directories under the storage root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    catalog: Arc<dyn Catalog>,
    blobs: Arc<dyn BlobStore>,
    recycle_bin_name: String,
    max_path_length: usize,
}

impl PathResolver {
    /// Create a resolver.
    pub fn new(catalog: Arc<dyn Catalog>, blobs: Arc<dyn BlobStore>, config: &StorageConfig) -> Self {
        Self {
            catalog,
            blobs,
            recycle_bin_name: config.recycle_bin_name.clone(),
            max_path_length: config.max_path_length,
        }
    }

    /// `{root}/{user_id}`.
    pub fn user_root(&self, user_id: UserId) -> PathBuf {
        self.blobs.root().join(user_id.to_string())
    }

    /// The user root, created if missing.
    pub async fn ensure_user_root(&self, user_id: UserId) -> AppResult<PathBuf> {
        let root = self.user_root(user_id);
        self.blobs.create_dir(&root).await?;
        Ok(root)
    }

    /// `{user_root}/RecycleBin`.
    pub fn recycle_bin(&self, user_id: UserId) -> PathBuf {
        self.user_root(user_id).join(&self.recycle_bin_name)
    }

    /// The recycle bin, created if missing.
    pub async fn ensure_recycle_bin(&self, user_id: UserId) -> AppResult<PathBuf> {
        let bin = self.recycle_bin(user_id);
        self.blobs.create_dir(&bin).await?;
        Ok(bin)
    }

    /// Physical directory for `parent` (the user root when `None`).
    ///
    /// The parent must be owned and live. The result must stay inside the
    /// user root.
    pub async fn resolve_parent_path(
        &self,
        user_id: UserId,
        parent: Option<FolderId>,
    ) -> AppResult<ResolvedParent> {
        let root = self.ensure_user_root(user_id).await?;
        let Some(parent_id) = parent else {
            return Ok(ResolvedParent {
                folder: None,
                path: root,
            });
        };

        let folder = self
            .catalog
            .find_folder(user_id, parent_id, false)
            .await?
            .ok_or_else(|| AppError::not_found("Parent folder not found"))?;

        let path = PathBuf::from(&folder.path);
        self.ensure_within(user_id, &path)?;
        Ok(ResolvedParent {
            folder: Some(folder),
            path,
        })
    }

    /// Reject paths that escape the user root.
    pub fn ensure_within(&self, user_id: UserId, path: &Path) -> AppResult<()> {
        let root = self.user_root(user_id);
        let climbs = path.components().any(|c| matches!(c, Component::ParentDir));
        if climbs || !path.starts_with(&root) || path == root {
            return Err(AppError::invalid_location(format!(
                "Path is outside the user's storage: {}",
                path.display()
            )));
        }
        Ok(())
    }

    /// Render a path for the catalog, enforcing the length limit.
    pub fn catalog_path(&self, path: &Path) -> AppResult<String> {
        let rendered = path.to_string_lossy().into_owned();
        if rendered.chars().count() > self.max_path_length {
            return Err(AppError::bad_request(format!(
                "Path exceeds {} characters",
                self.max_path_length
            )));
        }
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use stowage_database::MemoryCatalog;
    use stowage_storage::LocalBlobStore;

    use super::*;
    use stowage_core::error::ErrorKind;

    async fn resolver(max: usize) -> (tempfile::TempDir, PathResolver) {
        let dir = tempfile::tempdir().unwrap();
        let blobs = Arc::new(LocalBlobStore::new(dir.path()).await.unwrap());
        let config = StorageConfig {
            max_path_length: max,
            ..StorageConfig::default()
        };
        let resolver = PathResolver::new(Arc::new(MemoryCatalog::new()), blobs, &config);
        (dir, resolver)
    }

    #[tokio::test]
    async fn test_null_parent_is_user_root() {
        let (_dir, resolver) = resolver(500).await;
        let user = UserId::new();
        let resolved = resolver.resolve_parent_path(user, None).await.unwrap();
        assert_eq!(resolved.path, resolver.user_root(user));
        assert!(resolved.path.is_dir());
    }

    #[tokio::test]
    async fn test_unknown_parent_is_not_found() {
        let (_dir, resolver) = resolver(500).await;
        let err = resolver
            .resolve_parent_path(UserId::new(), Some(FolderId::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_ensure_within_uses_component_boundary() {
        let (_dir, resolver) = resolver(500).await;
        let user = UserId::new();
        let root = resolver.user_root(user);
        assert!(resolver.ensure_within(user, &root.join("Docs")).is_ok());

        let sibling = PathBuf::from(format!("{}x", root.display())).join("Docs");
        let err = resolver.ensure_within(user, &sibling).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidLocation);
        assert!(resolver.ensure_within(user, &root.join("../other")).is_err());
    }

    #[tokio::test]
    async fn test_catalog_path_length_limit() {
        let (_dir, resolver) = resolver(10).await;
        let err = resolver
            .catalog_path(Path::new("/a/very/long/path"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadRequest);
        assert_eq!(resolver.catalog_path(Path::new("/a/b")).unwrap(), "/a/b");
    }
}
