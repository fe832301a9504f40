//! Physical byte storage trait.
//!
//! A [`BlobStore`] exposes filesystem semantics (directories, files,
//! move/copy/delete) over absolute physical paths. Every path handed to a
//! store must lie inside its [`BlobStore::root`]; implementations reject
//! anything else with an `InvalidLocation` error. Whole-subtree operations
//! (`move_tree`, `copy_tree`, `delete_tree`, `zip_tree`) live here so the
//! hierarchy engine never walks the filesystem itself.

use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::result::AppResult;

/// A single directory entry returned by [`BlobStore::list`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BlobEntry {
    /// Final path component.
    pub name: String,
    /// Absolute physical path.
    pub path: PathBuf,
    /// Whether this entry is a directory.
    pub is_directory: bool,
    /// Size in bytes (0 for directories).
    pub size_bytes: u64,
    /// Last modification time, if the platform reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// A byte stream type used for reading file contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Filesystem-like byte storage rooted at a single directory.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// The directory every managed path lives under.
    fn root(&self) -> &Path;

    /// Check whether the root is present and usable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Create a directory and any missing parents.
    async fn create_dir(&self, path: &Path) -> AppResult<()>;

    /// Write a complete file, creating parent directories as needed.
    async fn write(&self, path: &Path, data: Bytes) -> AppResult<()>;

    /// Open a file as a byte stream. Missing files are `NotFound`.
    async fn read(&self, path: &Path) -> AppResult<ByteStream>;

    /// Read a whole file into memory. Missing files are `NotFound`.
    async fn read_bytes(&self, path: &Path) -> AppResult<Bytes>;

    /// Move a single file. A missing source is `NotFound`; an occupied
    /// destination is refused.
    async fn move_file(&self, from: &Path, to: &Path) -> AppResult<()>;

    /// Move a directory and everything below it as one unit.
    async fn move_tree(&self, from: &Path, to: &Path) -> AppResult<()>;

    /// Recursively copy a directory. Returns the number of bytes copied.
    async fn copy_tree(&self, from: &Path, to: &Path) -> AppResult<u64>;

    /// Delete a file. Deleting a missing file succeeds.
    async fn delete_file(&self, path: &Path) -> AppResult<()>;

    /// Delete a directory recursively. Deleting a missing directory succeeds.
    async fn delete_tree(&self, path: &Path) -> AppResult<()>;

    /// Whether anything exists at `path`.
    async fn exists(&self, path: &Path) -> AppResult<bool>;

    /// Whether a regular file exists at `path`.
    async fn is_file(&self, path: &Path) -> AppResult<bool>;

    /// Whether a directory exists at `path`.
    async fn is_dir(&self, path: &Path) -> AppResult<bool>;

    /// List the direct entries of a directory. A missing directory lists empty.
    async fn list(&self, path: &Path) -> AppResult<Vec<BlobEntry>>;

    /// Build a zip archive of a directory's contents.
    async fn zip_tree(&self, path: &Path) -> AppResult<Bytes>;
}
