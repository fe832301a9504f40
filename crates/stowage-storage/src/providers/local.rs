//! Local filesystem blob store.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::StreamExt;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::debug;
use walkdir::WalkDir;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_core::traits::blob::{BlobEntry, BlobStore, ByteStream};

use crate::archive;

/// Blob store backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Canonical root directory for all stored files.
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at `root_path`, creating the directory if needed.
    pub async fn new(root_path: impl AsRef<Path>) -> AppResult<Self> {
        let requested = root_path.as_ref();
        fs::create_dir_all(requested).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", requested.display()),
                e,
            )
        })?;
        let root = fs::canonicalize(requested).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to resolve storage root: {}", requested.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Reject paths that are relative, climb with `..`, or leave the root.
    fn contain(&self, path: &Path) -> AppResult<PathBuf> {
        let climbs = path.components().any(|c| matches!(c, Component::ParentDir));
        if climbs || !path.starts_with(&self.root) {
            return Err(AppError::invalid_location(format!(
                "Path is outside the storage root: {}",
                path.display()
            )));
        }
        Ok(path.to_path_buf())
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Shared precondition for moves: source of the right kind, free target.
    async fn prepare_move(&self, from: &Path, to: &Path, want_dir: bool) -> AppResult<()> {
        let source_ok = match fs::metadata(from).await {
            Ok(meta) => meta.is_dir() == want_dir,
            Err(_) => false,
        };
        if !source_ok {
            return Err(AppError::not_found(format!(
                "Source not found on disk: {}",
                from.display()
            )));
        }
        if fs::try_exists(to).await.unwrap_or(false) {
            return Err(AppError::storage(format!(
                "Destination already exists: {}",
                to.display()
            )));
        }
        self.ensure_parent(to).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> AppResult<()> {
        fs::rename(from, to).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to move {} -> {}", from.display(), to.display()),
                e,
            )
        })
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn create_dir(&self, path: &Path) -> AppResult<()> {
        let full_path = self.contain(path)?;
        fs::create_dir_all(&full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create directory: {}", full_path.display()),
                e,
            )
        })?;
        debug!(path = %full_path.display(), "Created directory");
        Ok(())
    }

    async fn write(&self, path: &Path, data: Bytes) -> AppResult<()> {
        let full_path = self.contain(path)?;
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write file: {}", full_path.display()),
                e,
            )
        })?;

        debug!(path = %full_path.display(), bytes = data.len(), "Wrote file");
        Ok(())
    }

    async fn read(&self, path: &Path) -> AppResult<ByteStream> {
        let full_path = self.contain(path)?;
        let file = fs::File::open(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("File not found: {}", full_path.display()))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open file: {}", full_path.display()),
                    e,
                )
            }
        })?;

        let stream = ReaderStream::new(file);
        Ok(Box::pin(stream.map(|r| r.map(Bytes::from))))
    }

    async fn read_bytes(&self, path: &Path) -> AppResult<Bytes> {
        let full_path = self.contain(path)?;
        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("File not found: {}", full_path.display()))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read file: {}", full_path.display()),
                    e,
                )
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn move_file(&self, from: &Path, to: &Path) -> AppResult<()> {
        let (from, to) = (self.contain(from)?, self.contain(to)?);
        self.prepare_move(&from, &to, false).await?;
        self.rename(&from, &to).await?;
        debug!(from = %from.display(), to = %to.display(), "Moved file");
        Ok(())
    }

    async fn move_tree(&self, from: &Path, to: &Path) -> AppResult<()> {
        let (from, to) = (self.contain(from)?, self.contain(to)?);
        if to.starts_with(&from) {
            return Err(AppError::bad_request(
                "Cannot move a directory into itself",
            ));
        }
        self.prepare_move(&from, &to, true).await?;
        self.rename(&from, &to).await?;
        debug!(from = %from.display(), to = %to.display(), "Moved directory");
        Ok(())
    }

    async fn copy_tree(&self, from: &Path, to: &Path) -> AppResult<u64> {
        let (from, to) = (self.contain(from)?, self.contain(to)?);
        if !fs::metadata(&from).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(AppError::not_found(format!(
                "Directory not found: {}",
                from.display()
            )));
        }
        if to.starts_with(&from) {
            return Err(AppError::bad_request(
                "Cannot copy a directory into itself",
            ));
        }

        let (src, dst) = (from.clone(), to.clone());
        let copied = tokio::task::spawn_blocking(move || copy_dir_recursive(&src, &dst))
            .await
            .map_err(|e| AppError::internal(format!("Copy task failed: {e}")))??;

        debug!(from = %from.display(), to = %to.display(), bytes = copied, "Copied directory");
        Ok(copied)
    }

    async fn delete_file(&self, path: &Path) -> AppResult<()> {
        let full_path = self.contain(path)?;
        if fs::try_exists(&full_path).await.unwrap_or(false) {
            fs::remove_file(&full_path).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to delete file: {}", full_path.display()),
                    e,
                )
            })?;
            debug!(path = %full_path.display(), "Deleted file");
        }
        Ok(())
    }

    async fn delete_tree(&self, path: &Path) -> AppResult<()> {
        let full_path = self.contain(path)?;
        if full_path == self.root {
            return Err(AppError::invalid_location("Refusing to delete the storage root"));
        }
        if fs::try_exists(&full_path).await.unwrap_or(false) {
            fs::remove_dir_all(&full_path).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to delete directory: {}", full_path.display()),
                    e,
                )
            })?;
            debug!(path = %full_path.display(), "Deleted directory");
        }
        Ok(())
    }

    async fn exists(&self, path: &Path) -> AppResult<bool> {
        let full_path = self.contain(path)?;
        Ok(fs::try_exists(&full_path).await.unwrap_or(false))
    }

    async fn is_file(&self, path: &Path) -> AppResult<bool> {
        let full_path = self.contain(path)?;
        Ok(stat(&full_path).await?.is_some_and(|m| m.is_file()))
    }

    async fn is_dir(&self, path: &Path) -> AppResult<bool> {
        let full_path = self.contain(path)?;
        Ok(stat(&full_path).await?.is_some_and(|m| m.is_dir()))
    }

    async fn list(&self, path: &Path) -> AppResult<Vec<BlobEntry>> {
        let full_path = self.contain(path)?;
        if !fs::try_exists(&full_path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to list directory: {}", full_path.display()),
                e,
            )
        })?;

        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let meta = entry.metadata().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to get entry metadata", e)
            })?;

            entries.push(BlobEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                path: entry.path(),
                is_directory: meta.is_dir(),
                size_bytes: if meta.is_dir() { 0 } else { meta.len() },
                last_modified: meta.modified().ok().map(chrono::DateTime::<chrono::Utc>::from),
            });
        }

        entries.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then(a.name.cmp(&b.name))
        });

        Ok(entries)
    }

    async fn zip_tree(&self, path: &Path) -> AppResult<Bytes> {
        let full_path = self.contain(path)?;
        if !fs::metadata(&full_path).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(AppError::not_found(format!(
                "Directory not found: {}",
                full_path.display()
            )));
        }

        let dir = full_path.clone();
        let bytes = tokio::task::spawn_blocking(move || archive::zip_directory(&dir))
            .await
            .map_err(|e| AppError::internal(format!("Zip task failed: {e}")))??;

        debug!(path = %full_path.display(), bytes = bytes.len(), "Zipped directory");
        Ok(Bytes::from(bytes))
    }
}

/// Recursively copy `from` into `to`. Blocking.
fn copy_dir_recursive(from: &Path, to: &Path) -> AppResult<u64> {
    let mut copied = 0u64;
    for entry in WalkDir::new(from) {
        let entry = entry
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to walk directory", e))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|_| AppError::internal("Walked entry escaped the copy root"))?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            copied += std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(copied)
}

/// Metadata for `path`, or `None` when nothing is there.
async fn stat(path: &Path) -> AppResult<Option<std::fs::Metadata>> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta)),
        Err(e)
            if matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
            ) =>
        {
            Ok(None)
        }
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to stat {}", path.display()),
            e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, LocalBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_write_read_delete() {
        let (_dir, store) = store().await;
        let path = store.root().join("u1/test/file.txt");

        let data = Bytes::from("hello world");
        store.write(&path, data.clone()).await.unwrap();
        assert!(store.is_file(&path).await.unwrap());

        let read_back = store.read_bytes(&path).await.unwrap();
        assert_eq!(read_back, data);

        store.delete_file(&path).await.unwrap();
        assert!(!store.exists(&path).await.unwrap());
        // Deleting again is a no-op.
        store.delete_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_paths_outside_root() {
        let (_dir, store) = store().await;
        let outside = std::env::temp_dir().join("stowage-escape.txt");
        let err = store.write(&outside, Bytes::from("x")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidLocation);

        let climbing = store.root().join("u1/../../etc/passwd");
        let err = store.exists(&climbing).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidLocation);
    }

    #[tokio::test]
    async fn test_missing_paths_are_absent_not_errors() {
        let (_dir, store) = store().await;
        let file = store.root().join("u1/plain.txt");
        store.write(&file, Bytes::from("x")).await.unwrap();

        assert!(!store.is_dir(&store.root().join("u1/nothing")).await.unwrap());
        assert!(!store.is_file(&file.join("under-a-file")).await.unwrap());
        assert!(!store.is_dir(&file).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_directories_first() {
        let (_dir, store) = store().await;
        let base = store.root().join("listdir");
        store.write(&base.join("b.txt"), Bytes::from("b")).await.unwrap();
        store.write(&base.join("a.txt"), Bytes::from("a")).await.unwrap();
        store.create_dir(&base.join("sub")).await.unwrap();

        let entries = store.list(&base).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["sub", "a.txt", "b.txt"]);
        assert!(entries[0].is_directory);
        assert!(entries[1].last_modified.is_some());

        assert!(store.list(&base.join("missing")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_file_refuses_missing_source_and_occupied_target() {
        let (_dir, store) = store().await;
        let a = store.root().join("a.txt");
        let b = store.root().join("nested/b.txt");

        let err = store.move_file(&a, &b).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        store.write(&a, Bytes::from("a")).await.unwrap();
        store.write(&b, Bytes::from("b")).await.unwrap();
        let err = store.move_file(&a, &b).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);

        store.delete_file(&b).await.unwrap();
        store.move_file(&a, &b).await.unwrap();
        assert!(!store.exists(&a).await.unwrap());
        assert_eq!(store.read_bytes(&b).await.unwrap(), Bytes::from("a"));
    }

    #[tokio::test]
    async fn test_move_tree_moves_whole_subtree() {
        let (_dir, store) = store().await;
        let from = store.root().join("u/Docs");
        let to = store.root().join("u/RecycleBin/Docs");
        store.write(&from.join("x/y.txt"), Bytes::from("y")).await.unwrap();

        store.move_tree(&from, &to).await.unwrap();
        assert!(!store.exists(&from).await.unwrap());
        assert!(store.is_file(&to.join("x/y.txt")).await.unwrap());

        let err = store.move_tree(&to, &to.join("inner")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_copy_tree_and_delete_tree() {
        let (_dir, store) = store().await;
        let from = store.root().join("src");
        let to = store.root().join("dst");
        store.write(&from.join("a.txt"), Bytes::from("aaa")).await.unwrap();
        store.write(&from.join("d/b.txt"), Bytes::from("bb")).await.unwrap();
        store.create_dir(&from.join("empty")).await.unwrap();

        let copied = store.copy_tree(&from, &to).await.unwrap();
        assert_eq!(copied, 5);
        assert!(store.is_file(&to.join("d/b.txt")).await.unwrap());
        assert!(store.is_dir(&to.join("empty")).await.unwrap());
        assert!(store.is_file(&from.join("a.txt")).await.unwrap());

        store.delete_tree(&to).await.unwrap();
        assert!(!store.exists(&to).await.unwrap());

        let root = store.root().to_path_buf();
        assert!(store.delete_tree(&root).await.is_err());
    }

    #[tokio::test]
    async fn test_zip_tree_requires_directory() {
        let (_dir, store) = store().await;
        let err = store.zip_tree(&store.root().join("nope")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let dir = store.root().join("z");
        store.write(&dir.join("f.txt"), Bytes::from("f")).await.unwrap();
        let bytes = store.zip_tree(&dir).await.unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_read_stream() {
        let (_dir, store) = store().await;
        let path = store.root().join("s.bin");
        store.write(&path, Bytes::from(vec![7u8; 10_000])).await.unwrap();

        let mut stream = store.read(&path).await.unwrap();
        let mut total = 0;
        while let Some(chunk) = stream.next().await {
            total += chunk.unwrap().len();
        }
        assert_eq!(total, 10_000);
    }
}
