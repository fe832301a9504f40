//! Upload payloads, outcomes and the single-file write step.

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use tracing::warn;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::types::{FolderId, SizeMb, UserId};
use stowage_entity::file::{CreateFileItem, FileItem, join_file_name};
use stowage_entity::folder::Folder;

use crate::engine::Engine;
use crate::naming;

/// One uploaded file body.
#[derive(Debug, Clone)]
pub struct UploadItem {
    /// Client-supplied file name (may carry a relative path for folder uploads).
    pub file_name: String,
    /// Relative path inside an uploaded folder, when sent separately.
    pub relative_path: Option<String>,
    /// File content.
    pub data: Bytes,
}

impl UploadItem {
    /// A plain file upload.
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            relative_path: None,
            data: data.into(),
        }
    }

    /// A folder-upload entry at `relative_path`.
    pub fn at_path(relative_path: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let relative_path = relative_path.into();
        Self {
            file_name: relative_path.clone(),
            relative_path: Some(relative_path),
            data: data.into(),
        }
    }

    /// The path used for folder placement.
    pub fn path(&self) -> &str {
        self.relative_path.as_deref().unwrap_or(&self.file_name)
    }

    /// Size rounded to four decimal megabytes.
    pub fn size_mb(&self) -> SizeMb {
        SizeMb::from_bytes(self.data.len() as u64)
    }
}

/// An item that could not be stored.
#[derive(Debug, Clone, Serialize)]
pub struct UploadFailure {
    /// The name or relative path as sent.
    pub name: String,
    /// Stable error code.
    pub error: String,
    /// Human-readable reason.
    pub message: String,
}

/// What a best-effort upload actually stored.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadOutcome {
    /// Folders created (top-level roots and intermediates).
    pub folders: Vec<Folder>,
    /// Files stored.
    pub files: Vec<FileItem>,
    /// Items that failed, with reasons.
    pub failures: Vec<UploadFailure>,
    /// Quota consumed by the stored files.
    pub added_mb: SizeMb,
}

impl UploadOutcome {
    pub(crate) fn stored(&mut self, file: FileItem) {
        self.added_mb += file.size_mb;
        self.files.push(file);
    }

    pub(crate) fn failed(&mut self, name: &str, err: &AppError) {
        warn!(item = %name, error = %err, "Upload item failed");
        self.failures.push(UploadFailure {
            name: name.to_string(),
            error: err.kind.to_string(),
            message: err.message.clone(),
        });
    }

    pub(crate) fn merge(&mut self, other: UploadOutcome) {
        self.folders.extend(other.folders);
        self.files.extend(other.files);
        self.failures.extend(other.failures);
        self.added_mb += other.added_mb;
    }
}

/// Rejection recorded for a zero-byte upload item.
pub(crate) fn empty_file() -> AppError {
    AppError::bad_request("Empty file")
}

/// Sum of the sizes of all non-empty items.
pub(crate) fn total_size(items: &[UploadItem]) -> SizeMb {
    items.iter().map(UploadItem::size_mb).sum()
}

/// Split a client relative path on `/` or `\`, rejecting empty, `.` and
/// `..` segments.
pub fn relative_segments(path: &str) -> AppResult<Vec<String>> {
    let segments: Vec<String> = path.split(['/', '\\']).map(|s| s.trim().to_string()).collect();
    if segments
        .iter()
        .any(|s| s.is_empty() || s == "." || s == "..")
    {
        return Err(AppError::bad_request(format!(
            "Invalid relative path: '{path}'"
        )));
    }
    Ok(segments)
}

/// Reject names that would not form a single path component.
pub(crate) fn validate_component(name: &str, what: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request(format!("{what} name cannot be empty")));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(AppError::bad_request(format!("Invalid {what} name: '{name}'")));
    }
    Ok(name.to_string())
}

/// Write one file into `dir` and record it.
///
/// The name is uniquified against `siblings` (updated on success) and the
/// disk. Bytes are written before the row; if the row cannot be inserted
/// the bytes are removed again.
pub(crate) async fn store_file(
    engine: &Engine,
    user_id: UserId,
    dir: &Path,
    folder_id: Option<FolderId>,
    file_name: &str,
    data: Bytes,
    siblings: &mut Vec<String>,
) -> AppResult<FileItem> {
    let (base, file_type) = naming::split_file_name(file_name);
    let base = validate_component(&base, "File")?;
    let ext = naming::dotted(&file_type);

    let name = engine.names.unique_name(dir, &base, &ext, siblings).await?;
    let path = dir.join(format!("{name}{ext}"));
    engine.paths.ensure_within(user_id, &path)?;
    let catalog_path = engine.paths.catalog_path(&path)?;

    let size_mb = SizeMb::from_bytes(data.len() as u64);
    engine.blobs.write(&path, data).await?;

    let created = engine
        .catalog
        .create_file(&CreateFileItem {
            user_id,
            name: name.clone(),
            file_type: file_type.clone(),
            size_mb,
            folder_id,
            path: catalog_path,
        })
        .await;

    match created {
        Ok(file) => {
            siblings.push(join_file_name(&name, &file_type));
            Ok(file)
        }
        Err(err) => {
            if let Err(cleanup) = engine.blobs.delete_file(&path).await {
                warn!(path = %path.display(), error = %cleanup, "Failed to remove orphaned upload");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::error::ErrorKind;

    #[test]
    fn test_relative_segments_accepts_both_separators() {
        assert_eq!(
            relative_segments("Photos\\2024/beach.jpg").unwrap(),
            vec!["Photos", "2024", "beach.jpg"]
        );
    }

    #[test]
    fn test_relative_segments_rejects_traversal() {
        for bad in ["../etc/passwd", "a//b", "a/./b", "/abs", "dir/"] {
            let err = relative_segments(bad).unwrap_err();
            assert_eq!(err.kind, ErrorKind::BadRequest, "{bad}");
        }
    }

    #[test]
    fn test_validate_component() {
        assert_eq!(validate_component("  Reports ", "Folder").unwrap(), "Reports");
        assert!(validate_component("   ", "Folder").is_err());
        assert!(validate_component("a/b", "Folder").is_err());
        assert!(validate_component("..", "Folder").is_err());
    }

    #[test]
    fn test_outcome_accumulates_size() {
        let items = vec![
            UploadItem::new("a.txt", vec![0u8; 1_048_576]),
            UploadItem::new("empty.txt", Vec::new()),
        ];
        assert_eq!(total_size(&items), SizeMb::from_whole_mb(1));
    }
}
