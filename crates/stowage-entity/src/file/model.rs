//! File entity model.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use stowage_core::types::{FileId, FolderId, SizeMb, UserId};

/// A file stored in Stowage.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileItem {
    /// Unique file identifier.
    pub id: FileId,
    /// Owner.
    pub user_id: UserId,
    /// Base name without extension.
    pub name: String,
    /// Extension, lowercase, without the dot.
    pub file_type: String,
    /// Size in megabytes, four decimal places.
    pub size_mb: SizeMb,
    /// Containing folder (None at the user root).
    pub folder_id: Option<FolderId>,
    /// Physical location including the extension.
    pub path: String,
    /// When the file was uploaded.
    pub uploaded_at: DateTime<Utc>,
    /// Whether the file sits in the recycle bin.
    pub is_deleted: bool,
    /// Where soft-delete put the file inside the recycle bin.
    pub recycle_path: Option<String>,
}

impl FileItem {
    /// `name.type`, the identity compared among siblings.
    pub fn file_name(&self) -> String {
        join_file_name(&self.name, &self.file_type)
    }

    /// The stored path as a filesystem path.
    pub fn physical_path(&self) -> &Path {
        Path::new(&self.path)
    }
}

/// Data required to create a new file row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFileItem {
    /// Owner.
    pub user_id: UserId,
    /// Base name without extension.
    pub name: String,
    /// Extension, lowercase, without the dot.
    pub file_type: String,
    /// Size in megabytes.
    pub size_mb: SizeMb,
    /// Containing folder.
    pub folder_id: Option<FolderId>,
    /// Physical path.
    pub path: String,
}

/// Join a base name and a dotless extension.
pub fn join_file_name(name: &str, file_type: &str) -> String {
    if file_type.is_empty() {
        name.to_string()
    } else {
        format!("{name}.{file_type}")
    }
}
