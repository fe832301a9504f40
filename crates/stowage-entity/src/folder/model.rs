//! Folder entity model.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use stowage_core::types::{FolderId, UserId};

/// A folder in a user's hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Owner.
    pub user_id: UserId,
    /// Folder name, unique case-insensitively among live siblings.
    pub name: String,
    /// Parent folder (None at the user root).
    pub parent_folder_id: Option<FolderId>,
    /// Physical location at last placement. Soft-delete leaves it untouched.
    pub path: String,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// Whether the folder sits in the recycle bin.
    pub is_deleted: bool,
    /// Where soft-delete put the directory inside the recycle bin.
    pub recycle_path: Option<String>,
}

impl Folder {
    /// Check if this folder sits directly under the user root.
    pub fn is_root_level(&self) -> bool {
        self.parent_folder_id.is_none()
    }

    /// The stored path as a filesystem path.
    pub fn physical_path(&self) -> &Path {
        Path::new(&self.path)
    }
}

/// Data required to create a new folder row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// Owner.
    pub user_id: UserId,
    /// Final (already uniquified) name.
    pub name: String,
    /// Parent folder (None for root-level).
    pub parent_folder_id: Option<FolderId>,
    /// Physical path.
    pub path: String,
}

/// Folder metadata plus counts of its live direct children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderDetails {
    /// The folder record.
    #[serde(flatten)]
    pub folder: Folder,
    /// Non-deleted files directly inside.
    pub file_count: u64,
    /// Non-deleted folders directly inside.
    pub subfolder_count: u64,
}
