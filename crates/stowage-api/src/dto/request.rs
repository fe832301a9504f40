//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use stowage_core::error::AppError;
use stowage_core::types::{FolderId, UserId};

/// Run `validator` rules and map failures to `BadRequest`.
pub fn validated<T: Validate>(req: T) -> Result<T, AppError> {
    req.validate()
        .map_err(|e| AppError::bad_request(format!("Validation failed: {e}")))?;
    Ok(req)
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// The user logging in.
    pub user_id: UserId,
    /// Shared development password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Create folder request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(length(min = 1, max = 255, message = "Folder name must be 1-255 characters"))]
    pub name: String,
    /// Parent folder (the user root when absent).
    pub parent_folder_id: Option<FolderId>,
}

/// Rename request for files and folders.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameRequest {
    /// New name. For files, any extension is ignored.
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub new_name: String,
}

/// Query string for `GET /api/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    /// Case-insensitive substring.
    #[serde(default)]
    pub keyword: String,
    /// Restrict to a folder's subtree.
    pub parent_folder_id: Option<FolderId>,
    /// Search the recycle bin instead.
    #[serde(default)]
    pub deleted_only: bool,
}

/// Query string for listings scoped to a folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    /// Folder to list (the user root when absent).
    pub parent_folder_id: Option<FolderId>,
    /// List the recycle bin instead.
    #[serde(default)]
    pub deleted_only: bool,
}
