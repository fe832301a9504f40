//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stowage_core::types::SizeMb;
use stowage_service::UserProfile;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Login response.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Bearer token.
    pub token: String,
    /// Token expiration.
    pub expires_at: DateTime<Utc>,
    /// The logged-in user.
    pub user: UserProfile,
}

/// Generic message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message text.
    pub message: String,
}

impl MessageResponse {
    /// Wraps a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of a recover call.
#[derive(Debug, Clone, Serialize)]
pub struct RecoverResponse<T: Serialize> {
    /// Confirmation text.
    pub message: String,
    /// Final name after any renumbering.
    pub name: String,
    /// The restored record.
    pub item: T,
}

/// Result of a permanent delete.
#[derive(Debug, Clone, Serialize)]
pub struct PurgeResponse {
    /// Confirmation text.
    pub message: String,
    /// Quota released.
    pub freed_mb: SizeMb,
    /// Catalog rows removed.
    pub removed: u64,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Seconds since startup.
    pub uptime_seconds: u64,
    /// Catalog reachable.
    pub catalog: String,
    /// Storage root reachable.
    pub storage: String,
}
