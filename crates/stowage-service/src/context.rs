//! Request context carrying the authenticated user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stowage_core::types::UserId;

/// Context for the current authenticated request.
///
/// Built by the HTTP layer once the session token is resolved and passed
/// into every engine call, so each operation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// The authenticated user's ID.
    pub user_id: UserId,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl AuthContext {
    /// Creates a new context for `user_id`.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            request_time: Utc::now(),
        }
    }
}
