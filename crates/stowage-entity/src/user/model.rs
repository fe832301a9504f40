//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use stowage_core::types::{SizeMb, UserId};

/// A storage account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Display name.
    pub full_name: String,
    /// Optional organisational unit.
    pub department: Option<String>,
    /// Quota ceiling.
    pub total_storage_mb: SizeMb,
    /// Bytes currently attributed to the user, soft-deleted items included.
    pub used_storage_mb: SizeMb,
    /// When the account was provisioned.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Quota still available.
    pub fn remaining_storage_mb(&self) -> SizeMb {
        self.total_storage_mb.saturating_sub(self.used_storage_mb)
    }

    /// Whether adding `incoming` would push usage past the quota.
    pub fn would_exceed(&self, incoming: SizeMb) -> bool {
        self.used_storage_mb + incoming > self.total_storage_mb
    }
}

/// Data required to provision a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Display name.
    pub full_name: String,
    /// Optional organisational unit.
    pub department: Option<String>,
    /// Quota ceiling.
    pub total_storage_mb: SizeMb,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(total: u32, used: u32) -> User {
        User {
            id: UserId::new(),
            full_name: "Test".into(),
            department: None,
            total_storage_mb: SizeMb::from_whole_mb(total),
            used_storage_mb: SizeMb::from_whole_mb(used),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_would_exceed_allows_exact_fill() {
        let u = user(200, 190);
        assert!(!u.would_exceed(SizeMb::from_whole_mb(10)));
        assert!(u.would_exceed(SizeMb::from_whole_mb(11)));
    }

    #[test]
    fn test_remaining_never_negative() {
        let u = user(100, 150);
        assert_eq!(u.remaining_storage_mb(), SizeMb::ZERO);
    }
}
