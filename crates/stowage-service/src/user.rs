//! User provisioning and profile lookups.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::types::{SizeMb, UserId};
use stowage_database::Catalog;
use stowage_entity::user::{CreateUser, User};

use crate::context::AuthContext;

/// A user with derived quota figures.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    /// The user record.
    #[serde(flatten)]
    pub user: User,
    /// Quota still available.
    pub remaining_storage_mb: SizeMb,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            remaining_storage_mb: user.remaining_storage_mb(),
            user,
        }
    }
}

/// Provisions users and reads their profiles.
#[derive(Debug, Clone)]
pub struct UserService {
    catalog: Arc<dyn Catalog>,
    default_quota: SizeMb,
}

impl UserService {
    /// Creates a user service granting `default_quota_mb` to new users.
    pub fn new(catalog: Arc<dyn Catalog>, default_quota_mb: u32) -> Self {
        Self {
            catalog,
            default_quota: SizeMb::from_whole_mb(default_quota_mb),
        }
    }

    /// The caller's own profile.
    pub async fn me(&self, ctx: &AuthContext) -> AppResult<UserProfile> {
        self.get_user(ctx.user_id).await.map(UserProfile::from)
    }

    /// Looks up a user by id.
    pub async fn get_user(&self, user_id: UserId) -> AppResult<User> {
        self.catalog
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Every provisioned user, oldest first.
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.catalog.list_users().await
    }

    /// Provisions a user. A missing quota uses the configured default.
    pub async fn create_user(
        &self,
        full_name: &str,
        department: Option<&str>,
        total_storage_mb: Option<SizeMb>,
    ) -> AppResult<User> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(AppError::bad_request("Full name cannot be empty"));
        }

        let user = self
            .catalog
            .create_user(&CreateUser {
                full_name: full_name.to_string(),
                department: department
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
                total_storage_mb: total_storage_mb.unwrap_or(self.default_quota),
            })
            .await?;

        info!(user_id = %user.id, quota_mb = %user.total_storage_mb, "User provisioned");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use stowage_core::error::ErrorKind;
    use stowage_database::MemoryCatalog;

    use super::*;

    #[tokio::test]
    async fn test_create_user_applies_default_quota() {
        let service = UserService::new(Arc::new(MemoryCatalog::new()), 200);
        let user = service.create_user(" Ada ", Some("  "), None).await.unwrap();

        assert_eq!(user.full_name, "Ada");
        assert_eq!(user.department, None);
        assert_eq!(user.total_storage_mb, SizeMb::from_whole_mb(200));
        assert_eq!(user.used_storage_mb, SizeMb::ZERO);

        let profile = service.me(&AuthContext::new(user.id)).await.unwrap();
        assert_eq!(profile.remaining_storage_mb, SizeMb::from_whole_mb(200));
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let service = UserService::new(Arc::new(MemoryCatalog::new()), 200);
        let err = service.create_user("   ", None, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let service = UserService::new(Arc::new(MemoryCatalog::new()), 200);
        let err = service.get_user(UserId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
