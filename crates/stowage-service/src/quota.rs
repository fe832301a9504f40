//! Per-user storage quota accounting.

use std::sync::Arc;

use tracing::info;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::types::{SizeMb, UserId};
use stowage_database::Catalog;
use stowage_entity::user::User;

/// Validates uploads against the quota and records usage changes.
///
/// Soft-delete and recover never pass through here: binned bytes still
/// count against the owner until permanently deleted.
#[derive(Debug, Clone)]
pub struct QuotaAccountant {
    catalog: Arc<dyn Catalog>,
}

impl QuotaAccountant {
    /// Create an accountant over the catalog.
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Fail with `BadRequest` when `incoming` would exceed the user's quota.
    pub async fn check(&self, user_id: UserId, incoming: SizeMb) -> AppResult<User> {
        let user = self
            .catalog
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if user.would_exceed(incoming) {
            return Err(AppError::bad_request(format!(
                "Uploading {incoming} MB exceeds your {} MB storage limit ({} MB used)",
                user.total_storage_mb, user.used_storage_mb
            )));
        }
        Ok(user)
    }

    /// Record newly stored bytes.
    pub async fn commit(&self, user_id: UserId, delta: SizeMb) -> AppResult<()> {
        if delta.is_zero() {
            return Ok(());
        }
        let user = self.catalog.add_used_storage(user_id, delta).await?;
        info!(user_id = %user_id, added_mb = %delta, used_mb = %user.used_storage_mb, "Quota committed");
        Ok(())
    }

    /// Release permanently deleted bytes, clamping usage at zero.
    pub async fn release(&self, user_id: UserId, delta: SizeMb) -> AppResult<()> {
        if delta.is_zero() {
            return Ok(());
        }
        let user = self.catalog.release_used_storage(user_id, delta).await?;
        info!(user_id = %user_id, freed_mb = %delta, used_mb = %user.used_storage_mb, "Quota released");
        Ok(())
    }
}
