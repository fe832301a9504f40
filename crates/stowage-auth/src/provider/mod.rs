//! Credential verification.

pub mod dev;

use std::sync::Arc;

use async_trait::async_trait;

use stowage_core::config::{AuthConfig, AuthMode};
use stowage_core::result::AppResult;
use stowage_core::types::UserId;
use stowage_database::Catalog;

pub use dev::DevPasswordProvider;

/// Decides whether a credential proves the caller is `user_id`.
#[async_trait]
pub trait AuthProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Return `true` when `credential` is valid for `user_id`.
    async fn authenticate(&self, user_id: UserId, credential: &str) -> AppResult<bool>;
}

/// Build the provider selected by `auth.mode`.
pub fn build_provider(config: &AuthConfig, catalog: Arc<dyn Catalog>) -> Arc<dyn AuthProvider> {
    match config.mode {
        AuthMode::DevPass => Arc::new(DevPasswordProvider::new(&config.dev_password, catalog)),
    }
}
