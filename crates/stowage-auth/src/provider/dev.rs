//! Shared development password.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use stowage_core::result::AppResult;
use stowage_core::types::UserId;
use stowage_database::Catalog;

use super::AuthProvider;

/// Accepts one configured password for any provisioned user.
///
/// An empty password disables login entirely.
#[derive(Debug, Clone)]
pub struct DevPasswordProvider {
    password: String,
    catalog: Arc<dyn Catalog>,
}

impl DevPasswordProvider {
    /// Create a provider checking against `password`.
    pub fn new(password: &str, catalog: Arc<dyn Catalog>) -> Self {
        if password.is_empty() {
            warn!("auth.dev_password is empty; every login will be rejected");
        }
        Self {
            password: password.to_string(),
            catalog,
        }
    }
}

/// Compare without short-circuiting on the first differing byte.
fn same_secret(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

#[async_trait]
impl AuthProvider for DevPasswordProvider {
    fn name(&self) -> &'static str {
        "dev_pass"
    }

    async fn authenticate(&self, user_id: UserId, credential: &str) -> AppResult<bool> {
        if self.password.is_empty() || !same_secret(&self.password, credential) {
            debug!(user_id = %user_id, "Credential rejected");
            return Ok(false);
        }
        Ok(self.catalog.find_user(user_id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use stowage_core::types::SizeMb;
    use stowage_database::MemoryCatalog;
    use stowage_entity::user::CreateUser;

    use super::*;

    async fn provisioned() -> (Arc<MemoryCatalog>, UserId) {
        let catalog = Arc::new(MemoryCatalog::new());
        let user = catalog
            .create_user(&CreateUser {
                full_name: "Grace".into(),
                department: Some("Ops".into()),
                total_storage_mb: SizeMb::from_whole_mb(200),
            })
            .await
            .unwrap();
        (catalog, user.id)
    }

    #[tokio::test]
    async fn test_accepts_password_for_known_user() {
        let (catalog, id) = provisioned().await;
        let provider = DevPasswordProvider::new("letmein", catalog);
        assert!(provider.authenticate(id, "letmein").await.unwrap());
        assert!(!provider.authenticate(id, "letmeout").await.unwrap());
        assert!(!provider.authenticate(UserId::new(), "letmein").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_password_rejects_everything() {
        let (catalog, id) = provisioned().await;
        let provider = DevPasswordProvider::new("", catalog);
        assert!(!provider.authenticate(id, "").await.unwrap());
    }
}
