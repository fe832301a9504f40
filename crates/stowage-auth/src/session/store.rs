//! Token-backed session store.
//!
//! Sessions are stateless signed tokens. Logout records the token's `jti`
//! in an in-process blocklist until the token would have expired anyway.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use stowage_core::config::AuthConfig;
use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::types::UserId;

use crate::jwt::{Claims, JwtDecoder, JwtEncoder};

/// A freshly issued session token.
#[derive(Debug, Clone, Serialize)]
pub struct SessionToken {
    /// Bearer token to send in `Authorization`.
    pub token: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Issues, resolves and revokes session tokens.
#[derive(Debug, Clone)]
pub struct SessionStore {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    /// Revoked token IDs mapped to their expiry timestamp.
    revoked: Arc<DashMap<Uuid, i64>>,
}

impl SessionStore {
    /// Creates a session store from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
            revoked: Arc::new(DashMap::new()),
        }
    }

    /// Issue a token for an authenticated user.
    pub fn issue(&self, user_id: UserId) -> AppResult<SessionToken> {
        let (token, claims) = self.encoder.encode(user_id)?;
        debug!(user_id = %user_id, jti = %claims.jti, "Issued session token");
        Ok(SessionToken {
            token,
            expires_at: claims.expires_at(),
        })
    }

    /// Validate a token, rejecting bad signatures, expiry and revocation.
    pub fn validate(&self, token: &str) -> AppResult<Claims> {
        let claims = self.decoder.decode(token)?;
        if self.revoked.contains_key(&claims.jti) {
            return Err(AppError::unauthorized("Token has been revoked"));
        }
        Ok(claims)
    }

    /// The user a token belongs to, if the token is still acceptable.
    pub fn current_user_id(&self, token: &str) -> Option<UserId> {
        self.validate(token).ok().map(|c| c.user_id())
    }

    /// Revoke a token until its natural expiry.
    pub fn revoke(&self, token: &str) -> AppResult<()> {
        let claims = self.validate(token)?;
        self.purge_expired();
        self.revoked.insert(claims.jti, claims.exp);
        info!(user_id = %claims.sub, jti = %claims.jti, "Session revoked");
        Ok(())
    }

    /// Number of tokens currently held in the blocklist.
    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }

    fn purge_expired(&self) {
        let now = Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            token_secret: secret.to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_issue_then_resolve() {
        let store = SessionStore::new(&config("secret-a"));
        let user = UserId::new();
        let token = store.issue(user).unwrap();
        assert_eq!(store.current_user_id(&token.token), Some(user));
        assert!(token.expires_at > Utc::now());
    }

    #[test]
    fn test_revoked_token_is_rejected() {
        let store = SessionStore::new(&config("secret-a"));
        let token = store.issue(UserId::new()).unwrap();
        store.revoke(&token.token).unwrap();
        assert_eq!(store.current_user_id(&token.token), None);
        assert_eq!(store.revoked_count(), 1);
        assert!(store.revoke(&token.token).is_err());
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let issuer = SessionStore::new(&config("secret-a"));
        let verifier = SessionStore::new(&config("secret-b"));
        let token = issuer.issue(UserId::new()).unwrap();
        assert_eq!(verifier.current_user_id(&token.token), None);
        assert_eq!(verifier.current_user_id("not-a-token"), None);
    }

    #[test]
    fn test_purge_drops_expired_entries() {
        let store = SessionStore::new(&config("secret-a"));
        store.revoked.insert(Uuid::new_v4(), Utc::now().timestamp() - 10);
        let token = store.issue(UserId::new()).unwrap();
        store.revoke(&token.token).unwrap();
        assert_eq!(store.revoked_count(), 1);
    }
}
