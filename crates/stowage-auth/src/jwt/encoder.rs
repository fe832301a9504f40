//! Session token signing.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use stowage_core::config::AuthConfig;
use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::types::UserId;

use super::claims::Claims;

/// Upper bound on token lifetime (one year).
const MAX_TTL_MINUTES: u64 = 60 * 24 * 365;

/// Creates HS256-signed session tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder").field("ttl", &self.ttl).finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.token_secret.as_bytes()),
            ttl: Duration::minutes(config.token_ttl_minutes.min(MAX_TTL_MINUTES) as i64),
        }
    }

    /// Signs a fresh token for `user_id`, returning it with its claims.
    pub fn encode(&self, user_id: UserId) -> AppResult<(String, Claims)> {
        let now = Utc::now();
        let exp: DateTime<Utc> = now + self.ttl;

        let claims = Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode session token: {e}")))?;

        Ok((token, claims))
    }
}
