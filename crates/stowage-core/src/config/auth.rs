//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Credential check strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// One shared development password for every provisioned user.
    DevPass,
}

/// Authentication and session-token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Credential check strategy.
    #[serde(default = "default_mode")]
    pub mode: AuthMode,
    /// Shared password for `dev_pass` mode. Empty disables login.
    #[serde(default)]
    pub dev_password: String,
    /// Secret key for session token signing (HMAC-SHA256).
    #[serde(default = "default_token_secret")]
    pub token_secret: String,
    /// Session token TTL in minutes.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            dev_password: String::new(),
            token_secret: default_token_secret(),
            token_ttl_minutes: default_token_ttl(),
        }
    }
}

fn default_mode() -> AuthMode {
    AuthMode::DevPass
}

fn default_token_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_token_ttl() -> u64 {
    30
}
