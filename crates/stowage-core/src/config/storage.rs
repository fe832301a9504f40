//! Physical storage configuration.

use serde::{Deserialize, Serialize};

/// Local filesystem storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory; each user gets `{root_path}/{user_id}`.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Name of the per-user recycle-bin directory.
    #[serde(default = "default_recycle_bin")]
    pub recycle_bin_name: String,
    /// Maximum length of a stored physical folder path, in characters.
    #[serde(default = "default_max_path_length")]
    pub max_path_length: usize,
    /// Quota assigned to newly provisioned users.
    #[serde(default = "default_total_storage_mb")]
    pub default_total_storage_mb: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            recycle_bin_name: default_recycle_bin(),
            max_path_length: default_max_path_length(),
            default_total_storage_mb: default_total_storage_mb(),
        }
    }
}

fn default_root_path() -> String {
    "./data/storage".to_string()
}

fn default_recycle_bin() -> String {
    "RecycleBin".to_string()
}

fn default_max_path_length() -> usize {
    500
}

fn default_total_storage_mb() -> u32 {
    200
}
