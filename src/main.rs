//! Stowage server: personal cloud storage over a per-user folder hierarchy.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use stowage_core::config::AppConfig;
use stowage_core::error::AppError;
use stowage_core::traits::BlobStore;
use stowage_storage::LocalBlobStore;

#[tokio::main]
async fn main() {
    let env = std::env::var("STOWAGE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration (env: {env}): {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Stowage v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Catalog ──────────────────────────────────────────
    tracing::info!(backend = ?config.database.backend, "Opening catalog...");
    let catalog = stowage_database::open_catalog(&config.database).await?;

    // ── Step 2: Physical storage ─────────────────────────────────
    tracing::info!(root = %config.storage.root_path, "Initializing storage root...");
    let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(&config.storage.root_path).await?);

    // ── Step 3: HTTP server ──────────────────────────────────────
    stowage_api::run_server(config, catalog, blobs).await?;

    tracing::info!("Stowage server shut down gracefully");
    Ok(())
}
