//! Database migration command.

use anyhow::{Context, bail};

use stowage_core::config::{AppConfig, CatalogBackend};
use stowage_database::DatabasePool;

use crate::output;

/// Run all pending migrations against the configured PostgreSQL catalog.
pub async fn execute(config: &AppConfig) -> anyhow::Result<()> {
    if config.database.backend != CatalogBackend::Postgres {
        bail!("Migrations only apply to database.backend = \"postgres\"");
    }

    println!("Running database migrations...");
    let mut database = config.database.clone();
    database.run_migrations = false;
    let pool = DatabasePool::connect(&database)
        .await
        .context("Failed to connect to database")?;
    pool.migrate().await.context("Migration failed")?;
    pool.close().await;

    output::print_success("All migrations applied successfully.");
    Ok(())
}
