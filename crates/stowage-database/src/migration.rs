//! Catalog schema migrations.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;

/// Migrations embedded from the workspace `migrations/` directory.
static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Run all pending database migrations.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    info!(
        known = MIGRATOR.iter().count(),
        "Running catalog migrations"
    );

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!("Catalog migrations completed");
    Ok(())
}
