//! # stowage-database
//!
//! The [`Catalog`] abstraction over user, folder and file records, its
//! PostgreSQL implementation (connection pool, migrations, repositories)
//! and an in-memory implementation for tests and throwaway environments.

pub mod catalog;
pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;

pub use catalog::{CascadeOutcome, Catalog, SubtreeCascade};
pub use connection::DatabasePool;
pub use memory::MemoryCatalog;
pub use postgres::PgCatalog;

use std::sync::Arc;

use stowage_core::config::{CatalogBackend, DatabaseConfig};
use stowage_core::result::AppResult;

/// Open the catalog selected by `database.backend`.
pub async fn open_catalog(config: &DatabaseConfig) -> AppResult<Arc<dyn Catalog>> {
    match config.backend {
        CatalogBackend::Postgres => {
            let db = DatabasePool::connect(config).await?;
            Ok(Arc::new(PgCatalog::new(db)))
        }
        CatalogBackend::Memory => {
            tracing::warn!("Using the in-memory catalog; records are lost on exit");
            Ok(Arc::new(MemoryCatalog::new()))
        }
    }
}
