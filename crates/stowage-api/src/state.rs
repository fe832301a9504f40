//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use stowage_auth::{AuthProvider, SessionStore, build_provider};
use stowage_core::config::AppConfig;
use stowage_core::traits::BlobStore;
use stowage_database::Catalog;
use stowage_service::{DownloadService, FileService, FolderService, SearchService, UserService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// When the process started serving
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    /// Metadata catalog (PostgreSQL or in-memory)
    pub catalog: Arc<dyn Catalog>,
    /// Physical byte storage
    pub blobs: Arc<dyn BlobStore>,

    // ── Auth ─────────────────────────────────────────────────
    /// Session token issue and revocation
    pub sessions: Arc<SessionStore>,
    /// Credential checks
    pub auth_provider: Arc<dyn AuthProvider>,

    // ── Services ─────────────────────────────────────────────
    /// User profiles
    pub user_service: Arc<UserService>,
    /// File lifecycle
    pub file_service: Arc<FileService>,
    /// Folder lifecycle and tree uploads
    pub folder_service: Arc<FolderService>,
    /// File streaming and folder archives
    pub download_service: Arc<DownloadService>,
    /// Search and listings
    pub search_service: Arc<SearchService>,
}

impl AppState {
    /// Wires every service over one catalog and one blob store.
    pub fn new(config: AppConfig, catalog: Arc<dyn Catalog>, blobs: Arc<dyn BlobStore>) -> Self {
        let storage = &config.storage;

        let sessions = Arc::new(SessionStore::new(&config.auth));
        let auth_provider = build_provider(&config.auth, Arc::clone(&catalog));

        let user_service = Arc::new(UserService::new(
            Arc::clone(&catalog),
            storage.default_total_storage_mb,
        ));
        let file_service = Arc::new(FileService::new(
            Arc::clone(&catalog),
            Arc::clone(&blobs),
            storage,
        ));
        let folder_service = Arc::new(FolderService::new(
            Arc::clone(&catalog),
            Arc::clone(&blobs),
            storage,
        ));
        let download_service = Arc::new(DownloadService::new(
            Arc::clone(&catalog),
            Arc::clone(&blobs),
            storage,
        ));
        let search_service = Arc::new(SearchService::new(
            Arc::clone(&catalog),
            Arc::clone(&blobs),
            storage,
        ));

        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
            catalog,
            blobs,
            sessions,
            auth_provider,
            user_service,
            file_service,
            folder_service,
            download_service,
            search_service,
        }
    }
}
