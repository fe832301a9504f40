//! Route definitions for the Stowage HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::middleware::cors::build_cors_layer;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_upload = usize::try_from(state.config.server.max_upload_size_bytes).unwrap_or(usize::MAX);

    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(folder_routes())
        .merge(file_routes())
        .merge(search_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Auth endpoints: login, logout, me
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
}

/// Folder lifecycle, tree upload and archive download
fn folder_routes() -> Router<AppState> {
    Router::new()
        .route("/folders", post(handlers::folder::create_folder))
        .route("/folders/upload", post(handlers::folder::upload_folder))
        .route(
            "/folders/{id}",
            get(handlers::folder::get_folder).delete(handlers::folder::delete_folder),
        )
        .route("/folders/{id}/rename", put(handlers::folder::rename_folder))
        .route("/folders/{id}/recover", put(handlers::folder::recover_folder))
        .route(
            "/folders/{id}/permanent",
            delete(handlers::folder::permanent_delete_folder),
        )
        .route("/folders/{id}/download", get(handlers::folder::download_folder))
}

/// File lifecycle, upload and download
fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files/upload", post(handlers::file::upload_files))
        .route(
            "/files/{id}",
            get(handlers::file::get_file).delete(handlers::file::delete_file),
        )
        .route("/files/{id}/rename", put(handlers::file::rename_file))
        .route("/files/{id}/recover", put(handlers::file::recover_file))
        .route(
            "/files/{id}/permanent",
            delete(handlers::file::permanent_delete_file),
        )
        .route("/files/{id}/download", get(handlers::file::download_file))
}

/// Keyword search and listings
fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(handlers::search::search))
        .route("/search/list", get(handlers::search::list_children))
        .route("/search/deleted", get(handlers::search::deleted_items))
        .route("/search/all", get(handlers::search::all_items))
        .route("/search/contextual", get(handlers::search::contextual))
}

/// Liveness
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
