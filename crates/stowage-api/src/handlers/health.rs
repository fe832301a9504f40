//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let catalog_ok = state.catalog.health_check().await.unwrap_or(false);
    let storage_ok = state.blobs.health_check().await.unwrap_or(false);

    Json(ApiResponse::ok(HealthResponse {
        status: if catalog_ok && storage_ok { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        catalog: status_word(catalog_ok, "connected"),
        storage: status_word(storage_ok, "available"),
    }))
}

fn status_word(ok: bool, word: &str) -> String {
    let word = if ok { word } else { "unavailable" };
    word.to_string()
}
