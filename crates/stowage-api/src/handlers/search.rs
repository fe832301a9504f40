//! Search and listing handlers.

use axum::Json;
use axum::extract::{Query, State};

use stowage_service::{SearchQuery, SearchResults};

use crate::dto::request::{ListParams, SearchParams};
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/search?keyword=&parent_folder_id=&deleted_only=
pub async fn search(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<ApiResponse<SearchResults>>> {
    let query = SearchQuery {
        keyword: params.keyword,
        parent: params.parent_folder_id,
        deleted_only: params.deleted_only,
    };
    let results = state.search_service.search(auth.context(), &query).await?;
    Ok(Json(ApiResponse::ok(results)))
}

/// GET /api/search/list?parent_folder_id=
pub async fn list_children(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ApiResponse<SearchResults>>> {
    let results = state
        .search_service
        .list_children(auth.context(), params.parent_folder_id)
        .await?;
    Ok(Json(ApiResponse::ok(results)))
}

/// GET /api/search/deleted
pub async fn deleted_items(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<SearchResults>>> {
    let results = state.search_service.deleted_items(auth.context()).await?;
    Ok(Json(ApiResponse::ok(results)))
}

/// GET /api/search/all
pub async fn all_items(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<SearchResults>>> {
    let results = state.search_service.all_items(auth.context()).await?;
    Ok(Json(ApiResponse::ok(results)))
}

/// GET /api/search/contextual?parent_folder_id=&deleted_only=
pub async fn contextual(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ApiResponse<SearchResults>>> {
    let results = state
        .search_service
        .contextual(auth.context(), params.parent_folder_id, params.deleted_only)
        .await?;
    Ok(Json(ApiResponse::ok(results)))
}
