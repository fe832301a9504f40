//! Auth handlers: login, logout, me.

use axum::Json;
use axum::extract::State;
use tracing::info;

use stowage_core::error::AppError;
use stowage_service::UserProfile;

use crate::dto::request::{LoginRequest, validated};
use crate::dto::response::{ApiResponse, LoginResponse, MessageResponse};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    let req = validated(req)?;

    let accepted = state
        .auth_provider
        .authenticate(req.user_id, &req.password)
        .await?;
    if !accepted {
        return Err(AppError::unauthorized("Invalid credentials").into());
    }

    let user = state.user_service.get_user(req.user_id).await?;
    let session = state.sessions.issue(user.id)?;

    info!(user_id = %user.id, provider = state.auth_provider.name(), "User logged in");

    Ok(Json(ApiResponse::ok(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: UserProfile::from(user),
    })))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state.sessions.revoke(&auth.token)?;
    info!(user_id = %auth.user_id, "User logged out");

    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Logged out successfully",
    ))))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let profile = state.user_service.me(auth.context()).await?;
    Ok(Json(ApiResponse::ok(profile)))
}
