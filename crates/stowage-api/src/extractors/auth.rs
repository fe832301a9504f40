//! `AuthUser` extractor: resolves the bearer token to the acting user.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use stowage_core::error::AppError;
use stowage_service::AuthContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Context passed to every engine call.
    pub ctx: AuthContext,
    /// The raw bearer token (needed to revoke on logout).
    pub token: String,
}

impl AuthUser {
    /// Returns the inner `AuthContext`.
    pub fn context(&self) -> &AuthContext {
        &self.ctx
    }
}

impl std::ops::Deref for AuthUser {
    type Target = AuthContext;
    fn deref(&self) -> &Self::Target {
        &self.ctx
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized("Missing or malformed Authorization header"))?;

        let token = bearer.token().to_string();
        let user_id = state
            .sessions
            .current_user_id(&token)
            .ok_or_else(|| AppError::unauthorized("Invalid or expired session"))?;

        if state.catalog.find_user(user_id).await?.is_none() {
            return Err(AppError::unauthorized("Unknown user").into());
        }

        Ok(AuthUser {
            ctx: AuthContext::new(user_id),
            token,
        })
    }
}
