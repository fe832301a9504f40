//! File upload, lifecycle and download handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;

use stowage_core::error::AppError;
use stowage_core::types::FileId;
use stowage_entity::file::FileItem;
use stowage_service::UploadOutcome;

use crate::dto::request::{RenameRequest, validated};
use crate::dto::response::{ApiResponse, MessageResponse, PurgeResponse, RecoverResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, UploadForm};
use crate::state::AppState;

/// POST /api/files/upload
pub async fn upload_files(
    State(state): State<AppState>,
    auth: AuthUser,
    form: UploadForm,
) -> ApiResult<Json<ApiResponse<UploadOutcome>>> {
    let outcome = state
        .file_service
        .upload_files(auth.context(), form.items, form.parent_folder_id)
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> ApiResult<Json<ApiResponse<FileItem>>> {
    let file = state.file_service.get_file(auth.context(), id).await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// PUT /api/files/{id}/rename
pub async fn rename_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<Json<ApiResponse<FileItem>>> {
    let req = validated(req)?;
    let file = state
        .file_service
        .rename_file(auth.context(), id, &req.new_name)
        .await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    let file = state.file_service.delete_file(auth.context(), id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(format!(
        "File '{}' moved to recycle bin",
        file.file_name()
    )))))
}

/// PUT /api/files/{id}/recover
pub async fn recover_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> ApiResult<Json<ApiResponse<RecoverResponse<FileItem>>>> {
    let outcome = state.file_service.recover_file(auth.context(), id).await?;
    Ok(Json(ApiResponse::ok(RecoverResponse {
        message: format!("File recovered as '{}'", outcome.name),
        name: outcome.name,
        item: outcome.item,
    })))
}

/// DELETE /api/files/{id}/permanent
pub async fn permanent_delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> ApiResult<Json<ApiResponse<PurgeResponse>>> {
    let outcome = state
        .file_service
        .permanent_delete_file(auth.context(), id)
        .await?;
    Ok(Json(ApiResponse::ok(PurgeResponse {
        message: format!("File permanently deleted, freed {} MB", outcome.freed_mb),
        freed_mb: outcome.freed_mb,
        removed: outcome.removed,
    })))
}

/// GET /api/files/{id}/download
pub async fn download_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> ApiResult<Response> {
    let download = state
        .download_service
        .download_file(auth.context(), id)
        .await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_DISPOSITION, attachment(&download.file_name))
        .body(Body::from_stream(download.stream))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}

/// `Content-Disposition` value for a download.
pub(crate) fn attachment(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_escapes_quotes() {
        assert_eq!(
            attachment("say \"hi\".txt"),
            "attachment; filename=\"say _hi_.txt\""
        );
    }
}
