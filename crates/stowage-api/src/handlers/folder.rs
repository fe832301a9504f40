//! Folder CRUD, tree upload, recycle bin and archive handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;

use stowage_core::error::AppError;
use stowage_core::types::FolderId;
use stowage_entity::folder::{Folder, FolderDetails};
use stowage_service::UploadOutcome;

use crate::dto::request::{CreateFolderRequest, RenameRequest, validated};
use crate::dto::response::{ApiResponse, MessageResponse, PurgeResponse, RecoverResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, UploadForm};
use crate::handlers::file::attachment;
use crate::state::AppState;

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateFolderRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Folder>>)> {
    let req = validated(req)?;
    let folder = state
        .folder_service
        .create_folder(auth.context(), &req.name, req.parent_folder_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(folder))))
}

/// POST /api/folders/upload
pub async fn upload_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    form: UploadForm,
) -> ApiResult<Json<ApiResponse<UploadOutcome>>> {
    let outcome = state
        .folder_service
        .upload_folder(
            auth.context(),
            form.items,
            form.parent_folder_id,
            form.root_folder_name.as_deref(),
        )
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// GET /api/folders/{id}
pub async fn get_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FolderId>,
) -> ApiResult<Json<ApiResponse<FolderDetails>>> {
    let details = state.folder_service.details(auth.context(), id).await?;
    Ok(Json(ApiResponse::ok(details)))
}

/// PUT /api/folders/{id}/rename
pub async fn rename_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FolderId>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<Json<ApiResponse<Folder>>> {
    let req = validated(req)?;
    let folder = state
        .folder_service
        .rename_folder(auth.context(), id, &req.new_name)
        .await?;
    Ok(Json(ApiResponse::ok(folder)))
}

/// DELETE /api/folders/{id}
pub async fn delete_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FolderId>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    let folder = state.folder_service.delete_folder(auth.context(), id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(format!(
        "Folder '{}' moved to recycle bin",
        folder.name
    )))))
}

/// PUT /api/folders/{id}/recover
pub async fn recover_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FolderId>,
) -> ApiResult<Json<ApiResponse<RecoverResponse<Folder>>>> {
    let outcome = state
        .folder_service
        .recover_folder(auth.context(), id)
        .await?;
    Ok(Json(ApiResponse::ok(RecoverResponse {
        message: format!("Folder recovered as '{}'", outcome.name),
        name: outcome.name,
        item: outcome.item,
    })))
}

/// DELETE /api/folders/{id}/permanent
pub async fn permanent_delete_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FolderId>,
) -> ApiResult<Json<ApiResponse<PurgeResponse>>> {
    let outcome = state
        .folder_service
        .permanent_delete_folder(auth.context(), id)
        .await?;
    Ok(Json(ApiResponse::ok(PurgeResponse {
        message: format!("Folder permanently deleted, freed {} MB", outcome.freed_mb),
        freed_mb: outcome.freed_mb,
        removed: outcome.removed,
    })))
}

/// GET /api/folders/{id}/download
pub async fn download_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FolderId>,
) -> ApiResult<Response> {
    let archive = state
        .download_service
        .download_folder(auth.context(), id)
        .await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(header::CONTENT_DISPOSITION, attachment(&archive.file_name))
        .header(header::CONTENT_LENGTH, archive.data.len())
        .body(Body::from(archive.data))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}
