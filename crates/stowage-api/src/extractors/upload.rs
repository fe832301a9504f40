//! Multipart upload form shared by file and folder uploads.

use axum::extract::{FromRequest, Multipart, Request};

use stowage_core::error::AppError;
use stowage_core::types::FolderId;
use stowage_service::UploadItem;

use crate::error::ApiError;

/// A parsed upload form.
///
/// Recognised fields:
/// - `files`: one part per file; the part's filename may carry a relative path
/// - `paths`: optional relative paths, paired with `files` by position
/// - `parent_folder_id`: target folder (absent or empty for the user root)
/// - `root_folder_name`: name for a flat or empty folder upload
#[derive(Debug, Default)]
pub struct UploadForm {
    /// Uploaded bodies in the order they were sent.
    pub items: Vec<UploadItem>,
    /// Target folder.
    pub parent_folder_id: Option<FolderId>,
    /// Requested root name for folder uploads.
    pub root_folder_name: Option<String>,
}

impl<S> FromRequest<S> for UploadForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(format!("Multipart error: {e}")))?;

        let mut form = UploadForm::default();
        let mut paths: Vec<String> = Vec::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::bad_request(format!("Multipart error: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "files" | "file" => {
                    let file_name = field
                        .file_name()
                        .map(str::to_string)
                        .ok_or_else(|| AppError::bad_request("File part has no filename"))?;
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::bad_request(format!("Read error: {e}")))?;
                    form.items.push(UploadItem::new(file_name, data));
                }
                "paths" => paths.push(read_text(field).await?),
                "parent_folder_id" => {
                    let text = read_text(field).await?;
                    let text = text.trim();
                    if !text.is_empty() {
                        form.parent_folder_id = Some(text.parse().map_err(|_| {
                            AppError::bad_request(format!("Invalid parent_folder_id: '{text}'"))
                        })?);
                    }
                }
                "root_folder_name" => {
                    let text = read_text(field).await?;
                    if !text.trim().is_empty() {
                        form.root_folder_name = Some(text);
                    }
                }
                _ => {
                    tracing::debug!(field = %name, "Ignoring unknown multipart field");
                }
            }
        }

        for (item, path) in form.items.iter_mut().zip(paths) {
            if !path.trim().is_empty() {
                item.relative_path = Some(path);
            }
        }

        Ok(form)
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::bad_request(format!("Read error: {e}")))
}
