//! File repository implementation.

use sqlx::PgPool;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_core::types::{FileId, FolderId, UserId};
use stowage_entity::file::{CreateFileItem, FileItem};

const FILE_COLUMNS: &str = "id, user_id, name, file_type, \
     (size_mb * 10000)::BIGINT AS size_mb, \
     folder_id, path, uploaded_at, is_deleted, recycle_path";

/// Repository for file rows.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a file by ID, owner and delete-state.
    pub async fn find_by_id(
        &self,
        user_id: UserId,
        id: FileId,
        is_deleted: bool,
    ) -> AppResult<Option<FileItem>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files \
             WHERE id = $1 AND user_id = $2 AND is_deleted = $3"
        );
        sqlx::query_as::<_, FileItem>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(is_deleted)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// All files of a user in one delete-state.
    pub async fn find_all(&self, user_id: UserId, is_deleted: bool) -> AppResult<Vec<FileItem>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files \
             WHERE user_id = $1 AND is_deleted = $2 ORDER BY lower(name) ASC"
        );
        sqlx::query_as::<_, FileItem>(&sql)
            .bind(user_id)
            .bind(is_deleted)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }

    /// Files directly inside a folder (root when `None`).
    pub async fn find_by_folder(
        &self,
        user_id: UserId,
        folder: Option<FolderId>,
        is_deleted: bool,
    ) -> AppResult<Vec<FileItem>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files \
             WHERE user_id = $1 AND folder_id IS NOT DISTINCT FROM $2 AND is_deleted = $3 \
             ORDER BY lower(name) ASC"
        );
        sqlx::query_as::<_, FileItem>(&sql)
            .bind(user_id)
            .bind(folder)
            .bind(is_deleted)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list files in folder", e)
            })
    }

    /// Files whose name or type contains the keyword, case-insensitively.
    pub async fn search(
        &self,
        user_id: UserId,
        keyword: &str,
        is_deleted: bool,
    ) -> AppResult<Vec<FileItem>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files \
             WHERE user_id = $1 AND is_deleted = $2 \
               AND (strpos(lower(name), lower($3)) > 0 OR strpos(lower(file_type), lower($3)) > 0) \
             ORDER BY lower(name) ASC"
        );
        sqlx::query_as::<_, FileItem>(&sql)
            .bind(user_id)
            .bind(is_deleted)
            .bind(keyword)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search files", e))
    }

    /// `name.type` of live siblings, optionally excluding one file.
    pub async fn sibling_names(
        &self,
        user_id: UserId,
        folder: Option<FolderId>,
        exclude: Option<FileId>,
    ) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT CASE WHEN file_type = '' THEN name ELSE name || '.' || file_type END \
             FROM files \
             WHERE user_id = $1 AND folder_id IS NOT DISTINCT FROM $2 \
               AND NOT is_deleted AND id IS DISTINCT FROM $3",
        )
        .bind(user_id)
        .bind(folder)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list sibling names", e))
    }

    /// Create a new file row.
    pub async fn create(&self, data: &CreateFileItem) -> AppResult<FileItem> {
        let sql = format!(
            "INSERT INTO files (id, user_id, name, file_type, size_mb, folder_id, path) \
             VALUES ($1, $2, $3, $4, $5::BIGINT::NUMERIC / 10000, $6, $7) \
             RETURNING {FILE_COLUMNS}"
        );
        sqlx::query_as::<_, FileItem>(&sql)
            .bind(FileId::new())
            .bind(data.user_id)
            .bind(&data.name)
            .bind(&data.file_type)
            .bind(data.size_mb)
            .bind(data.folder_id)
            .bind(&data.path)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create file", e))
    }

    /// Persist name, path, delete-state and recycle location.
    pub async fn update(&self, file: &FileItem) -> AppResult<FileItem> {
        let sql = format!(
            "UPDATE files SET name = $3, path = $4, is_deleted = $5, recycle_path = $6 \
             WHERE id = $1 AND user_id = $2 RETURNING {FILE_COLUMNS}"
        );
        sqlx::query_as::<_, FileItem>(&sql)
            .bind(file.id)
            .bind(file.user_id)
            .bind(&file.name)
            .bind(&file.path)
            .bind(file.is_deleted)
            .bind(&file.recycle_path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file", e))?
            .ok_or_else(|| AppError::not_found(format!("File {} not found", file.id)))
    }

    /// Delete a file row.
    pub async fn delete(&self, user_id: UserId, id: FileId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?;
        Ok(result.rows_affected() > 0)
    }
}
