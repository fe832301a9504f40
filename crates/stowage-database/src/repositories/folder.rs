//! Folder repository implementation.

use std::path::MAIN_SEPARATOR;

use sqlx::PgPool;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_core::types::{FolderId, UserId};
use stowage_entity::folder::{CreateFolder, Folder};

use crate::catalog::{CascadeOutcome, SubtreeCascade};

const FOLDER_COLUMNS: &str =
    "id, user_id, name, parent_folder_id, path, created_at, is_deleted, recycle_path";

/// Matches rows of `{alias}` beneath the cascade root.
///
/// Binds: `$1` user, `$2` root id, `$3` old prefix, `$4` new prefix,
/// `$5` match-deleted, `$6` set-deleted, `$7` separator.
fn cascade_filter(alias: &str) -> String {
    format!(
        "{alias}.user_id = $1 \
         AND {alias}.is_deleted = $5 \
         AND {alias}.recycle_path IS NULL \
         AND left({alias}.path, char_length($3)) = $3 \
         AND NOT ($5 AND EXISTS ( \
             SELECT 1 FROM folders s \
             WHERE s.user_id = $1 AND s.id <> $2 AND s.is_deleted \
               AND s.recycle_path IS NOT NULL \
               AND left(s.path, char_length($3)) = $3 \
               AND left({alias}.path, char_length(s.path) + 1) = s.path || $7))"
    )
}

/// Repository for folder rows and subtree cascades.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a folder by ID, owner and delete-state.
    pub async fn find_by_id(
        &self,
        user_id: UserId,
        id: FolderId,
        is_deleted: bool,
    ) -> AppResult<Option<Folder>> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders \
             WHERE id = $1 AND user_id = $2 AND is_deleted = $3"
        );
        sqlx::query_as::<_, Folder>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(is_deleted)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// Find a live folder by exact name under a parent.
    pub async fn find_by_name(
        &self,
        user_id: UserId,
        parent: Option<FolderId>,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders \
             WHERE user_id = $1 AND parent_folder_id IS NOT DISTINCT FROM $2 \
               AND lower(name) = lower($3) AND NOT is_deleted \
             ORDER BY created_at ASC LIMIT 1"
        );
        sqlx::query_as::<_, Folder>(&sql)
            .bind(user_id)
            .bind(parent)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find folder by name", e)
            })
    }

    /// All folders of a user in one delete-state.
    pub async fn find_all(&self, user_id: UserId, is_deleted: bool) -> AppResult<Vec<Folder>> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders \
             WHERE user_id = $1 AND is_deleted = $2 ORDER BY lower(name) ASC"
        );
        sqlx::query_as::<_, Folder>(&sql)
            .bind(user_id)
            .bind(is_deleted)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folders", e))
    }

    /// Direct children of a parent (root when `None`).
    pub async fn find_children(
        &self,
        user_id: UserId,
        parent: Option<FolderId>,
        is_deleted: bool,
    ) -> AppResult<Vec<Folder>> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders \
             WHERE user_id = $1 AND parent_folder_id IS NOT DISTINCT FROM $2 AND is_deleted = $3 \
             ORDER BY lower(name) ASC"
        );
        sqlx::query_as::<_, Folder>(&sql)
            .bind(user_id)
            .bind(parent)
            .bind(is_deleted)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    /// Folders whose name contains the keyword, case-insensitively.
    pub async fn search(
        &self,
        user_id: UserId,
        keyword: &str,
        is_deleted: bool,
    ) -> AppResult<Vec<Folder>> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders \
             WHERE user_id = $1 AND is_deleted = $2 AND strpos(lower(name), lower($3)) > 0 \
             ORDER BY lower(name) ASC"
        );
        sqlx::query_as::<_, Folder>(&sql)
            .bind(user_id)
            .bind(is_deleted)
            .bind(keyword)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search folders", e))
    }

    /// Names of live siblings, optionally excluding one folder.
    pub async fn sibling_names(
        &self,
        user_id: UserId,
        parent: Option<FolderId>,
        exclude: Option<FolderId>,
    ) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM folders \
             WHERE user_id = $1 AND parent_folder_id IS NOT DISTINCT FROM $2 \
               AND NOT is_deleted AND id IS DISTINCT FROM $3",
        )
        .bind(user_id)
        .bind(parent)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list sibling names", e))
    }

    /// Create a new folder.
    pub async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        let sql = format!(
            "INSERT INTO folders (id, user_id, name, parent_folder_id, path) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {FOLDER_COLUMNS}"
        );
        sqlx::query_as::<_, Folder>(&sql)
            .bind(FolderId::new())
            .bind(data.user_id)
            .bind(&data.name)
            .bind(data.parent_folder_id)
            .bind(&data.path)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create folder", e))
    }

    /// Apply a subtree cascade inside one transaction.
    pub async fn apply_cascade(&self, cascade: &SubtreeCascade) -> AppResult<CascadeOutcome> {
        let old_prefix = cascade.old_prefix();
        let new_prefix = cascade.new_prefix();
        let separator = MAIN_SEPARATOR.to_string();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let folder_sql = format!(
            "UPDATE folders AS f \
             SET path = $4 || substr(f.path, char_length($3) + 1), is_deleted = $6 \
             WHERE f.id <> $2 AND {}",
            cascade_filter("f")
        );
        let folders_updated = sqlx::query(&folder_sql)
            .bind(cascade.user_id)
            .bind(cascade.root_id)
            .bind(&old_prefix)
            .bind(&new_prefix)
            .bind(cascade.match_deleted)
            .bind(cascade.set_deleted)
            .bind(&separator)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to cascade folder paths", e)
            })?
            .rows_affected();

        let file_sql = format!(
            "UPDATE files AS f \
             SET path = $4 || substr(f.path, char_length($3) + 1), is_deleted = $6 \
             WHERE {}",
            cascade_filter("f")
        );
        let files_updated = sqlx::query(&file_sql)
            .bind(cascade.user_id)
            .bind(cascade.root_id)
            .bind(&old_prefix)
            .bind(&new_prefix)
            .bind(cascade.match_deleted)
            .bind(cascade.set_deleted)
            .bind(&separator)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to cascade file paths", e)
            })?
            .rows_affected();

        if cascade.carry_deleted {
            for table in ["folders", "files"] {
                let carry_sql = format!(
                    "UPDATE {table} \
                     SET path = $3 || substr(path, char_length($2) + 1) \
                     WHERE user_id = $1 AND is_deleted \
                       AND left(path, char_length($2)) = $2"
                );
                sqlx::query(&carry_sql)
                    .bind(cascade.user_id)
                    .bind(&old_prefix)
                    .bind(&new_prefix)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::with_source(
                            ErrorKind::Database,
                            "Failed to carry deleted paths",
                            e,
                        )
                    })?;
            }
        }

        let root_sql = format!(
            "UPDATE folders SET name = COALESCE($3, name), path = $4, is_deleted = $5, \
             recycle_path = $6 WHERE id = $1 AND user_id = $2 RETURNING {FOLDER_COLUMNS}"
        );
        let root = sqlx::query_as::<_, Folder>(&root_sql)
            .bind(cascade.root_id)
            .bind(cascade.user_id)
            .bind(&cascade.new_name)
            .bind(&cascade.new_path)
            .bind(cascade.set_deleted)
            .bind(&cascade.recycle_path)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update folder", e))?
            .ok_or_else(|| AppError::not_found(format!("Folder {} not found", cascade.root_id)))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit cascade", e)
        })?;

        Ok(CascadeOutcome {
            root,
            folders_updated,
            files_updated,
        })
    }

    /// Delete a folder row.
    pub async fn delete(&self, user_id: UserId, id: FolderId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete folder", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
