//! User repository implementation.

use sqlx::PgPool;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_core::types::{SizeMb, UserId};
use stowage_entity::user::{CreateUser, User};

/// Columns selected for a [`User`] row, with sizes scaled to integers.
const USER_COLUMNS: &str = "id, full_name, department, \
     (total_storage_mb * 10000)::BIGINT AS total_storage_mb, \
     (used_storage_mb * 10000)::BIGINT AS used_storage_mb, \
     created_at";

/// Repository for user lookups and quota updates.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    /// List every user, oldest first.
    pub async fn find_all(&self) -> AppResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");
        sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list users", e))
    }

    /// Create a new user with zero usage.
    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users (id, full_name, department, total_storage_mb, used_storage_mb) \
             VALUES ($1, $2, $3, $4::BIGINT::NUMERIC / 10000, 0) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(UserId::new())
            .bind(&data.full_name)
            .bind(&data.department)
            .bind(data.total_storage_mb)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create user", e))
    }

    /// Add to the user's usage.
    pub async fn add_usage(&self, id: UserId, delta: SizeMb) -> AppResult<User> {
        let sql = format!(
            "UPDATE users SET used_storage_mb = used_storage_mb + $2::BIGINT::NUMERIC / 10000 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(delta)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to add storage usage", e))?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    /// Subtract from the user's usage, never going below zero.
    pub async fn release_usage(&self, id: UserId, delta: SizeMb) -> AppResult<User> {
        let sql = format!(
            "UPDATE users SET used_storage_mb = GREATEST(used_storage_mb - $2::BIGINT::NUMERIC / 10000, 0) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(delta)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to release storage usage", e)
            })?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }
}
