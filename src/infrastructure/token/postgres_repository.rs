//! PostgreSQL refresh token repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::DomainError;
use crate::domain::token::{RefreshToken, RefreshTokenRepository};
use crate::domain::user::UserId;

/// PostgreSQL implementation of RefreshTokenRepository
#[derive(Debug, Clone)]
pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn find_by_device(
        &self,
        user_id: &UserId,
        user_agent: &str,
    ) -> Result<Option<RefreshToken>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT token, user_id, user_agent, exp
            FROM refresh_tokens
            WHERE user_id = $1 AND user_agent = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(user_agent)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get refresh token: {}", e)))?;

        row.as_ref().map(row_to_token).transpose()
    }

    async fn create(&self, token: &RefreshToken) -> Result<RefreshToken, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, user_agent, exp)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, user_agent)
            DO UPDATE SET token = EXCLUDED.token, exp = EXCLUDED.exp
            RETURNING token, user_id, user_agent, exp
            "#,
        )
        .bind(token.token())
        .bind(token.user_id().as_uuid())
        .bind(token.user_agent())
        .bind(token.exp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create refresh token: {}", e)))?;

        row_to_token(&row)
    }

    async fn rotate(
        &self,
        current: &str,
        next: &str,
        exp: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET token = $2, exp = $3
            WHERE token = $1
            RETURNING token, user_id, user_agent, exp
            "#,
        )
        .bind(current)
        .bind(next)
        .bind(exp)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to rotate refresh token: {}", e)))?;

        row.as_ref().map(row_to_token).transpose()
    }

    async fn delete_by_token(&self, token: &str) -> Result<Option<RefreshToken>, DomainError> {
        let row = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE token = $1
            RETURNING token, user_id, user_agent, exp
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to delete refresh token: {}", e)))?;

        row.as_ref().map(row_to_token).transpose()
    }

    async fn delete_by_user(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to delete refresh tokens of user: {}", e))
            })?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE exp <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to purge expired refresh tokens: {}", e))
            })?;

        Ok(result.rows_affected())
    }
}

fn row_to_token(row: &sqlx::postgres::PgRow) -> Result<RefreshToken, DomainError> {
    let column_error =
        |e: sqlx::Error| DomainError::storage(format!("Failed to read refresh token row: {}", e));

    let token: String = row.try_get("token").map_err(column_error)?;
    let user_id: Uuid = row.try_get("user_id").map_err(column_error)?;
    let user_agent: String = row.try_get("user_agent").map_err(column_error)?;
    let exp: DateTime<Utc> = row.try_get("exp").map_err(column_error)?;

    Ok(RefreshToken::new(token, UserId::from(user_id), user_agent, exp))
}
