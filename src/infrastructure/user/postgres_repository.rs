//! PostgreSQL user repository implementation

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::DomainError;
use crate::domain::user::{
    AuthProvider, OnConflict, Role, User, UserId, UserPatch, UserRepository, default_roles,
};

const USER_COLUMNS: &str =
    "id, email, password_hash, roles, is_blocked, provider, created_at, updated_at";

/// PostgreSQL implementation of UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id_or_email(&self, id_or_email: &str) -> Result<Option<User>, DomainError> {
        // A value that is not a UUID can only match by email
        let id = UserId::parse(id_or_email).ok().map(|id| *id.as_uuid());

        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR id = $2 LIMIT 1"
        ))
        .bind(id_or_email)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn upsert_by_email(&self, patch: &UserPatch) -> Result<User, DomainError> {
        let insert_roles = roles_to_vec(patch.roles().unwrap_or(&default_roles()));
        let patch_roles = patch.roles().map(roles_to_vec);
        let provider = patch.provider().map(|p| p.as_str());

        let on_conflict = match patch.on_conflict() {
            OnConflict::Reject => "DO NOTHING".to_string(),
            OnConflict::Update => r#"DO UPDATE SET
                password_hash = COALESCE($3, users.password_hash),
                provider = COALESCE($7, users.provider),
                roles = COALESCE($8, users.roles),
                is_blocked = COALESCE($9, users.is_blocked),
                updated_at = NOW()"#
                .to_string(),
        };

        let sql = format!(
            r#"
            INSERT INTO users (id, email, password_hash, roles, is_blocked, provider,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            ON CONFLICT (email) {on_conflict}
            RETURNING {USER_COLUMNS}
            "#
        );

        let mut query = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(patch.email())
            .bind(patch.password_hash())
            .bind(&insert_roles)
            .bind(patch.is_blocked().unwrap_or(false))
            .bind(provider.unwrap_or(AuthProvider::Local.as_str()));

        if patch.on_conflict() == OnConflict::Update {
            query = query
                .bind(provider)
                .bind(&patch_roles)
                .bind(patch.is_blocked());
        }

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to upsert user: {}", e)))?;

        match row {
            Some(row) => row_to_user(&row),
            None => Err(DomainError::conflict(format!(
                "User '{}' already exists",
                patch.email()
            ))),
        }
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete user: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> Result<User, DomainError> {
    let column_error =
        |e: sqlx::Error| DomainError::storage(format!("Failed to read user row: {}", e));

    let id: Uuid = row.try_get("id").map_err(column_error)?;
    let email: String = row.try_get("email").map_err(column_error)?;
    let password_hash: Option<String> = row.try_get("password_hash").map_err(column_error)?;
    let roles: Vec<String> = row.try_get("roles").map_err(column_error)?;
    let is_blocked: bool = row.try_get("is_blocked").map_err(column_error)?;
    let provider: String = row.try_get("provider").map_err(column_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(column_error)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(column_error)?;

    let roles = vec_to_roles(&roles)?;
    let provider: AuthProvider = provider
        .parse()
        .map_err(|e| DomainError::storage(format!("Invalid provider in database: {}", e)))?;

    Ok(User::new(UserId::from(id), email)
        .with_state(password_hash, roles, is_blocked, provider)
        .with_timestamps(created_at, updated_at))
}

fn roles_to_vec(roles: &BTreeSet<Role>) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_string()).collect()
}

fn vec_to_roles(roles: &[String]) -> Result<BTreeSet<Role>, DomainError> {
    roles
        .iter()
        .map(|r| {
            r.parse::<Role>()
                .map_err(|e| DomainError::storage(format!("Invalid role in database: {}", e)))
        })
        .collect()
}
