//! Storage backend selection

use std::sync::Arc;

use serde::Deserialize;
use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;
use crate::domain::token::RefreshTokenRepository;
use crate::domain::user::UserRepository;
use crate::infrastructure::token::{InMemoryRefreshTokenRepository, PostgresRefreshTokenRepository};
use crate::infrastructure::user::{InMemoryUserRepository, PostgresUserRepository};

use super::migrations::run_migrations;
use super::postgres::{PostgresConfig, connect_pool};

/// Supported storage backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    #[default]
    #[serde(alias = "memory")]
    InMemory,
    #[serde(alias = "postgresql")]
    Postgres,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::InMemory => write!(f, "in_memory"),
            StorageType::Postgres => write!(f, "postgres"),
        }
    }
}

/// `[storage]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default, rename = "type")]
    pub storage_type: StorageType,
    #[serde(default)]
    pub postgres: Option<PostgresConfig>,
    /// Apply pending migrations at startup
    #[serde(default)]
    pub auto_migrate: bool,
}

impl StorageConfig {
    pub fn postgres_config(&self) -> Result<&PostgresConfig, DomainError> {
        self.postgres.as_ref().ok_or_else(|| {
            DomainError::configuration("storage.postgres is required for the postgres backend")
        })
    }
}

/// The repositories every other component is built on
#[derive(Debug, Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub pool: Option<PgPool>,
}

/// Builds the configured storage backend
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &StorageConfig) -> Result<Repositories, DomainError> {
        info!(backend = %config.storage_type, "Initializing storage");

        match config.storage_type {
            StorageType::InMemory => Ok(Self::in_memory()),
            StorageType::Postgres => {
                let pool = connect_pool(config.postgres_config()?).await?;

                if config.auto_migrate {
                    let applied = run_migrations(&pool).await?;
                    info!(applied, "Startup migrations complete");
                }

                Ok(Repositories {
                    users: Arc::new(PostgresUserRepository::new(pool.clone())),
                    refresh_tokens: Arc::new(PostgresRefreshTokenRepository::new(pool.clone())),
                    pool: Some(pool),
                })
            }
        }
    }

    pub fn in_memory() -> Repositories {
        Repositories {
            users: Arc::new(InMemoryUserRepository::new()),
            refresh_tokens: Arc::new(InMemoryRefreshTokenRepository::new()),
            pool: None,
        }
    }
}
