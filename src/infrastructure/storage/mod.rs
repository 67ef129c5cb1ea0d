//! Storage backends and schema management

mod factory;
pub mod migrations;
mod postgres;

pub use factory::{Repositories, StorageConfig, StorageFactory, StorageType};
pub use migrations::{Migration, PostgresMigrator, revert_last_migration, run_migrations};
pub use postgres::{PostgresConfig, connect_pool};
