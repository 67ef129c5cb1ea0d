//! User infrastructure module
//!
//! Argon2 password hashing, in-memory and PostgreSQL user repositories, and
//! the cached user directory.

mod directory;
mod password;
mod postgres_repository;
mod repository;

pub use directory::UserDirectory;
pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresUserRepository;
pub use repository::InMemoryUserRepository;
