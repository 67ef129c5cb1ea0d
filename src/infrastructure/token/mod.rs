//! Token infrastructure module
//!
//! HS256 access token signing, refresh token generation and storage, and
//! the token issuer that ties them together.

mod generator;
mod issuer;
mod jwt;
mod postgres_repository;
mod repository;

pub use generator::RefreshTokenGenerator;
pub use issuer::TokenIssuer;
pub use jwt::{JwtConfig, JwtGenerator, JwtService};
pub use postgres_repository::PostgresRefreshTokenRepository;
pub use repository::InMemoryRefreshTokenRepository;
