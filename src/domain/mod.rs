//! Domain layer - Core business logic and entities

pub mod cache;
pub mod error;
pub mod identity;
pub mod token;
pub mod user;

pub use cache::{Cache, CacheExt};
pub use error::DomainError;
pub use identity::{FederatedIdentity, IdentityProvider, ProfileAttributes};
pub use token::{AccessClaims, DeviceBinding, RefreshToken, RefreshTokenRepository, Tokens};
pub use user::{AuthProvider, OnConflict, Role, User, UserId, UserPatch, UserRepository};
