//! Token domain
//!
//! Refresh token rows, the access/refresh pair returned on sign-in, and the
//! claims carried by access tokens.

mod entity;
mod repository;

pub use entity::{AccessClaims, DeviceBinding, RefreshToken, Tokens};
pub use repository::RefreshTokenRepository;

#[cfg(test)]
pub use repository::mock::MockRefreshTokenRepository;
