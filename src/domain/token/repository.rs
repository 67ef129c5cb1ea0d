//! Refresh token repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::entity::RefreshToken;
use crate::domain::DomainError;
use crate::domain::user::UserId;

/// Repository trait for refresh token storage
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + Debug {
    /// Find the row occupying a device slot
    async fn find_by_device(
        &self,
        user_id: &UserId,
        user_agent: &str,
    ) -> Result<Option<RefreshToken>, DomainError>;

    /// Store a row. If the slot is already taken, its value and expiry are
    /// replaced so the slot still holds a single row.
    async fn create(&self, token: &RefreshToken) -> Result<RefreshToken, DomainError>;

    /// Replace value and expiry of the row currently holding `current`.
    /// Returns `None` when that row no longer exists.
    async fn rotate(
        &self,
        current: &str,
        next: &str,
        exp: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, DomainError>;

    /// Delete the row holding `token`, returning it
    async fn delete_by_token(&self, token: &str) -> Result<Option<RefreshToken>, DomainError>;

    /// Delete every row of a user
    async fn delete_by_user(&self, user_id: &UserId) -> Result<u64, DomainError>;

    /// Delete rows whose expiry is at or before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError>;
}
