//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{User, UserId};
use super::patch::UserPatch;
use crate::domain::DomainError;

/// Repository trait for user storage
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Find a user whose id or email equals the given value
    async fn find_by_id_or_email(&self, id_or_email: &str) -> Result<Option<User>, DomainError>;

    /// Insert a user keyed by the patch email, or update the supplied fields
    /// of the existing one. With `OnConflict::Reject` an existing row fails
    /// with `Conflict` and is left untouched.
    async fn upsert_by_email(&self, patch: &UserPatch) -> Result<User, DomainError>;

    /// Delete a user, returning whether a row was removed
    async fn delete(&self, id: &UserId) -> Result<bool, DomainError>;
}
