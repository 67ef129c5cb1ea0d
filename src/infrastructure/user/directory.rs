//! User directory: storage lookups behind a read-through, write-through cache

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::cache::{Cache, CacheExt};
use crate::domain::token::AccessClaims;
use crate::domain::user::{User, UserId, UserPatch, UserRepository};
use crate::domain::DomainError;

const KEY_PREFIX: &str = "user:";

/// Owns user records. Storage is the source of truth; the cache only ever
/// holds snapshots and is treated as a hint.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    repository: Arc<dyn UserRepository>,
    cache: Arc<dyn Cache>,
    cache_ttl: Duration,
}

impl UserDirectory {
    /// `cache_ttl` should equal the access-token lifetime
    pub fn new(
        repository: Arc<dyn UserRepository>,
        cache: Arc<dyn Cache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            cache,
            cache_ttl,
        }
    }

    /// Ids are keyed in canonical form so every spelling of a UUID shares
    /// the entry that upsert and delete maintain
    fn cache_key(key: &str) -> String {
        match UserId::parse(key) {
            Ok(id) => format!("{KEY_PREFIX}{id}"),
            Err(_) => format!("{KEY_PREFIX}{key}"),
        }
    }

    /// Look up a user by id or email
    pub async fn find_by_id_or_email(&self, key: &str) -> Result<Option<User>, DomainError> {
        let cache_key = Self::cache_key(key);

        match self.cache.get::<User>(&cache_key).await {
            Ok(Some(user)) => {
                debug!(key = %key, "User cache hit");
                return Ok(Some(user));
            }
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "User cache read failed, falling back to storage"),
        }

        let user = self.repository.find_by_id_or_email(key).await?;

        if let Some(user) = &user {
            self.cache_put(&cache_key, user).await;
        }

        Ok(user)
    }

    /// Evict `key` then look it up, bypassing any stale snapshot
    pub async fn find_fresh(&self, key: &str) -> Result<Option<User>, DomainError> {
        self.cache_evict(&Self::cache_key(key)).await;
        self.find_by_id_or_email(key).await
    }

    /// Upsert by email and refresh the cached snapshot under id and email
    pub async fn upsert(&self, patch: &UserPatch) -> Result<User, DomainError> {
        let user = self.repository.upsert_by_email(patch).await?;

        self.cache_put(&Self::cache_key(&user.id().to_string()), &user)
            .await;
        self.cache_put(&Self::cache_key(user.email()), &user).await;

        Ok(user)
    }

    /// Delete an account. Only the account itself or an admin may do this.
    pub async fn delete(&self, id: &UserId, principal: &AccessClaims) -> Result<UserId, DomainError> {
        if !principal.can_manage(id) {
            return Err(DomainError::forbidden(
                "Only the account owner or an administrator can delete this user",
            ));
        }

        let id_key = id.to_string();
        let target = self
            .repository
            .find_by_id_or_email(&id_key)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))?;

        self.cache_evict(&Self::cache_key(&id_key)).await;
        self.cache_evict(&Self::cache_key(target.email())).await;

        if !self.repository.delete(id).await? {
            return Err(DomainError::not_found(format!("User '{}' not found", id)));
        }

        Ok(*id)
    }

    /// Readiness check for the backing cache
    pub async fn ping_cache(&self) -> Result<(), DomainError> {
        self.cache.ping().await
    }

    async fn cache_put(&self, cache_key: &str, user: &User) {
        if let Err(e) = self.cache.set(cache_key, user, self.cache_ttl).await {
            warn!(key = %cache_key, error = %e, "Failed to cache user");
        }
    }

    async fn cache_evict(&self, cache_key: &str) {
        if let Err(e) = self.cache.delete(cache_key).await {
            warn!(key = %cache_key, error = %e, "Failed to evict cached user");
        }
    }
}
