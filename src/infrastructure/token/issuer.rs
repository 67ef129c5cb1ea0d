//! Token issuer: access token minting and refresh token lifecycle

use std::sync::Arc;

use chrono::{DateTime, Duration, Months, Utc};
use tracing::debug;

use super::generator::RefreshTokenGenerator;
use super::jwt::JwtGenerator;
use crate::domain::DomainError;
use crate::domain::token::{AccessClaims, RefreshToken, RefreshTokenRepository, Tokens};
use crate::domain::user::{User, UserId};

/// Refresh token lifetime without remember-me
const SHORT_SESSION_HOURS: i64 = 12;

/// Mints access tokens and owns refresh token rows
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    jwt: Arc<dyn JwtGenerator>,
    repository: Arc<dyn RefreshTokenRepository>,
    generator: RefreshTokenGenerator,
}

impl TokenIssuer {
    pub fn new(jwt: Arc<dyn JwtGenerator>, repository: Arc<dyn RefreshTokenRepository>) -> Self {
        Self {
            jwt,
            repository,
            generator: RefreshTokenGenerator::new(),
        }
    }

    /// Access token lifetime, which is also the user cache TTL
    pub fn access_token_ttl(&self) -> Duration {
        self.jwt.ttl()
    }

    /// Sign an access token, returned with its `Bearer ` prefix
    pub fn issue_access_token(&self, user: &User) -> Result<String, DomainError> {
        Ok(format!("Bearer {}", self.jwt.generate(user)?))
    }

    /// Check signature and expiry of a bare access token
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, DomainError> {
        self.jwt.validate(token)
    }

    /// Expiry of a refresh token issued at `now`
    pub fn refresh_expiry(now: DateTime<Utc>, remember_me: bool) -> DateTime<Utc> {
        if remember_me {
            now.checked_add_months(Months::new(1))
                .unwrap_or(now + Duration::days(30))
        } else {
            now + Duration::hours(SHORT_SESSION_HOURS)
        }
    }

    /// Rotate the device slot's refresh token in place, or create one
    pub async fn issue_or_rotate_refresh_token(
        &self,
        user_id: &UserId,
        user_agent: &str,
        remember_me: bool,
    ) -> Result<RefreshToken, DomainError> {
        let exp = Self::refresh_expiry(Utc::now(), remember_me);
        let value = self.generator.generate();

        if let Some(existing) = self.repository.find_by_device(user_id, user_agent).await? {
            if let Some(rotated) = self.repository.rotate(existing.token(), &value, exp).await? {
                debug!(user_id = %user_id, "Rotated refresh token");
                return Ok(rotated);
            }

            debug!(user_id = %user_id, "Refresh token vanished before rotation, creating");
        }

        let token = RefreshToken::new(value, *user_id, user_agent, exp);
        self.repository.create(&token).await
    }

    /// Issue an access token and a refresh token for one device
    pub async fn issue_tokens(
        &self,
        user: &User,
        user_agent: &str,
        remember_me: bool,
    ) -> Result<Tokens, DomainError> {
        let access_token = self.issue_access_token(user)?;
        let refresh_token = self
            .issue_or_rotate_refresh_token(user.id(), user_agent, remember_me)
            .await?;

        Ok(Tokens {
            access_token,
            refresh_token,
        })
    }

    /// Delete and return the row holding `value`. Absent rows are
    /// Unauthorized, so a replayed token always fails.
    pub async fn consume_refresh_token(&self, value: &str) -> Result<RefreshToken, DomainError> {
        self.repository
            .delete_by_token(value)
            .await?
            .ok_or_else(|| DomainError::unauthorized("Refresh token not recognized"))
    }

    /// Delete the row holding `value` if there is one
    pub async fn revoke(&self, value: &str) -> Result<(), DomainError> {
        self.repository.delete_by_token(value).await?;
        Ok(())
    }

    pub async fn revoke_all_for_user(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let count = self.repository.delete_by_user(user_id).await?;
        debug!(user_id = %user_id, count, "Revoked refresh tokens of user");
        Ok(count)
    }

    /// Delete every expired row; the caller reports the count
    pub async fn purge_expired(&self) -> Result<u64, DomainError> {
        self.repository.delete_expired(Utc::now()).await
    }
}
