//! Refresh token, token pair and access claims

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::{Role, User, UserId};

/// Per-device refresh token row
///
/// At most one live row exists per `(user_id, user_agent)` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    token: String,
    user_id: UserId,
    user_agent: String,
    exp: DateTime<Utc>,
}

impl RefreshToken {
    pub fn new(
        token: impl Into<String>,
        user_id: UserId,
        user_agent: impl Into<String>,
        exp: DateTime<Utc>,
    ) -> Self {
        Self {
            token: token.into(),
            user_id,
            user_agent: user_agent.into(),
            exp,
        }
    }

    // Getters

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn exp(&self) -> DateTime<Utc> {
        self.exp
    }

    /// A token whose expiry equals `now` is already dead
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// True when both rows occupy the same device slot
    pub fn same_slot(&self, other: &RefreshToken) -> bool {
        self.user_id == other.user_id && self.user_agent == other.user_agent
    }

    // Mutators

    /// Replace the value and expiry, keeping the slot
    pub fn rotate(&mut self, token: impl Into<String>, exp: DateTime<Utc>) {
        self.token = token.into();
        self.exp = exp;
    }
}

/// Access token plus refresh token handed out by every successful sign-in
#[derive(Debug, Clone)]
pub struct Tokens {
    /// Signed access token, already carrying the `Bearer ` prefix
    pub access_token: String,
    pub refresh_token: RefreshToken,
}

/// Access token payload; also the principal of an authenticated request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub id: UserId,
    pub email: String,
    pub roles: BTreeSet<Role>,
    /// Issued at (Unix epoch seconds)
    pub iat: i64,
    /// Expiration (Unix epoch seconds)
    pub exp: i64,
}

impl AccessClaims {
    /// Claims for `user` valid for `ttl` from now
    pub fn new(user: &User, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: *user.id(),
            email: user.email().to_string(),
            roles: user.roles().clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Whether this principal may act on the account `id`
    pub fn can_manage(&self, id: &UserId) -> bool {
        &self.id == id || self.is_admin()
    }
}

/// How refresh treats a user agent that differs from the one the token was
/// issued to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceBinding {
    /// Accept the token and move the session to the presenting agent
    #[default]
    Trust,
    /// Refuse the refresh
    Strict,
}
