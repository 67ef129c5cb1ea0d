//! User entity and related types

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::patch::UserPatch;
use super::validation::UserValidationError;

/// Storage-assigned user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its string form
    pub fn parse(value: &str) -> Result<Self, UserValidationError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId(value.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for UserId {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role tag attached to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(UserValidationError::UnknownRole(s.to_string())),
        }
    }
}

/// Default role set for new accounts
pub fn default_roles() -> BTreeSet<Role> {
    BTreeSet::from([Role::User])
}

/// Where an account's identity comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Email and password registration
    #[default]
    #[serde(rename = "none")]
    Local,
    Google,
    Yandex,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "none",
            Self::Google => "google",
            Self::Yandex => "yandex",
        }
    }
}

impl FromStr for AuthProvider {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "local" => Ok(Self::Local),
            "google" => Ok(Self::Google),
            "yandex" => Ok(Self::Yandex),
            _ => Err(UserValidationError::UnknownProvider(s.to_string())),
        }
    }
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User entity
///
/// Serializes in full (password hash included) because the cache stores
/// complete snapshots. Anything leaving the service goes through
/// `UserResponse` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    email: String,
    /// Absent for federated-only accounts
    password_hash: Option<String>,
    roles: BTreeSet<Role>,
    is_blocked: bool,
    provider: AuthProvider,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with default roles and no credentials
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id,
            email: email.into(),
            password_hash: None,
            roles: default_roles(),
            is_blocked: false,
            provider: AuthProvider::Local,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build the row an upsert inserts when no user matches the patch email
    pub fn from_patch(id: UserId, patch: &UserPatch) -> Self {
        let mut user = Self::new(id, patch.email());
        user.password_hash = patch.password_hash().map(str::to_string);
        user.provider = patch.provider().unwrap_or_default();
        user
    }

    /// Restore persisted timestamps
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    /// Restore the full persisted state of the mutable fields
    pub fn with_state(
        mut self,
        password_hash: Option<String>,
        roles: BTreeSet<Role>,
        is_blocked: bool,
        provider: AuthProvider,
    ) -> Self {
        self.password_hash = password_hash;
        self.roles = roles;
        self.is_blocked = is_blocked;
        self.provider = provider;
        self
    }

    // Getters

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn is_blocked(&self) -> bool {
        self.is_blocked
    }

    pub fn provider(&self) -> AuthProvider {
        self.provider
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    // Mutators

    /// Apply the fields a patch supplies; unset fields are preserved
    pub fn apply_patch(&mut self, patch: &UserPatch) {
        if let Some(hash) = patch.password_hash() {
            self.password_hash = Some(hash.to_string());
        }

        if let Some(provider) = patch.provider() {
            self.provider = provider;
        }

        if let Some(roles) = patch.roles() {
            self.roles = roles.clone();
        }

        if let Some(blocked) = patch.is_blocked() {
            self.is_blocked = blocked;
        }

        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
