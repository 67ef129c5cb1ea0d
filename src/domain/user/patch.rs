//! Partial user record used for upsert-by-email

use std::collections::BTreeSet;

use super::entity::{AuthProvider, Role};

/// What an upsert does when a user with the patch email already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnConflict {
    /// Update the supplied fields of the existing row
    #[default]
    Update,
    /// Leave the existing row alone and fail with `Conflict`
    Reject,
}

/// Partial user keyed by email. Every field but the email is optional and
/// an unset field leaves the stored value untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct UserPatch {
    email: String,
    password_hash: Option<String>,
    provider: Option<AuthProvider>,
    roles: Option<BTreeSet<Role>>,
    is_blocked: Option<bool>,
    on_conflict: OnConflict,
}

impl UserPatch {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: None,
            provider: None,
            roles: None,
            is_blocked: None,
            on_conflict: OnConflict::Update,
        }
    }

    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    pub fn with_provider(mut self, provider: AuthProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = Some(roles.into_iter().collect());
        self
    }

    pub fn with_blocked(mut self, blocked: bool) -> Self {
        self.is_blocked = Some(blocked);
        self
    }

    /// Turn the upsert into an insert that refuses to touch an existing row
    pub fn insert_only(mut self) -> Self {
        self.on_conflict = OnConflict::Reject;
        self
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn provider(&self) -> Option<AuthProvider> {
        self.provider
    }

    pub fn roles(&self) -> Option<&BTreeSet<Role>> {
        self.roles.as_ref()
    }

    pub fn is_blocked(&self) -> Option<bool> {
        self.is_blocked
    }

    pub fn on_conflict(&self) -> OnConflict {
        self.on_conflict
    }
}
