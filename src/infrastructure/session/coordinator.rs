//! Session coordinator: register, login, refresh, logout and federated sign-in

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::domain::DomainError;
use crate::domain::identity::{FederatedIdentity, IdentityProvider};
use crate::domain::token::{AccessClaims, DeviceBinding, Tokens};
use crate::domain::user::{
    AuthProvider, Role, User, UserId, UserPatch, validate_email, validate_roles,
};
use crate::infrastructure::observability::{SessionEvent, record_session_event};
use crate::infrastructure::token::TokenIssuer;
use crate::infrastructure::user::{PasswordHasher, UserDirectory};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Partial account update requested through `update_profile`
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// Account to update; defaults to the caller's own
    pub email: Option<String>,
    pub password: Option<String>,
    pub roles: Option<BTreeSet<Role>>,
    pub is_blocked: Option<bool>,
}

/// Orchestrates the token lifecycle over the user directory, the password
/// hasher and the token issuer. Owns no state of its own.
#[derive(Debug, Clone)]
pub struct SessionCoordinator {
    users: UserDirectory,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenIssuer,
    device_binding: DeviceBinding,
}

impl SessionCoordinator {
    pub fn new(users: UserDirectory, hasher: Arc<dyn PasswordHasher>, tokens: TokenIssuer) -> Self {
        Self {
            users,
            hasher,
            tokens,
            device_binding: DeviceBinding::default(),
        }
    }

    pub fn with_device_binding(mut self, binding: DeviceBinding) -> Self {
        self.device_binding = binding;
        self
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Lookup used on credential paths: a failed read is logged and treated
    /// as an unknown user.
    async fn lookup_lenient(&self, key: &str) -> Option<User> {
        match self.users.find_by_id_or_email(key).await {
            Ok(user) => user,
            Err(e) => {
                error!(key = %key, error = %e, "User lookup failed");
                None
            }
        }
    }

    /// Create a password account
    pub async fn register(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let result = self.register_inner(email, password).await;
        record_session_event(SessionEvent::Register, result.is_ok());
        result
    }

    async fn register_inner(&self, email: &str, password: &str) -> Result<User, DomainError> {
        validate_email(email).map_err(|e| DomainError::validation(e.to_string()))?;

        if self.lookup_lenient(email).await.is_some() {
            return Err(DomainError::conflict(format!(
                "User with email '{}' already exists",
                email
            )));
        }

        let password_hash = self.hasher.hash(password)?;
        let patch = UserPatch::new(email)
            .with_password_hash(password_hash)
            .with_provider(AuthProvider::Local)
            .insert_only();

        let user = self.users.upsert(&patch).await?;
        info!(user_id = %user.id(), "User registered");

        Ok(user)
    }

    /// Password sign-in for one device
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        user_agent: &str,
        remember_me: bool,
    ) -> Result<Tokens, DomainError> {
        let result = self.login_inner(email, password, user_agent, remember_me).await;
        record_session_event(SessionEvent::Login, result.is_ok());
        result
    }

    async fn login_inner(
        &self,
        email: &str,
        password: &str,
        user_agent: &str,
        remember_me: bool,
    ) -> Result<Tokens, DomainError> {
        let user = self
            .lookup_lenient(email)
            .await
            .ok_or_else(|| DomainError::unauthorized(INVALID_CREDENTIALS))?;

        let verified = user
            .password_hash()
            .is_some_and(|hash| self.hasher.verify(password, hash));

        if !verified {
            debug!(user_id = %user.id(), "Password verification failed");
            return Err(DomainError::unauthorized(INVALID_CREDENTIALS));
        }

        if user.is_blocked() {
            warn!(user_id = %user.id(), "Blocked user attempted to log in");
            return Err(DomainError::unauthorized("Account is blocked"));
        }

        let tokens = self.tokens.issue_tokens(&user, user_agent, remember_me).await?;
        info!(user_id = %user.id(), "User logged in");

        Ok(tokens)
    }

    /// Trade a refresh token for a fresh pair. The presented token is
    /// consumed whether or not the refresh succeeds.
    pub async fn refresh(
        &self,
        presented: &str,
        user_agent: &str,
        remember_me: bool,
    ) -> Result<Tokens, DomainError> {
        let result = self.refresh_inner(presented, user_agent, remember_me).await;
        record_session_event(SessionEvent::Refresh, result.is_ok());
        result
    }

    async fn refresh_inner(
        &self,
        presented: &str,
        user_agent: &str,
        remember_me: bool,
    ) -> Result<Tokens, DomainError> {
        if presented.is_empty() {
            return Err(DomainError::unauthorized("Refresh token missing"));
        }

        let consumed = self.tokens.consume_refresh_token(presented).await?;

        if consumed.is_expired() {
            return Err(DomainError::unauthorized("Refresh token expired"));
        }

        if self.device_binding == DeviceBinding::Strict && consumed.user_agent() != user_agent {
            warn!(user_id = %consumed.user_id(), "Refresh token presented from another device");
            return Err(DomainError::unauthorized(
                "Refresh token was issued to another device",
            ));
        }

        let user = self
            .lookup_lenient(&consumed.user_id().to_string())
            .await
            .ok_or_else(|| DomainError::unauthorized("Account no longer exists"))?;

        if user.is_blocked() {
            return Err(DomainError::unauthorized("Account is blocked"));
        }

        self.tokens.issue_tokens(&user, user_agent, remember_me).await
    }

    /// Revoke the presented refresh token. An empty value is a no-op.
    pub async fn logout(&self, presented: &str) -> Result<(), DomainError> {
        if presented.is_empty() {
            return Ok(());
        }

        let result = self.tokens.revoke(presented).await;
        record_session_event(SessionEvent::Logout, result.is_ok());
        result
    }

    /// Sign in with an identity asserted by an external provider. Unknown
    /// emails get a password-less account; known ones are linked to the
    /// provider.
    pub async fn federated_login(
        &self,
        identity: &FederatedIdentity,
        provider: AuthProvider,
        user_agent: &str,
    ) -> Result<Tokens, DomainError> {
        let result = self.federated_login_inner(identity, provider, user_agent).await;
        record_session_event(SessionEvent::FederatedLogin, result.is_ok());
        result
    }

    async fn federated_login_inner(
        &self,
        identity: &FederatedIdentity,
        provider: AuthProvider,
        user_agent: &str,
    ) -> Result<Tokens, DomainError> {
        validate_email(&identity.email).map_err(|e| DomainError::validation(e.to_string()))?;

        // Creating and linking are the same patch: the insert path leaves
        // the password hash empty, the update path keeps any existing one.
        let patch = UserPatch::new(&identity.email).with_provider(provider);
        let user = self.users.upsert(&patch).await?;

        if user.is_blocked() {
            warn!(user_id = %user.id(), provider = %provider, "Blocked user attempted federated login");
            return Err(DomainError::unauthorized("Account is blocked"));
        }

        let tokens = self.tokens.issue_tokens(&user, user_agent, false).await?;
        info!(user_id = %user.id(), provider = %provider, "Federated login");

        Ok(tokens)
    }

    /// Complete an authorization-code flow and sign the user in
    pub async fn login_with_provider(
        &self,
        provider: &dyn IdentityProvider,
        code: &str,
        user_agent: &str,
    ) -> Result<Tokens, DomainError> {
        let identity = match provider.exchange_code(code).await {
            Ok(identity) => identity,
            Err(e) => {
                record_session_event(SessionEvent::FederatedLogin, false);
                return Err(e);
            }
        };

        self.federated_login(&identity, provider.kind(), user_agent)
            .await
    }

    /// Delete an account and every refresh token it holds
    pub async fn delete_account(
        &self,
        id: &UserId,
        principal: &AccessClaims,
    ) -> Result<UserId, DomainError> {
        let deleted = self.users.delete(id, principal).await?;
        let revoked = self.tokens.revoke_all_for_user(&deleted).await?;

        info!(user_id = %deleted, revoked, "Account deleted");

        Ok(deleted)
    }

    /// Apply a profile update on behalf of `principal`. Touching another
    /// account, roles or the blocked flag takes the admin role.
    pub async fn update_profile(
        &self,
        principal: &AccessClaims,
        update: ProfileUpdate,
    ) -> Result<User, DomainError> {
        let target = update.email.as_deref().unwrap_or(&principal.email);
        let privileged =
            target != principal.email || update.roles.is_some() || update.is_blocked.is_some();

        if privileged && !principal.is_admin() {
            return Err(DomainError::forbidden(
                "Only administrators can change roles, block users or edit other accounts",
            ));
        }

        validate_email(target).map_err(|e| DomainError::validation(e.to_string()))?;

        let mut patch = UserPatch::new(target);

        if let Some(password) = &update.password {
            patch = patch.with_password_hash(self.hasher.hash(password)?);
        }

        if let Some(roles) = update.roles {
            validate_roles(&roles).map_err(|e| DomainError::validation(e.to_string()))?;
            patch = patch.with_roles(roles);
        }

        if let Some(blocked) = update.is_blocked {
            patch = patch.with_blocked(blocked);
        }

        let user = self.users.upsert(&patch).await?;
        info!(user_id = %user.id(), by = %principal.id, "Profile updated");

        Ok(user)
    }

    /// Resolve a bare access token to its principal. The account must still
    /// exist and must not be blocked.
    pub async fn authenticate(&self, access_token: &str) -> Result<AccessClaims, DomainError> {
        let claims = self.tokens.validate_access_token(access_token)?;

        let user = self
            .lookup_lenient(&claims.id.to_string())
            .await
            .ok_or_else(|| DomainError::unauthorized("Account no longer exists"))?;

        if user.is_blocked() {
            return Err(DomainError::unauthorized("Account is blocked"));
        }

        Ok(claims)
    }
}
