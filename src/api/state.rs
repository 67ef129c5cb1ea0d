//! Application state shared by every handler

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::postgres::PgPool;

use crate::domain::identity::IdentityProvider;
use crate::domain::user::AuthProvider;
use crate::infrastructure::session::SessionCoordinator;

/// Attributes of the `refreshtoken` cookie that depend on deployment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CookiePolicy {
    /// Set `Secure`; only in production
    pub secure: bool,
}

/// Application state, cloned into each request
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionCoordinator,
    pub cookies: CookiePolicy,
    identity_providers: Arc<HashMap<AuthProvider, Arc<dyn IdentityProvider>>>,
    database: Option<PgPool>,
}

impl AppState {
    pub fn new(sessions: SessionCoordinator) -> Self {
        Self {
            sessions,
            cookies: CookiePolicy::default(),
            identity_providers: Arc::new(HashMap::new()),
            database: None,
        }
    }

    pub fn with_cookie_policy(mut self, cookies: CookiePolicy) -> Self {
        self.cookies = cookies;
        self
    }

    /// Register a federated sign-in provider under its own kind
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        Arc::make_mut(&mut self.identity_providers).insert(provider.kind(), provider);
        self
    }

    /// Pool pinged by the readiness check
    pub fn with_database(mut self, pool: PgPool) -> Self {
        self.database = Some(pool);
        self
    }

    pub fn identity_provider(&self, kind: AuthProvider) -> Option<Arc<dyn IdentityProvider>> {
        self.identity_providers.get(&kind).cloned()
    }

    pub fn database(&self) -> Option<&PgPool> {
        self.database.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<&str> = self.identity_providers.keys().map(|k| k.as_str()).collect();
        providers.sort_unstable();

        f.debug_struct("AppState")
            .field("sessions", &self.sessions)
            .field("cookies", &self.cookies)
            .field("identity_providers", &providers)
            .field("database", &self.database.is_some())
            .finish()
    }
}
