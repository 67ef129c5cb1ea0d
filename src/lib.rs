//! PMP Auth Gateway
//!
//! Credential and session service:
//! - Email/password registration and login with Argon2id hashes
//! - Short-lived HS256 access tokens and rotating refresh tokens, one per
//!   user and device
//! - Google and Yandex sign-in
//! - In-memory or PostgreSQL storage, in-memory or Redis user cache

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::{AppState, CookiePolicy};
use infrastructure::{
    cache::CacheFactory,
    identity::{GoogleIdentityProvider, HttpClient, YandexIdentityProvider},
    session::SessionCoordinator,
    storage::StorageFactory,
    token::{JwtConfig, JwtService, TokenIssuer},
    user::{Argon2Hasher, UserDirectory},
};
use tracing::info;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Create the application state with all services initialized
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let repositories = StorageFactory::create(&config.storage).await?;
    let cache = CacheFactory::create(&config.cache).await?;

    let access_ttl = config.auth.access_token_ttl();
    let cache_ttl = Duration::from_secs(config.auth.access_token_ttl_secs);

    let hash = &config.auth.password_hash;
    let hasher = Arc::new(Argon2Hasher::with_work_factor(
        hash.memory_kib,
        hash.iterations,
        hash.parallelism,
    )?);

    let jwt = Arc::new(JwtService::new(JwtConfig::new(
        config.auth.resolve_jwt_secret()?,
        access_ttl,
    )));
    let tokens = TokenIssuer::new(jwt, repositories.refresh_tokens.clone());
    let users = UserDirectory::new(repositories.users.clone(), cache, cache_ttl);

    let sessions = SessionCoordinator::new(users, hasher, tokens)
        .with_device_binding(config.auth.device_binding);

    let mut state = AppState::new(sessions).with_cookie_policy(CookiePolicy {
        secure: config.auth.is_production(),
    });

    let federation = &config.federation;
    if federation.google.is_some() || federation.yandex.is_some() {
        let client = Arc::new(HttpClient::with_timeout(PROVIDER_TIMEOUT)?);

        if let Some(google) = &federation.google {
            info!("Google sign-in enabled");
            state = state.with_identity_provider(Arc::new(GoogleIdentityProvider::new(
                google.clone(),
                client.clone(),
            )));
        }

        if let Some(yandex) = &federation.yandex {
            info!("Yandex sign-in enabled");
            state = state.with_identity_provider(Arc::new(YandexIdentityProvider::new(
                yandex.clone(),
                client,
            )));
        }
    }

    if let Some(pool) = repositories.pool {
        state = state.with_database(pool);
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::AuthProvider;
    use crate::infrastructure::identity::OAuthClientConfig;

    #[tokio::test]
    async fn test_default_config_builds_in_memory_state() {
        let state = create_app_state(&AppConfig::default()).await.unwrap();

        assert!(state.database().is_none());
        assert!(!state.cookies.secure);
        assert!(state.identity_provider(AuthProvider::Google).is_none());
        state.sessions.users().ping_cache().await.unwrap();
    }

    #[tokio::test]
    async fn test_production_and_providers() {
        let mut config = AppConfig::default();
        config.auth.environment = "production".to_string();
        config.auth.jwt_secret = "prod-secret".to_string();
        config.auth.password_hash.memory_kib = 1024;
        config.auth.password_hash.iterations = 1;
        config.federation.google = Some(OAuthClientConfig::new(
            "gid",
            "gsecret",
            "http://localhost:3000/auth/google/callback",
        ));

        let state = create_app_state(&config).await.unwrap();

        assert!(state.cookies.secure);
        assert!(state.identity_provider(AuthProvider::Google).is_some());
        assert!(state.identity_provider(AuthProvider::Yandex).is_none());
    }

    #[tokio::test]
    async fn test_production_without_secret_is_rejected() {
        let mut config = AppConfig::default();
        config.auth.environment = "production".to_string();

        assert!(create_app_state(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_work_factor_is_rejected() {
        let mut config = AppConfig::default();
        config.auth.password_hash.memory_kib = 1;

        assert!(create_app_state(&config).await.is_err());
    }
}
