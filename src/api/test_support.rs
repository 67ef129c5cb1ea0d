//! Router fixtures shared by handler tests

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use chrono::Duration;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::api::{AppState, create_router};
use crate::domain::cache::Cache;
use crate::domain::user::{Role, UserPatch};
use crate::infrastructure::cache::InMemoryCache;
use crate::infrastructure::session::SessionCoordinator;
use crate::infrastructure::token::{
    InMemoryRefreshTokenRepository, JwtConfig, JwtService, TokenIssuer,
};
use crate::infrastructure::user::{Argon2Hasher, InMemoryUserRepository, UserDirectory};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub fn test_state() -> AppState {
    test_state_with_cache(Arc::new(InMemoryCache::new()))
}

pub fn test_state_with_cache(cache: Arc<dyn Cache>) -> AppState {
    let jwt = Arc::new(JwtService::new(JwtConfig::new(
        "router-test-secret",
        Duration::minutes(5),
    )));
    let directory = UserDirectory::new(
        Arc::new(InMemoryUserRepository::new()),
        cache,
        std::time::Duration::from_secs(300),
    );
    let hasher = Arc::new(Argon2Hasher::with_work_factor(1024, 1, 1).unwrap());
    let issuer = TokenIssuer::new(jwt, Arc::new(InMemoryRefreshTokenRepository::new()));

    AppState::new(SessionCoordinator::new(directory, hasher, issuer))
}

pub fn test_app() -> TestApp {
    let state = test_state();
    TestApp {
        router: create_router(state.clone()),
        state,
    }
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Value of the `refreshtoken` cookie set by a response, if any
pub fn refresh_cookie_value(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix("refreshtoken="))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
}

/// Register `email` and log in; returns the bearer header value and the
/// refresh token
pub async fn register_and_login(router: &Router, email: &str, password: &str) -> (String, String) {
    let register = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": email, "password": password, "passwordRepeat": password}).to_string(),
        ))
        .unwrap();
    router.clone().oneshot(register).await.unwrap();

    login(router, email, password).await
}

pub async fn login(router: &Router, email: &str, password: &str) -> (String, String) {
    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "UA1")
        .body(Body::from(
            json!({"email": email, "password": password}).to_string(),
        ))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let refresh = refresh_cookie_value(&response).unwrap();
    let body = read_json(response).await;
    let bearer = body["access_token"].as_str().unwrap().to_string();

    (bearer, refresh)
}

/// Grant the admin role to an existing account
pub async fn promote(state: &AppState, email: &str) {
    state
        .sessions
        .users()
        .upsert(&UserPatch::new(email).with_roles([Role::User, Role::Admin]))
        .await
        .unwrap();
}
