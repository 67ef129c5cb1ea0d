//! Authentication endpoints
//!
//! Password registration and login, refresh token rotation through the
//! `refreshtoken` cookie, logout, and federated sign-in.

mod cookies;
mod federation;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;

use crate::api::middleware::UserAgent;
use crate::api::state::AppState;
use crate::api::types::{
    AccessTokenResponse, ApiError, Json, LoginDto, RefreshQuery, RegisterDto, UserResponse,
    ValidatedJson,
};
use crate::domain::token::Tokens;

pub use cookies::{OAUTH_STATE_COOKIE, REFRESH_TOKEN_COOKIE};
use cookies::{cleared_refresh_cookie, refresh_cookie};

/// Create the authentication router
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/refresh-tokens", get(refresh))
        .route("/google", get(federation::google))
        .route("/google/callback", get(federation::google_callback))
        .route("/yandex", get(federation::yandex))
        .route("/yandex/callback", get(federation::yandex_callback))
}

/// Set the refresh cookie and return the access token with 201
fn token_response(state: &AppState, jar: CookieJar, tokens: Tokens) -> Response {
    let jar = jar.add(refresh_cookie(&tokens.refresh_token, state.cookies));

    (
        StatusCode::CREATED,
        jar,
        Json(AccessTokenResponse {
            access_token: tokens.access_token,
        }),
    )
        .into_response()
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterDto>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.sessions.register(&dto.email, &dto.password).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    UserAgent(user_agent): UserAgent,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<LoginDto>,
) -> Result<Response, ApiError> {
    let tokens = state
        .sessions
        .login(&dto.email, &dto.password, &user_agent, dto.remember_me)
        .await?;

    Ok(token_response(&state, jar, tokens))
}

/// GET /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let presented = match jar.get(REFRESH_TOKEN_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
        _ => return Ok(StatusCode::OK.into_response()),
    };

    state.sessions.logout(&presented).await?;

    let jar = jar.add(cleared_refresh_cookie(state.cookies));
    Ok((jar, StatusCode::OK).into_response())
}

/// GET /auth/refresh-tokens?remember_me=
pub async fn refresh(
    State(state): State<AppState>,
    UserAgent(user_agent): UserAgent,
    jar: CookieJar,
    Query(query): Query<RefreshQuery>,
) -> Result<Response, ApiError> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Refresh token missing"))?;

    let tokens = state
        .sessions
        .refresh(&presented, &user_agent, query.remember_me)
        .await?;

    Ok(token_response(&state, jar, tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{
        TestApp, read_json, refresh_cookie_value, register_and_login, test_app,
    };
    use crate::domain::identity::{FederatedIdentity, MockIdentityProvider};
    use crate::domain::user::AuthProvider;
    use axum::body::Body;
    use axum::http::{Request, header};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, "UA1")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(header::USER_AGENT, "UA1")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_returns_public_view() {
        let TestApp { router, .. } = test_app();

        let response = router
            .oneshot(post_json(
                "/auth/register",
                json!({"email": "alice@x.com", "password": "secret1", "passwordRepeat": "secret1"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["email"], "alice@x.com");
        assert_eq!(body["roles"], json!(["USER"]));
        assert!(body.get("password_hash").is_none());
        assert!(body.get("provider").is_none());
    }

    #[tokio::test]
    async fn test_register_twice_is_conflict() {
        let TestApp { router, .. } = test_app();
        let body =
            json!({"email": "alice@x.com", "password": "secret1", "passwordRepeat": "secret1"});

        router
            .clone()
            .oneshot(post_json("/auth/register", body.clone()))
            .await
            .unwrap();
        let response = router
            .oneshot(post_json("/auth/register", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = read_json(response).await;
        assert_eq!(body["error"]["type"], "conflict_error");
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let TestApp { router, .. } = test_app();

        let response = router
            .oneshot(post_json(
                "/auth/register",
                json!({"email": "alice@x.com", "password": "secret1", "passwordRepeat": "secret2"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_returns_bearer() {
        let TestApp { router, .. } = test_app();
        router
            .clone()
            .oneshot(post_json(
                "/auth/register",
                json!({"email": "alice@x.com", "password": "secret1", "passwordRepeat": "secret1"}),
            ))
            .await
            .unwrap();

        let response = router
            .oneshot(post_json(
                "/auth/login",
                json!({"email": "alice@x.com", "password": "secret1"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(set_cookie.starts_with("refreshtoken="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Path=/"));
        assert!(!set_cookie.contains("Secure"));

        let body = read_json(response).await;
        assert!(body["access_token"].as_str().unwrap().starts_with("Bearer "));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let TestApp { router, .. } = test_app();
        register_and_login(&router, "alice@x.com", "secret1").await;

        let response = router
            .oneshot(post_json(
                "/auth/login",
                json!({"email": "alice@x.com", "password": "wrong-pass"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_rotates_cookie_and_replay_fails() {
        let TestApp { router, .. } = test_app();
        let (_, first) = register_and_login(&router, "alice@x.com", "secret1").await;

        let response = router
            .clone()
            .oneshot(get_with_cookie(
                "/auth/refresh-tokens",
                &format!("refreshtoken={}", first),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let second = refresh_cookie_value(&response).unwrap();
        assert_ne!(first, second);

        let replay = router
            .oneshot(get_with_cookie(
                "/auth/refresh-tokens",
                &format!("refreshtoken={}", first),
            ))
            .await
            .unwrap();
        assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    }

    fn cookie_lifetime(response: &Response) -> chrono::Duration {
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        let cookie = axum_extra::extract::cookie::Cookie::parse(set_cookie.to_string()).unwrap();
        let expires = cookie.expires_datetime().unwrap();

        chrono::Duration::seconds(expires.unix_timestamp() - chrono::Utc::now().timestamp())
    }

    #[tokio::test]
    async fn test_refresh_remember_me_sets_cookie_expiry() {
        let TestApp { router, .. } = test_app();
        let (_, first) = register_and_login(&router, "alice@x.com", "secret1").await;

        let remembered = router
            .clone()
            .oneshot(get_with_cookie(
                "/auth/refresh-tokens?remember_me=true",
                &format!("refreshtoken={}", first),
            ))
            .await
            .unwrap();
        assert_eq!(remembered.status(), StatusCode::CREATED);
        let lifetime = cookie_lifetime(&remembered);
        assert!(lifetime >= chrono::Duration::days(27));
        assert!(lifetime <= chrono::Duration::days(32));

        let second = refresh_cookie_value(&remembered).unwrap();
        let session_only = router
            .oneshot(get_with_cookie(
                "/auth/refresh-tokens?remember_me=false",
                &format!("refreshtoken={}", second),
            ))
            .await
            .unwrap();
        assert_eq!(session_only.status(), StatusCode::CREATED);
        let lifetime = cookie_lifetime(&session_only);
        assert!(lifetime > chrono::Duration::hours(11));
        assert!(lifetime <= chrono::Duration::hours(12));
    }

    #[tokio::test]
    async fn test_refresh_without_cookie() {
        let TestApp { router, .. } = test_app();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/auth/refresh-tokens")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie_and_revokes() {
        let TestApp { router, .. } = test_app();
        let (_, token) = register_and_login(&router, "alice@x.com", "secret1").await;
        let cookie = format!("refreshtoken={}", token);

        let response = router
            .clone()
            .oneshot(get_with_cookie("/auth/logout", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(refresh_cookie_value(&response).as_deref(), Some(""));

        let refresh = router
            .oneshot(get_with_cookie("/auth/refresh-tokens", &cookie))
            .await
            .unwrap();
        assert_eq!(refresh.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_without_cookie_is_ok() {
        let TestApp { router, .. } = test_app();

        let response = router
            .oneshot(Request::builder().uri("/auth/logout").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_not_found() {
        let TestApp { router, .. } = test_app();

        let response = router
            .oneshot(Request::builder().uri("/auth/google").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    fn google_mock() -> MockIdentityProvider {
        let mut provider = MockIdentityProvider::new();
        provider.expect_kind().return_const(AuthProvider::Google);
        provider
            .expect_authorization_url()
            .returning(|state| format!("https://accounts.example/authorize?state={}", state));
        provider
            .expect_exchange_code()
            .returning(|_| Ok(FederatedIdentity::new("bob@gmail.com")));
        provider
    }

    #[tokio::test]
    async fn test_federated_redirect_and_callback() {
        let TestApp { state, .. } = test_app();
        let state = state.with_identity_provider(Arc::new(google_mock()));
        let router = crate::api::create_router(state);

        let redirect = router
            .clone()
            .oneshot(Request::builder().uri("/auth/google").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);

        let location = redirect.headers()[header::LOCATION].to_str().unwrap();
        let oauth_state = location.split("state=").nth(1).unwrap().to_string();
        let state_cookie = redirect.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(state_cookie.starts_with("oauth_state="));

        let callback = router
            .oneshot(get_with_cookie(
                &format!("/auth/google/callback?code=abc&state={}", oauth_state),
                &format!("oauth_state={}", oauth_state),
            ))
            .await
            .unwrap();

        assert_eq!(callback.status(), StatusCode::CREATED);
        assert!(refresh_cookie_value(&callback).is_some());
        let body = read_json(callback).await;
        assert!(body["access_token"].as_str().unwrap().starts_with("Bearer "));
    }

    #[tokio::test]
    async fn test_federated_callback_rejects_state_mismatch() {
        let TestApp { state, .. } = test_app();
        let state = state.with_identity_provider(Arc::new(google_mock()));
        let router = crate::api::create_router(state);

        let response = router
            .oneshot(get_with_cookie(
                "/auth/google/callback?code=abc&state=forged",
                "oauth_state=genuine",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
