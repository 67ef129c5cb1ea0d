//! Federated sign-in: consent redirect and authorization-code callback

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use tracing::{debug, warn};

use super::cookies::{
    OAUTH_STATE_COOKIE, cleared_oauth_state_cookie, oauth_state_cookie, refresh_cookie,
};
use crate::api::middleware::UserAgent;
use crate::api::state::AppState;
use crate::api::types::{AccessTokenResponse, ApiError, Json, ProviderCallbackQuery};
use crate::domain::identity::IdentityProvider;
use crate::domain::user::AuthProvider;

fn new_oauth_state() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn configured(
    state: &AppState,
    kind: AuthProvider,
) -> Result<std::sync::Arc<dyn IdentityProvider>, ApiError> {
    state
        .identity_provider(kind)
        .ok_or_else(|| ApiError::not_found(format!("Sign-in with {} is not configured", kind)))
}

async fn redirect(state: AppState, jar: CookieJar, kind: AuthProvider) -> Result<Response, ApiError> {
    let provider = configured(&state, kind)?;
    let oauth_state = new_oauth_state();

    debug!(provider = %kind, "Redirecting to provider consent screen");

    let jar = jar.add(oauth_state_cookie(&oauth_state, state.cookies));
    Ok((jar, Redirect::to(&provider.authorization_url(&oauth_state))).into_response())
}

async fn callback(
    state: AppState,
    jar: CookieJar,
    user_agent: String,
    query: ProviderCallbackQuery,
    kind: AuthProvider,
) -> Result<Response, ApiError> {
    let provider = configured(&state, kind)?;

    let expected = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(cleared_oauth_state_cookie());

    if let Some(error) = query.error {
        warn!(provider = %kind, error = %error, "Provider denied sign-in");
        return Err(ApiError::unauthorized(format!("{} sign-in was denied", kind)));
    }

    match (expected.as_deref(), query.state.as_deref()) {
        (Some(expected), Some(presented)) if !expected.is_empty() && expected == presented => {}
        _ => {
            warn!(provider = %kind, "OAuth state mismatch");
            return Err(ApiError::unauthorized("OAuth state mismatch"));
        }
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing authorization code"))?;

    let tokens = state
        .sessions
        .login_with_provider(provider.as_ref(), &code, &user_agent)
        .await?;

    let jar = jar.add(refresh_cookie(&tokens.refresh_token, state.cookies));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AccessTokenResponse {
            access_token: tokens.access_token,
        }),
    )
        .into_response())
}

/// GET /auth/google
pub async fn google(State(state): State<AppState>, jar: CookieJar) -> Result<Response, ApiError> {
    redirect(state, jar, AuthProvider::Google).await
}

/// GET /auth/google/callback
pub async fn google_callback(
    State(state): State<AppState>,
    UserAgent(user_agent): UserAgent,
    jar: CookieJar,
    Query(query): Query<ProviderCallbackQuery>,
) -> Result<Response, ApiError> {
    callback(state, jar, user_agent, query, AuthProvider::Google).await
}

/// GET /auth/yandex
pub async fn yandex(State(state): State<AppState>, jar: CookieJar) -> Result<Response, ApiError> {
    redirect(state, jar, AuthProvider::Yandex).await
}

/// GET /auth/yandex/callback
pub async fn yandex_callback(
    State(state): State<AppState>,
    UserAgent(user_agent): UserAgent,
    jar: CookieJar,
    Query(query): Query<ProviderCallbackQuery>,
) -> Result<Response, ApiError> {
    callback(state, jar, user_agent, query, AuthProvider::Yandex).await
}
