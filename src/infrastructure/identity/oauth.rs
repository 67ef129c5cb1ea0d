//! OAuth2 client settings shared by the identity providers

use reqwest::Url;
use serde::Deserialize;

use crate::domain::DomainError;

/// Registered OAuth2 application credentials
#[derive(Clone, Deserialize)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl std::fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[hidden]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl OAuthClientConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Form fields of an authorization-code exchange
    pub fn code_exchange_form<'a>(&'a self, code: &'a str) -> [(&'a str, &'a str); 5] {
        [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
        ]
    }
}

/// Append query parameters to a consent screen endpoint
pub fn authorization_url(endpoint: &str, params: &[(&str, &str)]) -> String {
    match Url::parse_with_params(endpoint, params) {
        Ok(url) => url.to_string(),
        // Endpoints are compile-time constants; keep the raw form if one is
        // ever malformed.
        Err(_) => endpoint.to_string(),
    }
}

/// Read a required string field from a provider response
pub fn required_str<'a>(
    provider: &str,
    body: &'a serde_json::Value,
    field: &str,
) -> Result<&'a str, DomainError> {
    body.get(field)
        .and_then(|v| v.as_str())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::provider(provider, format!("Response is missing '{}'", field)))
}

/// Read an optional string field from a provider response
pub fn optional_str(body: &serde_json::Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(|v| v.as_str())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
