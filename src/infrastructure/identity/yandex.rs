//! Yandex ID identity provider

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::http_client::HttpClientTrait;
use super::oauth::{OAuthClientConfig, authorization_url, optional_str, required_str};
use crate::domain::DomainError;
use crate::domain::identity::{FederatedIdentity, IdentityProvider, ProfileAttributes};
use crate::domain::user::AuthProvider;

const PROVIDER: &str = "yandex";
const AUTHORIZE_URL: &str = "https://oauth.yandex.ru/authorize";
const TOKEN_URL: &str = "https://oauth.yandex.ru/token";
const USERINFO_URL: &str = "https://login.yandex.ru/info?format=json";
const AVATAR_URL: &str = "https://avatars.yandex.net/get-yapic";

/// Yandex sign-in via the authorization-code flow
#[derive(Debug)]
pub struct YandexIdentityProvider<C: HttpClientTrait> {
    config: OAuthClientConfig,
    client: Arc<C>,
}

impl<C: HttpClientTrait> YandexIdentityProvider<C> {
    pub fn new(config: OAuthClientConfig, client: Arc<C>) -> Self {
        Self { config, client }
    }
}

/// Yandex reports the primary address separately from the full list
fn primary_email(profile: &serde_json::Value) -> Result<String, DomainError> {
    if let Some(email) = optional_str(profile, "default_email") {
        return Ok(email);
    }

    profile
        .get("emails")
        .and_then(|v| v.as_array())
        .and_then(|emails| emails.iter().find_map(|e| e.as_str()))
        .map(str::to_string)
        .ok_or_else(|| DomainError::provider(PROVIDER, "Response carries no email address"))
}

fn avatar(profile: &serde_json::Value) -> Option<String> {
    let empty = profile
        .get("is_avatar_empty")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    if empty {
        return None;
    }

    optional_str(profile, "default_avatar_id")
        .map(|id| format!("{}/{}/islands-200", AVATAR_URL, id))
}

#[async_trait]
impl<C: HttpClientTrait + 'static> IdentityProvider for YandexIdentityProvider<C> {
    fn kind(&self) -> AuthProvider {
        AuthProvider::Yandex
    }

    fn authorization_url(&self, state: &str) -> String {
        authorization_url(
            AUTHORIZE_URL,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("state", state),
            ],
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<FederatedIdentity, DomainError> {
        let token = self
            .client
            .post_form(TOKEN_URL, vec![], &self.config.code_exchange_form(code))
            .await?;
        let access_token = required_str(PROVIDER, &token, "access_token")?;

        let authorization = format!("OAuth {}", access_token);
        let profile = self
            .client
            .get_json(USERINFO_URL, vec![("Authorization", authorization.as_str())])
            .await?;

        let email = primary_email(&profile)?;
        debug!(email = %email, "Yandex identity resolved");

        Ok(FederatedIdentity::new(email).with_attributes(ProfileAttributes {
            first_name: optional_str(&profile, "first_name"),
            last_name: optional_str(&profile, "last_name"),
            display_name: optional_str(&profile, "display_name"),
            picture: avatar(&profile),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::identity::http_client::mock::MockHttpClient;
    use serde_json::json;

    fn provider(client: MockHttpClient) -> YandexIdentityProvider<MockHttpClient> {
        YandexIdentityProvider::new(
            OAuthClientConfig::new("yid", "ysecret", "http://localhost:3000/api/auth/yandex/callback"),
            Arc::new(client),
        )
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let client = MockHttpClient::new()
            .with_response(TOKEN_URL, json!({"access_token": "y0_token"}))
            .with_response(
                USERINFO_URL,
                json!({
                    "id": "1000034426",
                    "default_email": "ivan@yandex.ru",
                    "emails": ["ivan@yandex.ru", "ivan@ya.ru"],
                    "display_name": "ivan",
                    "first_name": "Ivan",
                    "last_name": "Ivanov",
                    "default_avatar_id": "131652443",
                    "is_avatar_empty": false
                }),
            );
        let provider = provider(client);

        let identity = provider.exchange_code("code").await.unwrap();

        assert_eq!(identity.email, "ivan@yandex.ru");
        assert_eq!(identity.attributes.display_name.as_deref(), Some("ivan"));
        assert_eq!(
            identity.attributes.picture.as_deref(),
            Some("https://avatars.yandex.net/get-yapic/131652443/islands-200")
        );
    }

    #[tokio::test]
    async fn test_uses_oauth_authorization_scheme() {
        let client = Arc::new(
            MockHttpClient::new()
                .with_response(TOKEN_URL, json!({"access_token": "y0_token"}))
                .with_response(USERINFO_URL, json!({"emails": ["petr@ya.ru"]})),
        );
        let provider = YandexIdentityProvider::new(
            OAuthClientConfig::new("yid", "ysecret", "http://cb"),
            client.clone(),
        );

        let identity = provider.exchange_code("code").await.unwrap();

        assert_eq!(identity.email, "petr@ya.ru");
        assert!(identity.attributes.picture.is_none());
        assert_eq!(
            client.requests()[1].headers,
            vec![("Authorization".to_string(), "OAuth y0_token".to_string())]
        );
    }

    #[tokio::test]
    async fn test_no_email() {
        let client = MockHttpClient::new()
            .with_response(TOKEN_URL, json!({"access_token": "t"}))
            .with_response(USERINFO_URL, json!({"id": "1", "emails": []}));

        let result = provider(client).exchange_code("code").await;
        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }

    #[test]
    fn test_empty_avatar_is_skipped() {
        let profile = json!({"default_avatar_id": "0/0-0", "is_avatar_empty": true});
        assert!(avatar(&profile).is_none());
    }
}
