//! Google OAuth2 identity provider

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::http_client::HttpClientTrait;
use super::oauth::{OAuthClientConfig, authorization_url, optional_str, required_str};
use crate::domain::DomainError;
use crate::domain::identity::{FederatedIdentity, IdentityProvider, ProfileAttributes};
use crate::domain::user::AuthProvider;

const PROVIDER: &str = "google";
const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Google sign-in via the authorization-code flow
#[derive(Debug)]
pub struct GoogleIdentityProvider<C: HttpClientTrait> {
    config: OAuthClientConfig,
    client: Arc<C>,
}

impl<C: HttpClientTrait> GoogleIdentityProvider<C> {
    pub fn new(config: OAuthClientConfig, client: Arc<C>) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl<C: HttpClientTrait + 'static> IdentityProvider for GoogleIdentityProvider<C> {
    fn kind(&self) -> AuthProvider {
        AuthProvider::Google
    }

    fn authorization_url(&self, state: &str) -> String {
        authorization_url(
            AUTHORIZE_URL,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", "openid email profile"),
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

        let bearer = format!("Bearer {}", access_token);
        let profile = self
            .client
            .get_json(USERINFO_URL, vec![("Authorization", bearer.as_str())])
            .await?;

        let email = required_str(PROVIDER, &profile, "email")?;
        debug!(email = %email, "Google identity resolved");

        Ok(FederatedIdentity::new(email).with_attributes(ProfileAttributes {
            first_name: optional_str(&profile, "given_name"),
            last_name: optional_str(&profile, "family_name"),
            display_name: optional_str(&profile, "name"),
            picture: optional_str(&profile, "picture"),
        }))
    }
}
