//! Federated identity provider capability

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::user::AuthProvider;

#[cfg(test)]
use mockall::automock;

/// Profile fields a provider reports alongside the email
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileAttributes {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub picture: Option<String>,
}

/// Identity asserted by an external provider
#[derive(Debug, Clone, PartialEq)]
pub struct FederatedIdentity {
    pub email: String,
    pub attributes: ProfileAttributes,
}

impl FederatedIdentity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            attributes: ProfileAttributes::default(),
        }
    }

    pub fn with_attributes(mut self, attributes: ProfileAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// OAuth2 authorization-code provider
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Which provider tag accounts created through this provider carry
    fn kind(&self) -> AuthProvider;

    /// Consent screen URL the browser is redirected to
    fn authorization_url(&self, state: &str) -> String;

    /// Trade an authorization code for the caller's identity
    async fn exchange_code(&self, code: &str) -> Result<FederatedIdentity, DomainError>;
}
