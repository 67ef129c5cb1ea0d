//! Request and response bodies for the auth and user routes

use std::borrow::Cow;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::token::AccessClaims;
use crate::domain::user::{Role, User};
use crate::infrastructure::session::ProfileUpdate;

/// Public view of a user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub updated_at: DateTime<Utc>,
    pub roles: BTreeSet<Role>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().to_string(),
            updated_at: user.updated_at(),
            roles: user.roles().clone(),
        }
    }
}

/// The authenticated principal, as carried in the access token
#[derive(Debug, Clone, Serialize)]
pub struct PrincipalResponse {
    pub id: String,
    pub email: String,
    pub roles: BTreeSet<Role>,
    pub iat: i64,
    pub exp: i64,
}

impl From<AccessClaims> for PrincipalResponse {
    fn from(claims: AccessClaims) -> Self {
        Self {
            id: claims.id.to_string(),
            email: claims.email,
            roles: claims.roles,
            iat: claims.iat,
            exp: claims.exp,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "passwords_match"))]
pub struct RegisterDto {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
    #[serde(rename = "passwordRepeat", alias = "password_repeat")]
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password_repeat: String,
}

fn passwords_match(dto: &RegisterDto) -> Result<(), ValidationError> {
    if dto.password == dto.password_repeat {
        return Ok(());
    }

    Err(ValidationError::new("password_mismatch")
        .with_message(Cow::Borrowed("Passwords not matching")))
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginDto {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// `?remember_me=` on the refresh route
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshQuery {
    #[serde(default)]
    pub remember_me: bool,
}

/// Body of `PUT /user`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserDto {
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: Option<String>,
    pub roles: Option<BTreeSet<Role>>,
    pub is_blocked: Option<bool>,
}

impl From<UpdateUserDto> for ProfileUpdate {
    fn from(dto: UpdateUserDto) -> Self {
        Self {
            email: dto.email,
            password: dto.password,
            roles: dto.roles,
            is_blocked: dto.is_blocked,
        }
    }
}

/// Body returned by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// `?code=&state=` on provider callbacks
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}
