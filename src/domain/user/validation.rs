//! User validation utilities

use std::collections::BTreeSet;

use thiserror::Error;

use super::entity::Role;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("Invalid user ID: '{0}'")]
    InvalidId(String),

    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Email exceeds maximum length of {0} characters")]
    EmailTooLong(usize),

    #[error("Email must contain a single '@' with text on both sides")]
    MalformedEmail,

    #[error("A user must hold at least one role")]
    EmptyRoles,

    #[error("Unknown role: '{0}'")]
    UnknownRole(String),

    #[error("Unknown identity provider: '{0}'")]
    UnknownProvider(String),
}

const MAX_EMAIL_LENGTH: usize = 254;

/// Validate an email address
///
/// Rules:
/// - Cannot be empty
/// - Maximum 254 characters
/// - Exactly one '@', with non-empty local and domain parts
/// - No whitespace
pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    if email.is_empty() {
        return Err(UserValidationError::EmptyEmail);
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(UserValidationError::EmailTooLong(MAX_EMAIL_LENGTH));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(UserValidationError::MalformedEmail);
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(UserValidationError::MalformedEmail),
    }
}

/// Validate a role set; every user keeps at least one role
pub fn validate_roles(roles: &BTreeSet<Role>) -> Result<(), UserValidationError> {
    if roles.is_empty() {
        return Err(UserValidationError::EmptyRoles);
    }

    Ok(())
}
