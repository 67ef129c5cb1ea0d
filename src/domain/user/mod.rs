//! User domain
//!
//! Account records keyed by email, the partial-update patch used for
//! upserts, validation helpers and the repository trait.

mod entity;
mod patch;
mod repository;
mod validation;

pub use entity::{AuthProvider, Role, User, UserId, default_roles};
pub use patch::{OnConflict, UserPatch};
pub use repository::UserRepository;
pub use validation::{UserValidationError, validate_email, validate_roles};

#[cfg(test)]
pub use repository::mock::MockUserRepository;
