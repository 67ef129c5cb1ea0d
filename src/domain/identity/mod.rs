//! Identity domain - federated sign-in capability

mod provider;

pub use provider::{FederatedIdentity, IdentityProvider, ProfileAttributes};

#[cfg(test)]
pub use provider::MockIdentityProvider;
