//! API layer - HTTP endpoints and middleware

pub mod auth;
pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

pub use middleware::RequireUser;
pub use router::{create_health_router, create_router, with_cors, with_metrics};
pub use state::{AppState, CookiePolicy};
