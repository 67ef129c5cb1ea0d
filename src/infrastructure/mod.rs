//! Infrastructure layer - External service implementations

pub mod cache;
pub mod identity;
pub mod logging;
pub mod observability;
pub mod session;
pub mod storage;
pub mod token;
pub mod user;
