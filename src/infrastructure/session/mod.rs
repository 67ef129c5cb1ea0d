//! Session orchestration

mod coordinator;

pub use coordinator::{ProfileUpdate, SessionCoordinator};
