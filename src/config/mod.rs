//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, FederationConfig, LogFormat, LoggingConfig, PasswordHashConfig,
    ServerConfig,
};
