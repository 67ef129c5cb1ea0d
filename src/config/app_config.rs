use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::Deserialize;

use crate::domain::DomainError;
use crate::domain::token::DeviceBinding;
use crate::infrastructure::cache::CacheConfig;
use crate::infrastructure::identity::OAuthClientConfig;
use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::storage::StorageConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub federation: FederationConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API with credentials. Empty
    /// disables CORS.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Token signing and session policy
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret. Empty means "generate one at startup".
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_access_token_ttl_secs")]
    pub access_token_ttl_secs: u64,
    /// `production` turns on the `Secure` cookie attribute
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub device_binding: DeviceBinding,
    /// Period of the expired refresh token sweep; 0 disables it
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
    #[serde(default)]
    pub password_hash: PasswordHashConfig,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[hidden]")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("environment", &self.environment)
            .field("device_binding", &self.device_binding)
            .field("purge_interval_secs", &self.purge_interval_secs)
            .field("password_hash", &self.password_hash)
            .finish()
    }
}

/// Argon2id work factor
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordHashConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

/// External identity providers; a provider without a section is disabled
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FederationConfig {
    #[serde(default)]
    pub google: Option<OAuthClientConfig>,
    #[serde(default)]
    pub yandex: Option<OAuthClientConfig>,
}

fn default_access_token_ttl_secs() -> u64 {
    300
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_purge_interval_secs() -> u64 {
    3600
}

fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_ttl_secs: default_access_token_ttl_secs(),
            environment: default_environment(),
            device_binding: DeviceBinding::default(),
            purge_interval_secs: default_purge_interval_secs(),
            password_hash: PasswordHashConfig::default(),
        }
    }
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

impl AuthConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_token_ttl_secs as i64)
    }

    /// The configured secret, or outside production a random one when none
    /// is set. A random secret invalidates every token on restart.
    pub fn resolve_jwt_secret(&self) -> Result<String, DomainError> {
        if !self.jwt_secret.is_empty() {
            return Ok(self.jwt_secret.clone());
        }

        if self.is_production() {
            return Err(DomainError::configuration(
                "auth.jwt_secret must be set in production",
            ));
        }

        tracing::warn!(
            "auth.jwt_secret is not set; using a random secret, issued tokens will not survive a restart"
        );

        let mut bytes = [0u8; 48];
        rand::thread_rng().fill_bytes(&mut bytes);
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
