use chrono::Duration;
use serde::Deserialize;

use crate::domain::provision::DEFAULT_MAX_TIME_SKEW_SECS;
use crate::domain::DomainError;
use crate::infrastructure::api_key::{PostgresConfig, DEFAULT_KEY_VALIDITY_DAYS};
use crate::infrastructure::signature::SharedSecret;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub provision: ProvisionConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest request body accepted by the provisioning endpoints
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Upper bound for `provision.max_time_skew_secs` (one day)
pub const MAX_TIME_SKEW_SECS: i64 = 24 * 60 * 60;

/// Upper bound for `provision.key_validity_days` (one hundred years)
pub const MAX_KEY_VALIDITY_DAYS: i64 = 100 * 365;

/// Settings for request authentication and key issuance
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Hex encoded secret shared with callers
    pub secret_key: String,
    pub max_time_skew_secs: i64,
    pub key_validity_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; keys are kept in memory when unset
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_bytes: 1024 * 1024,
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

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            max_time_skew_secs: DEFAULT_MAX_TIME_SKEW_SECS,
            key_validity_days: DEFAULT_KEY_VALIDITY_DAYS,
        }
    }
}

impl std::fmt::Debug for ProvisionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionConfig")
            .field("secret_key", &"[REDACTED]")
            .field("max_time_skew_secs", &self.max_time_skew_secs)
            .field("key_validity_days", &self.key_validity_days)
            .finish()
    }
}

impl ProvisionConfig {
    pub fn shared_secret(&self) -> Result<SharedSecret, DomainError> {
        SharedSecret::from_hex(&self.secret_key)
    }

    /// Allowed request clock skew, within `0..=MAX_TIME_SKEW_SECS`
    pub fn max_time_skew(&self) -> Result<Duration, DomainError> {
        if !(0..=MAX_TIME_SKEW_SECS).contains(&self.max_time_skew_secs) {
            return Err(DomainError::configuration(format!(
                "provision.max_time_skew_secs must be between 0 and {}, got {}",
                MAX_TIME_SKEW_SECS, self.max_time_skew_secs
            )));
        }

        Ok(Duration::seconds(self.max_time_skew_secs))
    }

    /// Lifetime of newly issued keys, within `1..=MAX_KEY_VALIDITY_DAYS`
    pub fn key_validity(&self) -> Result<Duration, DomainError> {
        if !(1..=MAX_KEY_VALIDITY_DAYS).contains(&self.key_validity_days) {
            return Err(DomainError::configuration(format!(
                "provision.key_validity_days must be between 1 and {}, got {}",
                MAX_KEY_VALIDITY_DAYS, self.key_validity_days
            )));
        }

        Ok(Duration::days(self.key_validity_days))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connect_timeout_secs: 30,
        }
    }
}

impl DatabaseConfig {
    /// Postgres settings, if a database is configured
    pub fn postgres(&self) -> Option<PostgresConfig> {
        self.url.as_ref().map(|url| {
            PostgresConfig::new(url)
                .with_max_connections(self.max_connections)
                .with_connect_timeout(self.connect_timeout_secs)
        })
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
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
