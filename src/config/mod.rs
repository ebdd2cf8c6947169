//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, DatabaseConfig, LogFormat, LoggingConfig, ProvisionConfig, ServerConfig,
    MAX_KEY_VALIDITY_DAYS, MAX_TIME_SKEW_SECS,
};
