//! Team API key provisioner
//!
//! Issues, rotates and hands out per-team API keys over an internal HTTP
//! API. Every request is authenticated with an HMAC-SHA256 signature over
//! the raw request body, computed with a secret shared with the caller.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::{info, warn};

use api::state::AppState;
use domain::{ApiKeyStore, TimestampValidator};
use infrastructure::api_key::{InMemoryApiKeyStore, PostgresApiKeyStore};

/// Build the application state from configuration
///
/// Uses PostgreSQL when `database.url` is set and an in-memory store
/// otherwise. Fails when no usable provisioning secret is configured.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let secret = config.provision.shared_secret()?;
    let key_validity = config.provision.key_validity()?;
    let max_time_skew = config.provision.max_time_skew()?;

    let store: Arc<dyn ApiKeyStore> = match config.database.postgres() {
        Some(pg) => {
            let store = PostgresApiKeyStore::connect(&pg)
                .await?
                .with_key_validity(key_validity);
            Arc::new(store)
        }
        None => {
            warn!("No database configured, API keys are kept in memory only");
            Arc::new(InMemoryApiKeyStore::new().with_key_validity(key_validity))
        }
    };

    let timestamps = TimestampValidator::new(max_time_skew);

    info!(
        max_time_skew_secs = timestamps.max_skew().num_seconds(),
        key_validity_days = key_validity.num_days(),
        "Provisioning configured"
    );

    Ok(AppState::new(store, secret).with_timestamps(timestamps))
}
