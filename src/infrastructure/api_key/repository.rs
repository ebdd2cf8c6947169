//! In-memory API key store implementation

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::api_key::{ApiKey, ApiKeyStore, KeyMaterial, KeySet};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// Default lifetime of a freshly minted key
pub const DEFAULT_KEY_VALIDITY_DAYS: i64 = 5 * 365;

/// In-memory implementation of [`ApiKeyStore`]
///
/// Rotation expires every key of the team that is still valid and appends
/// the new one, all under a single write lock. Data is lost when the process
/// terminates.
#[derive(Debug)]
pub struct InMemoryApiKeyStore {
    keys: RwLock<HashMap<TeamId, Vec<ApiKey>>>,
    key_validity: Duration,
}

impl InMemoryApiKeyStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
            key_validity: Duration::days(DEFAULT_KEY_VALIDITY_DAYS),
        }
    }

    /// Set the lifetime given to newly rotated keys
    pub fn with_key_validity(mut self, validity: Duration) -> Self {
        self.key_validity = validity;
        self
    }

    /// Create a store pre-populated with key records
    pub fn with_keys(keys: Vec<ApiKey>) -> Self {
        let mut by_team: HashMap<TeamId, Vec<ApiKey>> = HashMap::new();

        for key in keys {
            by_team.entry(key.team().clone()).or_default().push(key);
        }

        Self {
            keys: RwLock::new(by_team),
            ..Self::new()
        }
    }
}

impl Default for InMemoryApiKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiKeyStore for InMemoryApiKeyStore {
    async fn api_keys(&self, team: &TeamId) -> Result<KeySet, DomainError> {
        let keys = self.keys.read().await;

        match keys.get(team) {
            Some(team_keys) if !team_keys.is_empty() => Ok(KeySet::new(team_keys.clone())),
            _ => Err(DomainError::not_found(format!(
                "no api keys for team '{}'",
                team
            ))),
        }
    }

    async fn rotate_api_key(&self, team: &TeamId, key: KeyMaterial) -> Result<ApiKey, DomainError> {
        let mut keys = self.keys.write().await;
        let now = Utc::now();

        let api_key = ApiKey::issue(key, team.clone(), now, self.key_validity)?;
        let team_keys = keys.entry(team.clone()).or_default();

        for existing in team_keys.iter_mut() {
            existing.expire_at(now);
        }

        team_keys.push(api_key.clone());

        debug!(team = %team, total_keys = team_keys.len(), "Rotated team api key");

        Ok(api_key)
    }
}
