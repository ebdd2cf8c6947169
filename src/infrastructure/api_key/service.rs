//! API Key lifecycle service
//!
//! Drives retrieval and provisioning of team keys against an
//! [`ApiKeyStore`], applying the [`KeyState`] rules.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::api_key::{ApiKey, ApiKeyStore, Decision, KeySource, KeyState, KEY_SIZE};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

use super::generator::ApiKeyGenerator;

/// Failures of the lifecycle operations, one per distinct client outcome
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("no api key found for team")]
    TeamNotFound,

    #[error("no valid keys for team found")]
    NoValidKeys,

    #[error("unable to communicate with team API key backend: {0}")]
    Backend(#[source] DomainError),

    #[error("unable to generate API key: {0}")]
    KeyGeneration(#[source] DomainError),

    #[error("unable to persist API key: {0}")]
    Persistence(#[source] DomainError),
}

/// Result of a provisioning call
#[derive(Debug, Clone, PartialEq)]
pub enum Provisioned {
    /// The team already had valid keys and no rotation was asked for
    Existing(Vec<ApiKey>),
    /// A new key was minted and stored
    Issued(ApiKey),
}

/// Service for issuing, rotating and retrieving team API keys
#[derive(Clone)]
pub struct ApiKeyService {
    store: Arc<dyn ApiKeyStore>,
    generator: Arc<dyn KeySource>,
}

impl ApiKeyService {
    /// Create a new service using the OS random generator
    pub fn new(store: Arc<dyn ApiKeyStore>) -> Self {
        Self {
            store,
            generator: Arc::new(ApiKeyGenerator::new()),
        }
    }

    /// Create with a custom key source
    pub fn with_generator(mut self, generator: Arc<dyn KeySource>) -> Self {
        self.generator = generator;
        self
    }

    pub fn store(&self) -> &Arc<dyn ApiKeyStore> {
        &self.store
    }

    /// Valid keys for a team. Never mutates the store.
    pub async fn retrieve(&self, team: &TeamId) -> Result<Vec<ApiKey>, ProvisionError> {
        let keys = self.store.api_keys(team).await.map_err(|e| {
            if e.is_not_found() {
                ProvisionError::TeamNotFound
            } else {
                ProvisionError::Backend(e)
            }
        })?;

        match KeyState::classify(&keys, Utc::now()) {
            KeyState::HasValidKey(valid) => Ok(valid),
            KeyState::HasOnlyInvalidKeys => Err(ProvisionError::NoValidKeys),
            KeyState::NoKey => Err(ProvisionError::TeamNotFound),
        }
    }

    /// Issue a key for the team, or hand back its existing valid keys
    pub async fn provision(
        &self,
        team: &TeamId,
        rotate: bool,
    ) -> Result<Provisioned, ProvisionError> {
        let (state, rotate) = match self.store.api_keys(team).await {
            Ok(keys) => (KeyState::classify(&keys, Utc::now()), rotate),
            // No record means the team is provisioned from scratch, as if
            // rotation had been requested.
            Err(e) if e.is_not_found() => (KeyState::NoKey, true),
            Err(e) => return Err(ProvisionError::Backend(e)),
        };

        debug!(team = %team, state = state.as_str(), rotate, "Current team key state");

        match state.decide(rotate) {
            Decision::ReturnExisting(keys) => {
                info!(team = %team, "Not overwriting existing team key which is still valid");
                Ok(Provisioned::Existing(keys))
            }
            Decision::Mint => {
                let key = self
                    .generator
                    .generate(KEY_SIZE)
                    .map_err(ProvisionError::KeyGeneration)?;

                let stored = self
                    .store
                    .rotate_api_key(team, key)
                    .await
                    .map_err(ProvisionError::Persistence)?;

                Ok(Provisioned::Issued(stored))
            }
        }
    }
}

impl std::fmt::Debug for ApiKeyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyService").finish_non_exhaustive()
    }
}
