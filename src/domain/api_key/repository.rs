//! API key store and key source traits

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::{ApiKey, KeyMaterial, KeySet};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// Persistence contract for team API keys
///
/// Implementations must make `rotate_api_key` atomic: a concurrent
/// `api_keys` call sees either the state before or after the rotation,
/// never a mix. Rotations of the same team serialize.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// All keys on record for a team.
    ///
    /// Returns `DomainError::NotFound` when the team has no record at all.
    async fn api_keys(&self, team: &TeamId) -> Result<KeySet, DomainError>;

    /// Create the team's record or rotate it, persisting `key` as the
    /// team's new valid key. Returns the stored record.
    async fn rotate_api_key(&self, team: &TeamId, key: KeyMaterial) -> Result<ApiKey, DomainError>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Source of fresh key material
#[cfg_attr(test, automock)]
pub trait KeySource: Send + Sync {
    /// Produce exactly `size` bytes of cryptographically secure randomness
    fn generate(&self, size: usize) -> Result<KeyMaterial, DomainError>;
}
