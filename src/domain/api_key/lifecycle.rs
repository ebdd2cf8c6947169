//! Per-team key lifecycle state machine
//!
//! A team is in one of three states with respect to its keys. Provisioning
//! either leaves a team with valid keys untouched or mints a new key; every
//! transition ends in [`KeyState::HasValidKey`].

use chrono::{DateTime, Utc};

use super::entity::{ApiKey, KeySet};

/// What the store knows about a team's keys
#[derive(Debug, Clone, PartialEq)]
pub enum KeyState {
    /// No record exists for the team
    NoKey,
    /// At least one key is still valid
    HasValidKey(Vec<ApiKey>),
    /// A record exists but every key on it has expired
    HasOnlyInvalidKeys,
}

/// Outcome of a provisioning decision
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Hand back the keys the team already has
    ReturnExisting(Vec<ApiKey>),
    /// Mint a fresh key and persist it through rotation
    Mint,
}

impl KeyState {
    /// Classify a key set looked up at `now`
    pub fn classify(keys: &KeySet, now: DateTime<Utc>) -> Self {
        if keys.is_empty() {
            return Self::NoKey;
        }

        let valid = keys.valid_keys_at(now);

        if valid.is_empty() {
            Self::HasOnlyInvalidKeys
        } else {
            Self::HasValidKey(valid)
        }
    }

    /// Decide whether a provisioning request needs a new key
    pub fn decide(self, rotate: bool) -> Decision {
        match self {
            Self::HasValidKey(keys) if !rotate => Decision::ReturnExisting(keys),
            Self::HasValidKey(_) | Self::NoKey | Self::HasOnlyInvalidKeys => Decision::Mint,
        }
    }

    /// Short name for log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoKey => "no_key",
            Self::HasValidKey(_) => "has_valid_key",
            Self::HasOnlyInvalidKeys => "has_only_invalid_keys",
        }
    }
}
