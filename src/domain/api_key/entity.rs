//! API key records and the per-team key set

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// Number of random bytes in a freshly minted API key
pub const KEY_SIZE: usize = 32;

/// Raw secret bytes of an API key
///
/// Serialized as a lowercase hex string. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial(Vec<u8>);

impl KeyMaterial {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode key material from its hex transport form
    pub fn from_hex(encoded: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(encoded).map(Self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyMaterial([REDACTED; {} bytes])", self.0.len())
    }
}

impl Serialize for KeyMaterial {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for KeyMaterial {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_hex(&encoded).map_err(serde::de::Error::custom)
    }
}

/// A single API key on record for a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    /// The secret itself
    key: KeyMaterial,
    /// Owning team
    team: TeamId,
    /// When the key was minted
    created: DateTime<Utc>,
    /// The key stops being valid at this instant
    expires: DateTime<Utc>,
}

impl ApiKey {
    pub fn new(
        key: KeyMaterial,
        team: TeamId,
        created: DateTime<Utc>,
        expires: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            team,
            created,
            expires,
        }
    }

    /// Mint a record created at `now` and valid for `validity`
    ///
    /// Refuses a lifetime that is not positive or that runs past the
    /// representable date range, so an issued key is always valid at
    /// creation.
    pub fn issue(
        key: KeyMaterial,
        team: TeamId,
        now: DateTime<Utc>,
        validity: Duration,
    ) -> Result<Self, DomainError> {
        if validity <= Duration::zero() {
            return Err(DomainError::configuration(format!(
                "key validity must be positive, got {}",
                validity
            )));
        }

        let expires = now.checked_add_signed(validity).ok_or_else(|| {
            DomainError::configuration(format!("key validity {} overflows expiry date", validity))
        })?;

        Ok(Self::new(key, team, now, expires))
    }

    pub fn key(&self) -> &KeyMaterial {
        &self.key
    }

    pub fn team(&self) -> &TeamId {
        &self.team
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    /// Check if the key is usable at the given instant
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires > now
    }

    /// Invalidate the key as of `at`, unless it already expired earlier
    pub fn expire_at(&mut self, at: DateTime<Utc>) {
        if self.expires > at {
            self.expires = at;
        }
    }
}

/// Every key on record for one team, valid or not
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeySet {
    keys: Vec<ApiKey>,
}

impl KeySet {
    pub fn new(keys: Vec<ApiKey>) -> Self {
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Owned copies of the keys still valid at `now`
    pub fn valid_keys_at(&self, now: DateTime<Utc>) -> Vec<ApiKey> {
        self.keys
            .iter()
            .filter(|k| k.is_valid_at(now))
            .cloned()
            .collect()
    }
}
