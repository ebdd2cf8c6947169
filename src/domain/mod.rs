//! Domain layer - key records, lifecycle rules and persistence contracts

pub mod api_key;
pub mod error;
pub mod provision;
pub mod team;

pub use api_key::{ApiKey, ApiKeyStore, KeyMaterial, KeySet, KeySource, KEY_SIZE};
pub use error::DomainError;
pub use provision::{ProvisionRequest, Timestamp, TimestampValidator};
pub use team::TeamId;
