//! API Key domain
//!
//! Key records, the per-team key set, the lifecycle state machine and the
//! persistence contract the rest of the service depends on.

mod entity;
mod lifecycle;
mod repository;

pub use entity::{ApiKey, KeyMaterial, KeySet, KEY_SIZE};
pub use lifecycle::{Decision, KeyState};
pub use repository::{ApiKeyStore, KeySource};

#[cfg(test)]
pub use repository::{MockApiKeyStore, MockKeySource};
