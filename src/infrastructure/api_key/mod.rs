//! API Key infrastructure implementations
//!
//! Key generation, the in-memory and PostgreSQL stores, and the lifecycle
//! service built on top of them.

mod generator;
mod postgres;
mod repository;
mod service;

pub use generator::ApiKeyGenerator;
pub use postgres::{PostgresApiKeyStore, PostgresConfig};
pub use repository::{InMemoryApiKeyStore, DEFAULT_KEY_VALIDITY_DAYS};
pub use service::{ApiKeyService, ProvisionError, Provisioned};
