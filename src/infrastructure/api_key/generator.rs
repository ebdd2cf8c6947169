//! API Key generation
//!
//! Draws key material straight from the operating system CSPRNG.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::domain::api_key::{KeyMaterial, KeySource};
use crate::domain::DomainError;

/// Generator for secure API keys
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiKeyGenerator;

impl ApiKeyGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl KeySource for ApiKeyGenerator {
    fn generate(&self, size: usize) -> Result<KeyMaterial, DomainError> {
        let mut bytes = vec![0u8; size];

        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| DomainError::internal(format!("entropy source failed: {}", e)))?;

        Ok(KeyMaterial::new(bytes))
    }
}
