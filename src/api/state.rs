//! Application state for shared services

use std::sync::Arc;

use crate::domain::api_key::ApiKeyStore;
use crate::domain::TimestampValidator;
use crate::infrastructure::api_key::ApiKeyService;
use crate::infrastructure::signature::{SharedSecret, SignatureVerifier};

/// Everything a request handler needs, shared across all requests
///
/// The shared secret enters here once at construction and is never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct AppState {
    pub api_key_service: ApiKeyService,
    pub verifier: Arc<SignatureVerifier>,
    pub timestamps: TimestampValidator,
}

impl AppState {
    pub fn new(store: Arc<dyn ApiKeyStore>, secret: SharedSecret) -> Self {
        Self {
            api_key_service: ApiKeyService::new(store),
            verifier: Arc::new(SignatureVerifier::new(secret)),
            timestamps: TimestampValidator::default(),
        }
    }

    /// Replace the timestamp freshness rule
    pub fn with_timestamps(mut self, timestamps: TimestampValidator) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Replace the lifecycle service
    pub fn with_api_key_service(mut self, service: ApiKeyService) -> Self {
        self.api_key_service = service;
        self
    }
}
