//! Response body shared by every provisioning endpoint

use serde::{Deserialize, Serialize};

use crate::domain::ApiKey;

/// `{"message": ..., "apiKeys": [...]}`, with absent fields omitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvisionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "apiKeys", default, skip_serializing_if = "Option::is_none")]
    pub api_keys: Option<Vec<ApiKey>>,
}

impl ProvisionResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            api_keys: None,
        }
    }

    pub fn keys(keys: Vec<ApiKey>) -> Self {
        Self {
            message: None,
            api_keys: Some(keys),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
