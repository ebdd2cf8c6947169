//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::provision::ProvisionResponse;
use crate::infrastructure::api_key::ProvisionError;
use crate::infrastructure::signature::FAILED_AUTHENTICATION_MSG;

/// API error with status code
///
/// Always rendered as a JSON object with a single `message` field.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Signature mismatch. The message is fixed.
    pub fn failed_authentication() -> Self {
        Self::new(StatusCode::FORBIDDEN, FAILED_AUTHENTICATION_MSG)
    }

    /// Not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Upstream key store failure
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ProvisionResponse::message(self.message))).into_response()
    }
}

impl From<&ProvisionError> for ApiError {
    fn from(err: &ProvisionError) -> Self {
        match err {
            ProvisionError::TeamNotFound => Self::not_found("no api key found for team"),
            ProvisionError::NoValidKeys => Self::not_found("no valid keys for team found"),
            ProvisionError::Backend(_) => {
                Self::bad_gateway("unable to communicate with team API key backend")
            }
            ProvisionError::KeyGeneration(_) => Self::internal("unable to generate API key"),
            ProvisionError::Persistence(_) => Self::bad_gateway("unable to persist API key"),
        }
    }
}

impl From<ProvisionError> for ApiError {
    fn from(err: ProvisionError) -> Self {
        Self::from(&err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_provision_error_mapping() {
        let cases = [
            (ProvisionError::TeamNotFound, StatusCode::NOT_FOUND),
            (ProvisionError::NoValidKeys, StatusCode::NOT_FOUND),
            (
                ProvisionError::Backend(DomainError::storage("down")),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ProvisionError::KeyGeneration(DomainError::internal("no entropy")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ProvisionError::Persistence(DomainError::storage("down")),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_not_found_messages_differ() {
        let missing = ApiError::from(ProvisionError::TeamNotFound);
        let stale = ApiError::from(ProvisionError::NoValidKeys);

        assert_ne!(missing.message, stale.message);
    }

    #[test]
    fn test_backend_detail_not_exposed() {
        let err = ApiError::from(ProvisionError::Backend(DomainError::storage(
            "password authentication failed for user keys",
        )));

        assert!(!err.message.contains("password"));
    }

    #[test]
    fn test_failed_authentication() {
        let err = ApiError::failed_authentication();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "failed authentication");
    }

    #[tokio::test]
    async fn test_error_renders_json_message() {
        let response = ApiError::bad_request("invalid request: no team specified").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"message": "invalid request: no team specified"}));
    }
}
