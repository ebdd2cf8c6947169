//! Raw body extractor that returns errors as JSON

use axum::extract::{FromRequest, Request};
use bytes::Bytes;
use tracing::error;

use super::error::ApiError;

/// The request body exactly as received
///
/// Signatures are computed over these bytes, so handlers must never
/// re-serialize a parsed payload for verification. Read failures (including
/// bodies over the configured limit) are rejected with a JSON 400.
#[derive(Debug, Clone)]
pub struct RawBody(pub Bytes);

impl RawBody {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl<S> FromRequest<S> for RawBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Bytes::from_request(req, state).await {
            Ok(bytes) => Ok(RawBody(bytes)),
            Err(rejection) => {
                let err = ApiError::bad_request(format!(
                    "unable to read request body: {}",
                    rejection.body_text()
                ));
                error!("{}", err.message);
                Err(err)
            }
        }
    }
}
