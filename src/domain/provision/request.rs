//! Provisioning request payload

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::timestamp::{Timestamp, TimestampError, TimestampValidator};
use crate::domain::team::{TeamId, TeamValidationError};

/// Body of both the provision and the api key retrieval calls
///
/// Missing fields deserialize to their zero values so that they are reported
/// by [`ProvisionRequest::validate`] instead of failing body decoding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProvisionRequest {
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub rotate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

/// A request whose fields passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub team: TeamId,
    pub rotate: bool,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RequestValidationError {
    #[error(transparent)]
    Team(#[from] TeamValidationError),

    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}

impl ProvisionRequest {
    pub fn new(team: impl Into<String>, rotate: bool, timestamp: impl Into<Timestamp>) -> Self {
        Self {
            team: team.into(),
            rotate,
            timestamp: Some(timestamp.into()),
        }
    }

    /// Check field contents: team first, then timestamp freshness
    pub fn validate(
        &self,
        timestamps: &TimestampValidator,
    ) -> Result<ValidatedRequest, RequestValidationError> {
        let team = TeamId::new(self.team.as_str())?;
        timestamps.validate(self.timestamp.as_ref())?;

        Ok(ValidatedRequest {
            team,
            rotate: self.rotate,
        })
    }
}
