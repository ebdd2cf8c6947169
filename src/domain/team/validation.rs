//! Team validation

use thiserror::Error;

/// Errors that can occur during team validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TeamValidationError {
    #[error("no team specified")]
    EmptyId,
}

/// Validate a team ID
///
/// Team identifiers are opaque to this service; the only requirement is
/// that one was given.
pub fn validate_team_id(id: &str) -> Result<(), TeamValidationError> {
    if id.is_empty() {
        return Err(TeamValidationError::EmptyId);
    }

    Ok(())
}
