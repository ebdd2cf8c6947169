//! Team domain module
//!
//! Teams are the tenancy unit: every API key on record belongs to exactly
//! one team.

mod entity;
mod validation;

pub use entity::TeamId;
pub use validation::{validate_team_id, TeamValidationError};
