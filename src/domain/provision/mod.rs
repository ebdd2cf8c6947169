//! Provisioning requests
//!
//! The payload callers sign and send, plus the freshness rule applied to its
//! timestamp.

mod request;
mod timestamp;

pub use request::{ProvisionRequest, RequestValidationError, ValidatedRequest};
pub use timestamp::{
    Clock, FixedClock, SystemClock, Timestamp, TimestampError, TimestampValidator,
    DEFAULT_MAX_TIME_SKEW_SECS,
};
