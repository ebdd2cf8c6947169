//! Request timestamps and the freshness check

use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default allowed distance between a request timestamp and the server clock
pub const DEFAULT_MAX_TIME_SKEW_SECS: i64 = 30;

/// Timestamp as sent by the caller: Unix seconds or an RFC 3339 string
///
/// Parsing of the string form is deferred to [`TimestampValidator`] so that a
/// malformed timestamp is reported as a field validation error rather than a
/// body decoding error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Unix(i64),
    Text(String),
}

impl Timestamp {
    /// Resolve to an instant
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, TimestampError> {
        match self {
            Self::Unix(0) => Err(TimestampError::Missing),
            Self::Unix(secs) => {
                DateTime::from_timestamp(*secs, 0).ok_or(TimestampError::OutOfRange(*secs))
            }
            Self::Text(text) if text.is_empty() => Err(TimestampError::Missing),
            Self::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| TimestampError::Malformed(format!("'{}': {}", text, e))),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Unix(dt.timestamp())
    }
}

/// Reasons a timestamp is refused
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimestampError {
    #[error("missing timestamp")]
    Missing,

    #[error("timestamp {0} is out of range")]
    OutOfRange(i64),

    #[error("malformed timestamp {0}")]
    Malformed(String),

    #[error("request is not within allowed timeframe")]
    OutsideWindow,
}

/// Source of the current time
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Accepts timestamps that parse and lie within `max_skew` of the clock
#[derive(Debug, Clone)]
pub struct TimestampValidator {
    max_skew: Duration,
    clock: Arc<dyn Clock>,
}

impl TimestampValidator {
    pub fn new(max_skew: Duration) -> Self {
        Self {
            max_skew,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a different clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn max_skew(&self) -> Duration {
        self.max_skew
    }

    pub fn validate(&self, timestamp: Option<&Timestamp>) -> Result<(), TimestampError> {
        let at = timestamp.ok_or(TimestampError::Missing)?.to_datetime()?;
        let skew = (self.clock.now() - at).abs();

        if skew > self.max_skew {
            return Err(TimestampError::OutsideWindow);
        }

        Ok(())
    }
}

impl Default for TimestampValidator {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_MAX_TIME_SKEW_SECS))
    }
}
