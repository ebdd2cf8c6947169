//! Request signature verification
//!
//! Callers sign the raw request body with HMAC-SHA256 using a secret shared
//! out of band and send the hex digest in [`SIGNATURE_HEADER`].

mod mac;

pub use mac::{generate_mac, validate_mac, SharedSecret, SignatureVerifier};

/// Header carrying the hex encoded HMAC of the request body
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Response message for any signature mismatch
pub const FAILED_AUTHENTICATION_MSG: &str = "failed authentication";
