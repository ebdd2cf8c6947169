//! HMAC-SHA256 signing and verification

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::DomainError;

type HmacSha256 = Hmac<Sha256>;

/// Secret shared with callers for signing request bodies
///
/// Immutable once loaded. `Debug` never prints the secret.
#[derive(Clone)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    /// Wrap raw secret bytes; an empty secret is refused
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, DomainError> {
        let bytes = bytes.into();

        if bytes.is_empty() {
            return Err(DomainError::configuration("shared secret must not be empty"));
        }

        Ok(Self(bytes))
    }

    /// Decode a hex encoded secret as found in configuration
    pub fn from_hex(encoded: &str) -> Result<Self, DomainError> {
        let bytes = hex::decode(encoded.trim()).map_err(|e| {
            DomainError::configuration(format!("shared secret must be hex encoded: {}", e))
        })?;

        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

/// Compute the HMAC-SHA256 of `message` under `key`
pub fn generate_mac(message: &[u8], key: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Check `message_mac` against the HMAC-SHA256 of `message` under `key`
///
/// The comparison runs in constant time. Any mismatch, including a digest of
/// the wrong length, yields `false`.
pub fn validate_mac(message: &[u8], message_mac: &[u8], key: &[u8]) -> bool {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.verify_slice(message_mac).is_ok()
}

/// Authenticates raw request bodies against the configured shared secret
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    secret: SharedSecret,
}

impl SignatureVerifier {
    pub fn new(secret: SharedSecret) -> Self {
        Self { secret }
    }

    /// Verify `signature` (already hex decoded) over the untouched body bytes
    pub fn verify(&self, raw_body: &[u8], signature: &[u8]) -> bool {
        validate_mac(raw_body, signature, self.secret.as_bytes())
    }

    /// Sign a body the way a caller would
    pub fn sign(&self, raw_body: &[u8]) -> Vec<u8> {
        generate_mac(raw_body, self.secret.as_bytes())
    }
}
