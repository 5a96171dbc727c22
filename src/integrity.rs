//! Payload integrity verification.
//!
//! The catalog publishes a SHA-1 digest per report. A payload is accepted
//! only when its digest matches byte-for-byte; the hex comparison ignores
//! case and surrounding whitespace in the published value.

use sha1::{Digest, Sha1};
use thiserror::Error;

/// Digest mismatch that survived the retry.
#[derive(Debug, Clone, Error)]
#[error(
    "integrity check failed for record {sequence_id} ({url}): expected sha1 {expected}, got {actual}"
)]
pub struct IntegrityError {
    /// Catalog position of the failing record.
    pub sequence_id: u64,
    /// The download URL that produced the corrupted payload.
    pub url: String,
    /// Digest published by the catalog.
    pub expected: String,
    /// Digest of the last payload received.
    pub actual: String,
}

/// Returns the lowercase hex SHA-1 digest of `payload`.
#[must_use]
pub fn sha1_hex(payload: &[u8]) -> String {
    hex::encode(Sha1::digest(payload))
}

/// Returns true iff the SHA-1 digest of `payload` equals `expected_hex`.
#[must_use]
pub fn verify(payload: &[u8], expected_hex: &str) -> bool {
    sha1_hex(payload).eq_ignore_ascii_case(expected_hex.trim())
}
