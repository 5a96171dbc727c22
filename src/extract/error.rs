//! Error types for content extraction.

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors raised by an [`Extractor`](super::Extractor).
///
/// Always per-item: the record is logged, counted and dropped.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The extraction service could not be reached.
    #[error("extraction request failed: {0}")]
    Request(#[source] FetchError),

    /// The extraction service rejected the payload.
    #[error("extraction service at {url} returned HTTP {status}")]
    HttpStatus {
        /// The service endpoint.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The payload or the service response could not be interpreted.
    #[error("malformed extraction result: {reason}")]
    Malformed {
        /// What was wrong.
        reason: String,
    },
}

impl ExtractionError {
    /// Creates a `Malformed` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

impl From<FetchError> for ExtractionError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::HttpStatus { url, status } => Self::HttpStatus { url, status },
            other => Self::Request(other),
        }
    }
}
