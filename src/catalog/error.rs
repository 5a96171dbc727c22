//! Error types for catalog loading.

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors that abort a run before any record is processed.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The index could not be retrieved.
    #[error("failed to fetch catalog index: {0}")]
    Fetch(#[source] FetchError),

    /// The index was retrieved but is not an array of catalog entries.
    #[error("catalog index at {url} is malformed: {source}")]
    Malformed {
        /// The index URL.
        url: String,
        /// The decode error (names the missing or mistyped field).
        #[source]
        source: serde_json::Error,
    },
}

impl From<FetchError> for CatalogError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Decode { url, source } => Self::Malformed { url, source },
            other => Self::Fetch(other),
        }
    }
}
