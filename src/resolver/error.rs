//! Error types for landing page resolution.
//!
//! Every variant is a per-item failure: the record is dropped and counted,
//! the run continues.

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors that can occur while turning a landing page into a download URL.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The landing page itself could not be fetched.
    #[error("failed to fetch landing page: {0}")]
    Fetch(#[source] FetchError),

    /// The page has no script element to read the item blob from.
    #[error("no script element found on landing page {url}")]
    ScriptNotFound {
        /// The landing page URL.
        url: String,
    },

    /// The embedded blob could not be parsed.
    #[error("malformed item blob on landing page {url}: {reason}")]
    MalformedBlob {
        /// The landing page URL.
        url: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The blob parsed but lacks a field needed to build the URL.
    #[error("landing page {url} is missing '{field}'")]
    MissingField {
        /// The landing page URL.
        url: String,
        /// The missing field name.
        field: &'static str,
    },

    /// Any other failure reported by a custom resolver.
    #[error("resolution failed for {url}: {reason}")]
    Failed {
        /// The landing page URL.
        url: String,
        /// Why resolution failed.
        reason: String,
    },
}

impl ResolveError {
    /// Creates a `MalformedBlob` error.
    pub fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedBlob {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `MissingField` error.
    pub fn missing_field(url: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            url: url.into(),
            field,
        }
    }

    /// Creates a generic `Failed` error.
    pub fn failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message_names_field() {
        let err = ResolveError::missing_field("https://app.box.com/s/x", "itemID");
        let msg = err.to_string();
        assert!(msg.contains("itemID"), "{msg}");
        assert!(msg.contains("https://app.box.com/s/x"), "{msg}");
    }

    #[test]
    fn test_fetch_wraps_status() {
        let err = ResolveError::Fetch(FetchError::http_status("https://app.box.com/s/x", 404));
        assert!(err.to_string().contains("404"));
    }
}
