//! Error types for the fetch module.
//!
//! Every variant carries the URL that failed so per-item failures can be
//! logged with full context by whichever stage made the request.

use thiserror::Error;

/// Errors that can occur while fetching a resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provided URL is malformed or uses an unsupported scheme.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, reset, TLS).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body could not be read to completion.
    #[error("failed reading response body from {url}: {source}")]
    Body {
        /// The URL whose body failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The admission limiter was closed while the request waited for a permit.
    #[error("admission limiter closed before fetching {url}")]
    LimiterClosed {
        /// The URL that never got a permit.
        url: String,
    },

    /// The response body is not the expected structured shape.
    #[error("failed decoding JSON from {url}: {source}")]
    Decode {
        /// The URL whose body failed to decode.
        url: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a body read error.
    pub fn body(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Body {
            url: url.into(),
            source,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Returns the URL the failed request targeted.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl { url }
            | Self::Timeout { url }
            | Self::Network { url, .. }
            | Self::HttpStatus { url, .. }
            | Self::Body { url, .. }
            | Self::LimiterClosed { url }
            | Self::Decode { url, .. } => url,
        }
    }

    /// Returns the HTTP status for status failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// No `From<reqwest::Error>`: every variant needs the URL, which the source
// error does not reliably carry. Use the constructors above.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_http_status_display() {
        let error = FetchError::http_status("https://example.com/report.pdf", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/report.pdf"),
            "Expected URL in: {msg}"
        );
        assert_eq!(error.status(), Some(404));
    }

    #[test]
    fn test_fetch_error_invalid_url_display() {
        let error = FetchError::invalid_url("not-a-url");
        let msg = error.to_string();
        assert!(msg.contains("invalid URL"), "Expected 'invalid URL' in: {msg}");
        assert_eq!(error.url(), "not-a-url");
        assert_eq!(error.status(), None);
    }

    #[test]
    fn test_fetch_error_timeout_display() {
        let error = FetchError::timeout("https://example.com/slow");
        assert!(error.to_string().contains("timeout"));
        assert_eq!(error.url(), "https://example.com/slow");
    }

    #[test]
    fn test_fetch_error_decode_keeps_url() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error = FetchError::decode("https://example.com/index.json", source);
        assert!(error.to_string().contains("decoding JSON"));
        assert_eq!(error.url(), "https://example.com/index.json");
    }
}
