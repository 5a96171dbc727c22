//! Shared HTTP transport.
//!
//! `HttpClient` owns the pooled reqwest client and turns every request outcome
//! into either a successful response or a [`FetchError`]. It performs no
//! admission control and no retries; see [`Fetcher`](super::Fetcher).

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::FetchError;
use crate::user_agent;

/// HTTP client shared by every stage of a run.
///
/// Cloning is cheap; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the TLS backend cannot be initialized.
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|e| FetchError::network("<client builder>", e))?;
        Ok(Self { client })
    }

    /// Sends a GET request and returns the response if its status is a success.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] for malformed or non-HTTP URLs
    /// - [`FetchError::Timeout`] / [`FetchError::Network`] for transport failures
    /// - [`FetchError::HttpStatus`] for any non-2xx status
    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        validate_url(url)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        check_status(url, response)
    }

    /// Sends a PUT request with a binary body, returning a successful response.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    #[instrument(level = "debug", skip(self, body), fields(bytes = body.len()))]
    pub async fn put_bytes(
        &self,
        url: &str,
        body: Vec<u8>,
        accept: &str,
    ) -> Result<Response, FetchError> {
        validate_url(url)?;
        let response = self
            .client
            .put(url)
            .header(reqwest::header::ACCEPT, accept)
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        check_status(url, response)
    }
}

fn validate_url(url: &str) -> Result<(), FetchError> {
    let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
    if matches!(parsed.scheme(), "http" | "https") {
        Ok(())
    } else {
        Err(FetchError::invalid_url(url))
    }
}

fn check_status(url: &str, response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        debug!(status = status.as_u16(), "request succeeded");
        Ok(response)
    } else {
        Err(FetchError::http_status(url, status.as_u16()))
    }
}

/// Maps a reqwest error raised while sending or reading into a [`FetchError`].
pub(super) fn transport_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url)
    } else {
        FetchError::network(url, error)
    }
}
