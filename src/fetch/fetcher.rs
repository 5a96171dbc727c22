//! Rate-limited fetcher with typed response decoding.
//!
//! A [`Fetcher`] pairs the shared [`HttpClient`] transport with an admission
//! limiter: a counting permit pool bounding how many requests issued through
//! that fetcher (and its clones) are in flight at once. The permit is held
//! until the body has been read, so a slow body counts against the limit.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, instrument};

use super::client::HttpClient;
use super::error::FetchError;

/// Bounded-concurrency fetcher.
///
/// Clones share the same limiter. Use [`with_limit`](Self::with_limit) to get
/// an independent limiter over the same transport.
///
/// # Example
///
/// ```no_run
/// use aptnotes_core::fetch::{Fetcher, HttpClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = Fetcher::new(HttpClient::new()?, 10);
/// let page = fetcher.fetch_text("https://example.com/landing").await?;
/// println!("{} bytes of HTML", page.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: HttpClient,
    permits: Arc<Semaphore>,
    limit: usize,
}

impl Fetcher {
    /// Creates a fetcher allowing at most `limit` in-flight requests (min 1).
    #[must_use]
    pub fn new(client: HttpClient, limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            client,
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Returns a fetcher over the same transport with its own limiter.
    #[must_use]
    pub fn with_limit(&self, limit: usize) -> Self {
        Self::new(self.client.clone(), limit)
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of requests currently holding a permit.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.limit.saturating_sub(self.permits.available_permits())
    }


    /// Fetches `url` and returns the raw body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on invalid URLs, transport failures and
    /// non-success statuses. No retry is attempted.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let _permit = self.acquire(url).await?;
        let response = self.client.get(url).await?;
        let body = response.bytes().await.map_err(|e| body_error(url, e))?;
        debug!(bytes = body.len(), "fetched bytes");
        Ok(body.to_vec())
    }

    /// Fetches `url` and decodes the body as text (charset from headers).
    ///
    /// # Errors
    ///
    /// Same as [`fetch_bytes`](Self::fetch_bytes).
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let _permit = self.acquire(url).await?;
        let response = self.client.get(url).await?;
        let text = response.text().await.map_err(|e| body_error(url, e))?;
        debug!(chars = text.len(), "fetched text");
        Ok(text)
    }

    /// Fetches `url` and decodes the body as JSON into `T`.
    ///
    /// The content type is not checked; raw GitHub serves JSON as `text/plain`.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_bytes`](Self::fetch_bytes), plus [`FetchError::Decode`]
    /// when the body does not match `T`.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let body = self.fetch_bytes(url).await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::decode(url, e))
    }

    async fn acquire(&self, url: &str) -> Result<SemaphorePermit<'_>, FetchError> {
        self.permits
            .acquire()
            .await
            .map_err(|_| FetchError::LimiterClosed {
                url: url.to_string(),
            })
    }
}

fn body_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url)
    } else {
        FetchError::body(url, error)
    }
}
