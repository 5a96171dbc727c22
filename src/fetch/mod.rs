//! Rate-limited HTTP fetching.
//!
//! This module provides the transport every pipeline stage shares:
//!
//! - [`HttpClient`] - pooled reqwest client with timeouts and status checking
//! - [`Fetcher`] - admission limiter plus typed `fetch_bytes` / `fetch_text` /
//!   `fetch_json` operations
//! - [`FetchError`] - uniform error reporting (`url` plus status or cause)
//!
//! Retries are never performed here. Whether a failed or corrupted fetch is
//! repeated is decided by the caller (see [`crate::download::RetryPolicy`]).

mod client;
mod constants;
mod error;
mod fetcher;

pub use client::HttpClient;
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_CONCURRENCY, MAX_CONCURRENCY, MIN_CONCURRENCY, READ_TIMEOUT_SECS,
};
pub use error::FetchError;
pub use fetcher::Fetcher;
