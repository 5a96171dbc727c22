//! Constants for the fetch module (timeouts, admission limits).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large reports).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default number of concurrent in-flight requests per limiter.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;
