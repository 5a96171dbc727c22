//! Retry policy for payload fetches.
//!
//! A payload whose digest does not match the catalog is fetched again, once.
//! Transport failures are not retried: a 404 or a refused connection is
//! reported as a fetch failure straight away.
//!
//! # Example
//!
//! ```
//! use aptnotes_core::download::{FailureType, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! assert!(matches!(
//!     policy.should_retry(FailureType::IntegrityMismatch, 1),
//!     RetryDecision::Retry { attempt: 2, .. }
//! ));
//! assert!(matches!(
//!     policy.should_retry(FailureType::IntegrityMismatch, 2),
//!     RetryDecision::DoNotRetry { .. }
//! ));
//! ```

use std::time::Duration;

use tracing::debug;

/// Default number of fetch attempts for one payload (initial plus one retry).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Classification of a failed payload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// The payload arrived but its digest did not match.
    IntegrityMismatch,
    /// The payload never arrived (network, timeout, HTTP status).
    Transport,
}

/// Decision on whether to fetch a payload again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Fetch again after `delay`.
    Retry {
        /// How long to wait before the next attempt.
        delay: Duration,
        /// The attempt number about to start (1-indexed).
        attempt: u32,
    },

    /// Give up on this item.
    DoNotRetry {
        /// Human-readable reason, used in logs.
        reason: String,
    },
}

/// Retry configuration for the download stage.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts including the initial one.
    max_attempts: u32,
    /// Pause between attempts.
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with custom settings. `max_attempts` is at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Returns the maximum number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides what to do after `attempt` (1-indexed) failed with `failure_type`.
    #[must_use]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Transport {
            return RetryDecision::DoNotRetry {
                reason: "transport failures are not retried".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        RetryDecision::Retry {
            delay: self.delay,
            attempt: attempt + 1,
        }
    }
}
