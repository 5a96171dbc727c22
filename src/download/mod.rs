//! Download stage: landing page resolution, payload fetch and verification.
//!
//! Each catalog record walks the [`ItemState`] machine independently:
//!
//! ```text
//! Pending -> Resolving -> Fetching -> Verifying -> Verified
//!                |            |           |
//!                v            v           +-> Retrying -> Verifying
//!        FailedResolution FailedFetch     +-> FailedIntegrity
//! ```
//!
//! Only `Verified` items leave the stage, as [`FetchedUnit`]s.

mod error;
mod record;
mod retry;
mod stage;

pub use error::DownloadError;
pub use record::{FetchedUnit, ItemState, ResolvedRecord};
pub use retry::{DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy};
pub use stage::DownloadStage;
