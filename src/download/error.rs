//! Per-item failures of the download stage.
//!
//! None of these abort the run. The item is logged, counted and dropped.

use thiserror::Error;

use super::ItemState;
use crate::fetch::FetchError;
use crate::integrity::IntegrityError;
use crate::resolver::ResolveError;

/// Why a catalog record never produced a verified payload.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The landing page could not be fetched or scraped.
    #[error("resolution failed: {0}")]
    Resolution(#[from] ResolveError),

    /// The payload could not be fetched.
    #[error("payload fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The payload digest did not match after the retry.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

impl DownloadError {
    /// Returns the terminal state this failure puts the item in.
    #[must_use]
    pub fn terminal_state(&self) -> ItemState {
        match self {
            Self::Resolution(_) => ItemState::FailedResolution,
            Self::Fetch(_) => ItemState::FailedFetch,
            Self::Integrity(_) => ItemState::FailedIntegrity,
        }
    }
}
