//! Per-stage record types and the per-item state machine.

use std::fmt;

use crate::catalog::CatalogRecord;

/// A catalog record whose landing page has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecord {
    /// The record as loaded from the catalog.
    pub catalog: CatalogRecord,
    /// Direct payload URL discovered on the landing page.
    pub download_url: String,
}

impl ResolvedRecord {
    /// Attaches a download URL to a catalog record.
    #[must_use]
    pub fn new(catalog: CatalogRecord, download_url: impl Into<String>) -> Self {
        Self {
            catalog,
            download_url: download_url.into(),
        }
    }

    /// Returns the record's stable identifier.
    #[must_use]
    pub fn sequence_id(&self) -> u64 {
        self.catalog.sequence_id
    }
}

/// A verified payload and its record, owned by exactly one stage at a time.
#[derive(Debug)]
pub struct FetchedUnit {
    /// Payload bytes whose digest matched the catalog.
    pub payload: Vec<u8>,
    /// The resolved record the payload belongs to.
    pub record: ResolvedRecord,
}

/// Processing state of one catalog record inside the download stage.
///
/// `Verified` is the only state from which an item is handed downstream.
/// Every `Failed*` state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    Resolving,
    Fetching,
    Verifying,
    Retrying,
    Verified,
    FailedResolution,
    FailedFetch,
    FailedIntegrity,
}

impl ItemState {
    /// Returns true for states that end the item's processing.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Verified | Self::FailedResolution | Self::FailedFetch | Self::FailedIntegrity
        )
    }

    /// Returns true if moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use ItemState::{
            FailedFetch, FailedIntegrity, FailedResolution, Fetching, Pending, Resolving,
            Retrying, Verified, Verifying,
        };
        matches!(
            (self, next),
            (Pending, Resolving)
                | (Resolving, Fetching | FailedResolution)
                | (Fetching | Retrying, Verifying | FailedFetch)
                | (Verifying, Verified | Retrying | FailedIntegrity)
        )
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Resolving => "resolving",
            Self::Fetching => "fetching",
            Self::Verifying => "verifying",
            Self::Retrying => "retrying",
            Self::Verified => "verified",
            Self::FailedResolution => "failed(resolution)",
            Self::FailedFetch => "failed(fetch)",
            Self::FailedIntegrity => "failed(integrity)",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions_are_legal() {
        let path = [
            ItemState::Pending,
            ItemState::Resolving,
            ItemState::Fetching,
            ItemState::Verifying,
            ItemState::Verified,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_retry_path_transitions_are_legal() {
        assert!(ItemState::Verifying.can_transition_to(ItemState::Retrying));
        assert!(ItemState::Retrying.can_transition_to(ItemState::Verifying));
        assert!(ItemState::Verifying.can_transition_to(ItemState::FailedIntegrity));
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for terminal in [
            ItemState::Verified,
            ItemState::FailedResolution,
            ItemState::FailedFetch,
            ItemState::FailedIntegrity,
        ] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(ItemState::Fetching));
            assert!(!terminal.can_transition_to(ItemState::Verifying));
        }
    }

    #[test]
    fn test_cannot_skip_verification() {
        assert!(!ItemState::Fetching.can_transition_to(ItemState::Verified));
        assert!(!ItemState::Pending.can_transition_to(ItemState::Fetching));
    }
}
