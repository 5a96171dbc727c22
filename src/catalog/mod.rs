//! Catalog loading.
//!
//! The catalog is a single JSON array published at a well-known URL. It is
//! fetched once through a dedicated single-permit [`Fetcher`], mapped onto
//! [`CatalogRecord`]s and truncated to the configured limit before the
//! download stage fans out, so the candidate set is deterministic.

mod error;
mod record;

pub use error::CatalogError;
pub use record::{CatalogRecord, RawCatalogEntry};

use std::time::Instant;

use tracing::{debug, info, instrument};

use crate::fetch::Fetcher;

/// Public APTnotes index.
pub const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/aptnotes/data/master/APTnotes.json";

/// Fetches and normalizes the remote index.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    fetcher: Fetcher,
}

impl CatalogLoader {
    /// Creates a loader over `fetcher`'s transport with a limiter of one.
    #[must_use]
    pub fn new(fetcher: &Fetcher) -> Self {
        Self {
            fetcher: fetcher.with_limit(1),
        }
    }

    /// Loads the full index in published order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Fetch`] if the index cannot be retrieved and
    /// [`CatalogError::Malformed`] if it is not an array of complete entries.
    #[instrument(skip(self))]
    pub async fn load(&self, index_url: &str) -> Result<Vec<CatalogRecord>, CatalogError> {
        let started = Instant::now();
        let raw: Vec<RawCatalogEntry> = self.fetcher.fetch_json(index_url).await?;
        let records = normalize(raw);
        info!(available = records.len(), "catalog loaded");
        debug!(elapsed_ms = started.elapsed().as_millis(), "catalog fetch time");
        Ok(records)
    }

    /// Loads the index and applies `limit`.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub async fn load_limited(
        &self,
        index_url: &str,
        limit: Option<usize>,
    ) -> Result<Vec<CatalogRecord>, CatalogError> {
        let records = self.load(index_url).await?;
        Ok(truncate(records, limit))
    }
}

/// Assigns `sequence_id` as the 0-based position of each raw entry.
#[must_use]
pub fn normalize(raw: Vec<RawCatalogEntry>) -> Vec<CatalogRecord> {
    raw.into_iter()
        .zip(0u64..)
        .map(|(entry, id)| CatalogRecord::from_raw(id, entry))
        .collect()
}

/// Keeps the first `limit` records. `None` and `Some(0)` keep everything.
#[must_use]
pub fn truncate(mut records: Vec<CatalogRecord>, limit: Option<usize>) -> Vec<CatalogRecord> {
    if let Some(limit) = limit.filter(|&limit| limit > 0) {
        records.truncate(limit);
    }
    records
}
