//! Catalog record types.

use serde::Deserialize;

/// One entry of the remote index, under its published field names.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCatalogEntry {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Link")]
    pub link: String,
    #[serde(rename = "SHA-1")]
    pub sha1: String,
    #[serde(rename = "Date")]
    pub date: String,
}

/// A normalized catalog entry.
///
/// `sequence_id` is the 0-based position in the published index and is
/// assigned once, before any concurrent work starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    /// Stable per-run identifier.
    pub sequence_id: u64,
    /// Report filename (without extension in the published index).
    pub filename: String,
    /// Report title.
    pub title: String,
    /// Publishing organisation.
    pub source: String,
    /// Landing page that must be scraped for the real download URL.
    pub landing_url: String,
    /// Published SHA-1 digest of the payload, hex encoded.
    pub expected_digest: String,
    /// Publication date as published.
    pub published_date: String,
}

impl CatalogRecord {
    /// Maps a raw index entry onto the canonical shape.
    #[must_use]
    pub fn from_raw(sequence_id: u64, raw: RawCatalogEntry) -> Self {
        Self {
            sequence_id,
            filename: raw.filename,
            title: raw.title,
            source: raw.source,
            landing_url: raw.link,
            expected_digest: raw.sha1,
            published_date: raw.date,
        }
    }
}
