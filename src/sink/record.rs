//! Items handed to sinks and the flat row shape they persist.

use serde::Serialize;

use crate::download::{FetchedUnit, ResolvedRecord};
use crate::extract::{EnrichedRecord, ExtractedFields};

/// Column order shared by the relational and CSV sinks.
pub const RECORD_FIELDS: [&str; 12] = [
    "unique_id",
    "filename",
    "title",
    "source",
    "splash_url",
    "sha1",
    "date",
    "file_url",
    "fulltext",
    "creation_date",
    "creator_tool",
    "creator_title",
];

/// What the persistence stage receives: a verified payload, or an enriched
/// record when the extraction stage ran.
#[derive(Debug)]
pub enum SinkItem {
    Payload(FetchedUnit),
    Enriched(EnrichedRecord),
}

impl SinkItem {
    /// Returns the resolved record carried by either shape.
    #[must_use]
    pub fn record(&self) -> &ResolvedRecord {
        match self {
            Self::Payload(unit) => &unit.record,
            Self::Enriched(enriched) => &enriched.record,
        }
    }

    /// Returns a short label for the shape, used in logs and errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Payload(_) => "payload",
            Self::Enriched(_) => "enriched",
        }
    }

    /// Flattens the item into a row. Payload items get empty derived fields.
    #[must_use]
    pub fn to_row(&self) -> RecordRow {
        match self {
            Self::Payload(unit) => RecordRow::new(&unit.record, None),
            Self::Enriched(enriched) => RecordRow::new(&enriched.record, Some(&enriched.fields)),
        }
    }
}

impl From<FetchedUnit> for SinkItem {
    fn from(unit: FetchedUnit) -> Self {
        Self::Payload(unit)
    }
}

impl From<EnrichedRecord> for SinkItem {
    fn from(enriched: EnrichedRecord) -> Self {
        Self::Enriched(enriched)
    }
}

/// One persisted record, under the output field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRow {
    pub unique_id: u64,
    pub filename: String,
    pub title: String,
    pub source: String,
    pub splash_url: String,
    pub sha1: String,
    pub date: String,
    pub file_url: String,
    pub fulltext: Option<String>,
    pub creation_date: Option<String>,
    pub creator_tool: Option<String>,
    pub creator_title: Option<String>,
}

impl RecordRow {
    /// Builds a row from a resolved record and optional derived fields.
    #[must_use]
    pub fn new(record: &ResolvedRecord, fields: Option<&ExtractedFields>) -> Self {
        let catalog = &record.catalog;
        Self {
            unique_id: catalog.sequence_id,
            filename: catalog.filename.clone(),
            title: catalog.title.clone(),
            source: catalog.source.clone(),
            splash_url: catalog.landing_url.clone(),
            sha1: catalog.expected_digest.clone(),
            date: catalog.published_date.clone(),
            file_url: record.download_url.clone(),
            fulltext: fields.map(|f| f.text.clone()),
            creation_date: fields.and_then(|f| f.timestamp.clone()),
            creator_tool: fields.and_then(|f| f.tool_name.clone()),
            creator_title: fields.and_then(|f| f.tool_title.clone()),
        }
    }
}
