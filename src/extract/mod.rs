//! Optional text and metadata extraction.
//!
//! Extraction is a capability that may be absent. [`Extraction`] records at
//! configuration time whether an [`Extractor`] is wired in; the pipeline
//! decides from that, and from the output format, whether the
//! [`ExtractionStage`] runs at all.

mod error;
mod stage;
mod tika;

pub use error::ExtractionError;
pub use stage::ExtractionStage;
pub use tika::TikaExtractor;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::download::ResolvedRecord;

/// Derived fields produced from one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedFields {
    /// Full plain text of the document.
    pub text: String,
    /// Document creation time, RFC 3339 when the source value parses.
    pub timestamp: Option<String>,
    /// Tool that produced the document.
    pub tool_name: Option<String>,
    /// Title embedded in the document metadata.
    pub tool_title: Option<String>,
}

/// A resolved record with its derived fields. The payload is gone by now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedRecord {
    pub record: ResolvedRecord,
    pub fields: ExtractedFields,
}

/// Turns a payload into [`ExtractedFields`].
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns the extractor's name, used in logs.
    fn name(&self) -> &str;

    /// Extracts text and metadata from `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] if the payload cannot be processed.
    async fn extract(&self, payload: Vec<u8>) -> Result<ExtractedFields, ExtractionError>;
}

/// Whether an extractor is available for this run.
#[derive(Clone, Default)]
pub enum Extraction {
    /// No extractor configured; formats needing derived fields get NULLs.
    #[default]
    NotConfigured,
    /// An extractor is configured.
    Available(Arc<dyn Extractor>),
}

impl Extraction {
    /// Wraps `extractor` as an available capability.
    pub fn available(extractor: impl Extractor + 'static) -> Self {
        Self::Available(Arc::new(extractor))
    }

    /// Returns the extractor, if one is configured.
    #[must_use]
    pub fn extractor(&self) -> Option<&Arc<dyn Extractor>> {
        match self {
            Self::NotConfigured => None,
            Self::Available(extractor) => Some(extractor),
        }
    }

    /// Returns true if an extractor is configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl fmt::Debug for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => f.write_str("NotConfigured"),
            Self::Available(extractor) => f
                .debug_tuple("Available")
                .field(&extractor.name())
                .finish(),
        }
    }
}
