//! APTnotes archive core library
//!
//! Fetches the APTnotes catalog, resolves each report's Box landing page to
//! a direct download, verifies the payload against the published SHA-1,
//! optionally extracts text and metadata, and persists the result to one of
//! four sinks.
//!
//! # Architecture
//!
//! - [`config`] - Run configuration and output formats
//! - [`fetch`] - Shared HTTP transport and rate-limited fetcher
//! - [`catalog`] - Index loading and normalization
//! - [`resolver`] - Landing page to download URL resolution
//! - [`integrity`] - SHA-1 verification
//! - [`download`] - Concurrent resolve, fetch and verify stage
//! - [`extract`] - Optional text and metadata extraction
//! - [`sink`] - Persistence sinks and stage
//! - [`pipeline`] - Run supervision and accounting

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod download;
pub mod extract;
pub mod fetch;
pub mod integrity;
pub mod pipeline;
pub mod resolver;
pub mod sink;
mod user_agent;

// Re-export commonly used types
pub use catalog::{CatalogError, CatalogLoader, CatalogRecord, DEFAULT_CATALOG_URL};
pub use config::{ConfigError, OutputFormat, PipelineConfig};
pub use download::{DownloadStage, FetchedUnit, ItemState, ResolvedRecord, RetryPolicy};
pub use extract::{
    EnrichedRecord, ExtractedFields, Extraction, ExtractionError, Extractor, TikaExtractor,
};
pub use fetch::{DEFAULT_CONCURRENCY, FetchError, Fetcher, HttpClient};
pub use integrity::{IntegrityError, sha1_hex, verify};
pub use pipeline::{Pipeline, PipelineError, PipelineOutcome, PipelineStats};
pub use resolver::{BoxSharedItemResolver, LocatorResolver, ResolveError};
pub use sink::{Sink, SinkError, SinkItem, open_sink};
