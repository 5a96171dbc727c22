//! Persistence sinks and the persistence stage.
//!
//! Four interchangeable destinations, chosen by [`OutputFormat`]:
//!
//! | Format | Sink | Input | Durability |
//! |---|---|---|---|
//! | `sqlite` | [`SqliteSink`] | any | committed per row |
//! | `pdf` | [`FileTreeSink`] | payloads only | one file per row |
//! | `json` | [`JsonSink`] | any | whole document on finish |
//! | `csv` | [`CsvSink`] | any | whole document on finish |

mod aggregate;
mod error;
mod file_tree;
mod record;
mod sqlite;
mod stage;

pub use aggregate::{CsvSink, JsonSink};
pub use error::SinkError;
pub use file_tree::{FileTreeSink, PAYLOAD_EXTENSION};
pub use record::{RECORD_FIELDS, RecordRow, SinkItem};
pub use sqlite::{SqliteSink, TABLE_NAME};
pub use stage::PersistenceStage;

use std::path::Path;

use async_trait::async_trait;

use crate::config::OutputFormat;

/// A persistence destination.
#[async_trait]
pub trait Sink: Send {
    /// Returns the sink's name, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Stores one item.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the item could not be stored. The caller
    /// logs it, counts it and carries on with the next item.
    async fn write(&mut self, item: SinkItem) -> Result<(), SinkError>;

    /// Flushes pending state and returns the number of items durably written.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if buffered items could not be persisted.
    async fn finish(self: Box<Self>) -> Result<usize, SinkError>;
}

/// Opens the sink for `format` at `path`.
///
/// # Errors
///
/// Returns [`SinkError::Open`] if the destination cannot be prepared.
pub async fn open_sink(format: OutputFormat, path: &Path) -> Result<Box<dyn Sink>, SinkError> {
    let sink: Box<dyn Sink> = match format {
        OutputFormat::Sqlite => Box::new(SqliteSink::open(path).await?),
        OutputFormat::Pdf => Box::new(FileTreeSink::open(path).await?),
        OutputFormat::Json => Box::new(JsonSink::open(path).await?),
        OutputFormat::Csv => Box::new(CsvSink::open(path).await?),
    };
    Ok(sink)
}
