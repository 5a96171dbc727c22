//! Aggregate-document sinks.
//!
//! Rows are kept in memory and serialized once, on `finish`. The destination
//! file is created when the sink opens, so an unwritable path fails the run
//! before any download starts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use super::record::RECORD_FIELDS;
use super::{RecordRow, Sink, SinkError, SinkItem};

async fn create_destination(path: &Path) -> Result<(), SinkError> {
    tokio::fs::File::create(path)
        .await
        .map(drop)
        .map_err(|e| SinkError::open(path, e))
}

async fn write_destination(path: &Path, bytes: Vec<u8>) -> Result<(), SinkError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| SinkError::io(path, e))
}

/// Writes all records as one pretty-printed JSON array with sorted keys.
#[derive(Debug)]
pub struct JsonSink {
    path: PathBuf,
    rows: Vec<RecordRow>,
}

impl JsonSink {
    /// Creates (truncating) the destination file.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Open`] if the file cannot be created.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self, SinkError> {
        create_destination(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            rows: Vec::new(),
        })
    }

    /// Renders `rows` the way `finish` writes them.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Serialize`] if a row cannot be encoded.
    pub fn render(rows: &[RecordRow]) -> Result<Vec<u8>, SinkError> {
        let sorted = rows
            .iter()
            .map(|row| {
                serde_json::to_value(row)
                    .and_then(serde_json::from_value::<BTreeMap<String, Value>>)
                    .map_err(SinkError::serialize)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut bytes = serde_json::to_vec_pretty(&sorted).map_err(SinkError::serialize)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[async_trait]
impl Sink for JsonSink {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn write(&mut self, item: SinkItem) -> Result<(), SinkError> {
        self.rows.push(item.to_row());
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<usize, SinkError> {
        let bytes = Self::render(&self.rows)?;
        write_destination(&self.path, bytes).await?;
        debug!(rows = self.rows.len(), path = %self.path.display(), "json document written");
        Ok(self.rows.len())
    }
}

/// Writes all records as CSV with a fixed header row.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    rows: Vec<RecordRow>,
}

impl CsvSink {
    /// Creates (truncating) the destination file.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Open`] if the file cannot be created.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self, SinkError> {
        create_destination(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            rows: Vec::new(),
        })
    }

    /// Renders `rows` the way `finish` writes them. The header is always
    /// present, even with no rows.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Serialize`] if a row cannot be encoded.
    pub fn render(rows: &[RecordRow]) -> Result<Vec<u8>, SinkError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer
            .write_record(RECORD_FIELDS)
            .map_err(SinkError::serialize)?;
        for row in rows {
            writer.serialize(row).map_err(SinkError::serialize)?;
        }
        writer.into_inner().map_err(SinkError::serialize)
    }
}

#[async_trait]
impl Sink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn write(&mut self, item: SinkItem) -> Result<(), SinkError> {
        self.rows.push(item.to_row());
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<usize, SinkError> {
        let bytes = Self::render(&self.rows)?;
        write_destination(&self.path, bytes).await?;
        debug!(rows = self.rows.len(), path = %self.path.display(), "csv document written");
        Ok(self.rows.len())
    }
}
