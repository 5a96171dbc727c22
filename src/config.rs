//! Run configuration.
//!
//! [`PipelineConfig`] is built once (by the CLI or a test), validated, and
//! handed to [`Pipeline::new`](crate::Pipeline::new). Nothing in it changes
//! during a run.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use thiserror::Error;
use url::Url;

use crate::catalog::DEFAULT_CATALOG_URL;
use crate::fetch::{
    CONNECT_TIMEOUT_SECS, DEFAULT_CONCURRENCY, MAX_CONCURRENCY, MIN_CONCURRENCY,
    READ_TIMEOUT_SECS,
};

/// Default capacity of each hand-off channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Default number of concurrent extractions.
pub const DEFAULT_EXTRACTION_CONCURRENCY: usize = 1;

/// Output destination kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum OutputFormat {
    /// SQLite database with one `aptnotes` table.
    Sqlite,
    /// Directory of payload files.
    Pdf,
    /// Single JSON document.
    Json,
    /// Single CSV document.
    Csv,
}

impl OutputFormat {
    /// Returns true if the format stores derived text and metadata.
    #[must_use]
    pub fn requires_extraction(self) -> bool {
        !matches!(self, Self::Pdf)
    }

    /// Returns the lowercase name used on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Pdf => "pdf",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors for out-of-range configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Fetch concurrency outside the allowed range.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
    },

    /// Extraction concurrency outside the allowed range.
    #[error(
        "invalid extraction concurrency {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidExtractionConcurrency {
        /// The rejected value.
        value: usize,
    },

    /// A hand-off channel cannot have zero capacity.
    #[error("channel capacity must be at least 1")]
    ZeroChannelCapacity,

    /// A timeout of zero seconds.
    #[error("{name} must be at least 1 second")]
    ZeroTimeout {
        /// Which timeout.
        name: &'static str,
    },

    /// The catalog URL is not an absolute http(s) URL.
    #[error("invalid catalog URL: {url}")]
    InvalidCatalogUrl {
        /// The rejected URL.
        url: String,
    },
}

/// Everything one run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Destination kind.
    pub output: OutputFormat,
    /// Destination file or directory.
    pub output_path: PathBuf,
    /// Maximum number of catalog records; `None` or `Some(0)` means all.
    pub limit: Option<usize>,
    /// Concurrent in-flight downloads.
    pub concurrency: usize,
    /// Index location.
    pub catalog_url: String,
    /// Capacity of each hand-off channel.
    pub channel_capacity: usize,
    /// Concurrent extractions.
    pub extraction_concurrency: usize,
    /// TCP connect timeout.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout.
    pub read_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output: OutputFormat::Sqlite,
            output_path: PathBuf::from("aptnotes.sqlite"),
            limit: None,
            concurrency: DEFAULT_CONCURRENCY,
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            extraction_concurrency: DEFAULT_EXTRACTION_CONCURRENCY,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

impl PipelineConfig {
    /// Creates a config writing `output` to `output_path`, defaults elsewhere.
    #[must_use]
    pub fn new(output: OutputFormat, output_path: impl Into<PathBuf>) -> Self {
        Self {
            output,
            output_path: output_path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn with_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = url.into();
        self
    }

    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_extraction_concurrency(mut self, concurrency: usize) -> Self {
        self.extraction_concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, connect_secs: u64, read_secs: u64) -> Self {
        self.connect_timeout_secs = connect_secs;
        self.read_timeout_secs = read_secs;
        self
    }

    /// Returns the destination path.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Checks every value against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let range = MIN_CONCURRENCY..=MAX_CONCURRENCY;
        if !range.contains(&self.concurrency) {
            return Err(ConfigError::InvalidConcurrency {
                value: self.concurrency,
            });
        }
        if !range.contains(&self.extraction_concurrency) {
            return Err(ConfigError::InvalidExtractionConcurrency {
                value: self.extraction_concurrency,
            });
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ZeroChannelCapacity);
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout {
                name: "connect timeout",
            });
        }
        if self.read_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout {
                name: "read timeout",
            });
        }
        let is_http = Url::parse(&self.catalog_url)
            .is_ok_and(|url| matches!(url.scheme(), "http" | "https"));
        if !is_http {
            return Err(ConfigError::InvalidCatalogUrl {
                url: self.catalog_url.clone(),
            });
        }
        Ok(())
    }
}
