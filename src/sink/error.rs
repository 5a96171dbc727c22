//! Error types for the persistence sinks.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`Sink`](super::Sink).
///
/// `Open` is fatal to the run. The others are per-row failures while
/// writing, except when returned from `finish`, which is fatal again.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The destination could not be opened or created.
    #[error("failed to open sink destination {path}: {source}")]
    Open {
        /// The destination path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A statement against the relational store failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A filesystem write failed.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file being written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A record could not be encoded.
    #[error("failed to serialize record: {reason}")]
    Serialize {
        /// Why encoding failed.
        reason: String,
    },

    /// The sink was handed an item shape it does not store.
    #[error("{sink} sink cannot store {item} items")]
    UnsupportedInput {
        /// The sink's name.
        sink: &'static str,
        /// The item shape received.
        item: &'static str,
    },
}

impl SinkError {
    /// Creates an `Open` error.
    pub fn open(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Open {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Creates an `Io` error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a `Serialize` error.
    pub fn serialize(reason: impl std::fmt::Display) -> Self {
        Self::Serialize {
            reason: reason.to_string(),
        }
    }

    /// Returns true if the error means the sink could not be set up at all.
    #[must_use]
    pub fn is_open_failure(&self) -> bool {
        matches!(self, Self::Open { .. })
    }
}
