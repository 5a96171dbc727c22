//! Fatal run errors.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::fetch::FetchError;
use crate::sink::SinkError;

/// The only failures that abort a run. Per-item failures never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The shared HTTP transport could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] FetchError),

    /// The catalog could not be loaded.
    #[error("failed to load catalog: {0}")]
    Catalog(#[from] CatalogError),

    /// The sink could not be opened or flushed.
    #[error("sink failure: {0}")]
    Sink(#[from] SinkError),

    /// A stage task panicked or was cancelled.
    #[error("{stage} stage task failed: {source}")]
    StageJoin {
        /// Which stage.
        stage: &'static str,
        /// The join error.
        #[source]
        source: tokio::task::JoinError,
    },
}
