//! The persistence stage.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::{Sink, SinkError, SinkItem};
use crate::pipeline::PipelineStats;

/// Drains the last hand-off channel into a [`Sink`].
pub struct PersistenceStage {
    sink: Box<dyn Sink>,
    stats: Arc<PipelineStats>,
}

impl std::fmt::Debug for PersistenceStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceStage")
            .field("sink", &self.sink.name())
            .finish_non_exhaustive()
    }
}

impl PersistenceStage {
    /// Creates a stage writing into an already opened `sink`.
    #[must_use]
    pub fn new(sink: Box<dyn Sink>, stats: Arc<PipelineStats>) -> Self {
        Self { sink, stats }
    }

    /// Consumes `rx` until it is closed and empty, then finishes the sink.
    ///
    /// Per-item write failures are logged and counted. Returns the number
    /// of items durably written.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] only if the final flush fails.
    #[instrument(skip_all, fields(sink = self.sink.name()))]
    pub async fn run<T>(mut self, mut rx: mpsc::Receiver<T>) -> Result<usize, SinkError>
    where
        T: Into<SinkItem> + Send,
    {
        let started = Instant::now();

        while let Some(item) = rx.recv().await {
            self.stats.increment_consumed();
            let item: SinkItem = item.into();
            let sequence_id = item.record().sequence_id();
            let filename = item.record().catalog.filename.clone();
            if let Err(e) = self.sink.write(item).await {
                warn!(sequence_id, %filename, error = %e, "could not write record");
                self.stats.increment_write_failed();
            }
        }

        let written = self.sink.finish().await?;
        self.stats.add_written(written);
        info!(written, "persistence stage complete");
        debug!(elapsed_ms = started.elapsed().as_millis(), "persistence stage time");
        Ok(written)
    }
}
