//! The extraction stage.
//!
//! Drains verified payloads from the download channel, runs the extractor
//! under its own limiter and forwards [`EnrichedRecord`]s. Closing of the
//! outbound channel follows the same rule as the download stage: the sender
//! is dropped only after the inbound channel is drained and every spawned
//! extraction has finished.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::{EnrichedRecord, Extractor};
use crate::download::FetchedUnit;
use crate::pipeline::PipelineStats;

/// Runs an [`Extractor`] over every verified payload.
#[derive(Clone)]
pub struct ExtractionStage {
    extractor: Arc<dyn Extractor>,
    concurrency: usize,
    stats: Arc<PipelineStats>,
}

impl std::fmt::Debug for ExtractionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionStage")
            .field("extractor", &self.extractor.name())
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl ExtractionStage {
    /// Creates a stage running at most `concurrency` extractions at once (min 1).
    #[must_use]
    pub fn new(
        extractor: Arc<dyn Extractor>,
        concurrency: usize,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            extractor,
            concurrency: concurrency.max(1),
            stats,
        }
    }

    /// Returns the configured concurrency.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Consumes `rx` until it is closed and empty, sending results into `tx`.
    #[instrument(skip_all, fields(extractor = self.extractor.name(), concurrency = self.concurrency))]
    pub async fn run(
        self,
        mut rx: mpsc::Receiver<FetchedUnit>,
        tx: mpsc::Sender<EnrichedRecord>,
    ) {
        let started = Instant::now();
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let stage = Arc::new(self);
        let mut tasks = JoinSet::new();

        while let Some(unit) = rx.recv().await {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                warn!("extraction permit pool closed");
                break;
            };

            let stage = Arc::clone(&stage);
            let tx = tx.clone();
            tasks.spawn(async move {
                let _permit = permit;
                stage.process(unit, &tx).await;
            });
        }

        drop(tx);
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "extraction task panicked");
                stage.stats.increment_task_panics();
            }
        }

        info!(
            extracted = stage.stats.extracted(),
            extraction_failed = stage.stats.extraction_failed(),
            "extraction stage complete"
        );
        debug!(elapsed_ms = started.elapsed().as_millis(), "extraction stage time");
    }

    async fn process(&self, unit: FetchedUnit, tx: &mpsc::Sender<EnrichedRecord>) {
        let FetchedUnit { payload, record } = unit;
        let sequence_id = record.sequence_id();
        let started = Instant::now();

        match self.extractor.extract(payload).await {
            Ok(fields) => {
                self.stats.increment_extracted();
                debug!(
                    sequence_id,
                    elapsed_ms = started.elapsed().as_millis(),
                    "payload extracted"
                );
                if tx.send(EnrichedRecord { record, fields }).await.is_err() {
                    warn!(sequence_id, "next stage closed, dropping enriched record");
                }
            }
            Err(e) => {
                warn!(
                    sequence_id,
                    filename = %record.catalog.filename,
                    error = %e,
                    "could not extract payload"
                );
                self.stats.increment_extraction_failed();
            }
        }
    }
}
