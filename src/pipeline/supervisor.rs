//! The pipeline supervisor.
//!
//! Owns one run: builds the shared transport, loads the catalog, opens the
//! sink, then spawns one task per stage and wires them with bounded
//! channels. A stage's sender is dropped when the stage finishes, so each
//! downstream drain loop ends exactly when its channel is closed and empty.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::{PipelineError, PipelineOutcome, PipelineStats};
use crate::catalog::CatalogLoader;
use crate::config::PipelineConfig;
use crate::download::{DownloadStage, FetchedUnit, RetryPolicy};
use crate::extract::{EnrichedRecord, Extraction, ExtractionStage};
use crate::fetch::{Fetcher, HttpClient};
use crate::resolver::LocatorResolver;
use crate::sink::{PersistenceStage, SinkError, open_sink};

/// One configured run of the fetch, verify, transform and persist pipeline.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use aptnotes_core::{
///     BoxSharedItemResolver, Extraction, OutputFormat, Pipeline, PipelineConfig,
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PipelineConfig::new(OutputFormat::Pdf, "reports").with_limit(Some(5));
/// let pipeline = Pipeline::new(
///     config,
///     Arc::new(BoxSharedItemResolver::new()),
///     Extraction::NotConfigured,
/// )?;
/// let outcome = pipeline.run().await?;
/// println!("wrote {} of {}", outcome.written, outcome.candidates);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    resolver: Arc<dyn LocatorResolver>,
    extraction: Extraction,
    retry_policy: RetryPolicy,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("resolver", &self.resolver.name())
            .field("extraction", &self.extraction)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

impl Pipeline {
    /// Validates `config` and prepares a run.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] for out-of-range settings.
    pub fn new(
        config: PipelineConfig,
        resolver: Arc<dyn LocatorResolver>,
        extraction: Extraction,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            resolver,
            extraction,
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Replaces the integrity retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns true if the extraction stage will sit between download and
    /// persistence: the format stores derived fields and an extractor exists.
    #[must_use]
    pub fn extraction_wired(&self) -> bool {
        self.config.output.requires_extraction() && self.extraction.is_available()
    }

    /// Executes the run to completion.
    ///
    /// # Errors
    ///
    /// Only fatal conditions are returned: transport construction, catalog
    /// load, sink open or final flush, and stage task failure. Every
    /// per-item failure is counted in the returned [`PipelineOutcome`].
    #[instrument(skip(self), fields(format = %self.config.output, concurrency = self.config.concurrency))]
    pub async fn run(self) -> Result<PipelineOutcome, PipelineError> {
        let started = Instant::now();
        let stats = Arc::new(PipelineStats::new());
        let extraction_stage = self.extraction_stage(&stats);

        let client = HttpClient::with_timeouts(
            self.config.connect_timeout_secs,
            self.config.read_timeout_secs,
        )
        .map_err(PipelineError::Client)?;
        let fetcher = Fetcher::new(client, self.config.concurrency);

        let records = CatalogLoader::new(&fetcher)
            .load_limited(&self.config.catalog_url, self.config.limit)
            .await?;
        stats.set_candidates(records.len());
        info!(candidates = records.len(), limit = ?self.config.limit, "candidates selected");

        let sink = open_sink(self.config.output, self.config.output_path()).await?;
        let persistence = PersistenceStage::new(sink, Arc::clone(&stats));
        let download = DownloadStage::new(fetcher, self.resolver, Arc::clone(&stats))
            .with_retry_policy(self.retry_policy);

        let capacity = self.config.channel_capacity;
        let (fetched_tx, fetched_rx) = mpsc::channel::<FetchedUnit>(capacity);
        let download_task = tokio::spawn(download.run(records, fetched_tx));

        let (extraction_task, persistence_task): (Option<JoinHandle<()>>, PersistenceTask) =
            match extraction_stage {
                Some(extraction) => {
                    let (enriched_tx, enriched_rx) = mpsc::channel::<EnrichedRecord>(capacity);
                    let extraction_task = tokio::spawn(extraction.run(fetched_rx, enriched_tx));
                    (
                        Some(extraction_task),
                        tokio::spawn(persistence.run(enriched_rx)),
                    )
                }
                None => (None, tokio::spawn(persistence.run(fetched_rx))),
            };

        join_stage("download", download_task).await?;
        if let Some(task) = extraction_task {
            join_stage("extraction", task).await?;
        }
        join_stage("persistence", persistence_task).await??;

        let outcome = stats.snapshot();
        info!(
            candidates = outcome.candidates,
            fetched = outcome.fetched,
            verified = outcome.verified,
            written = outcome.written,
            resolution_failed = outcome.resolution_failed,
            fetch_failed = outcome.fetch_failed,
            integrity_failed = outcome.integrity_failed,
            extraction_failed = outcome.extraction_failed,
            write_failed = outcome.write_failed,
            "run complete"
        );
        debug!(elapsed_ms = started.elapsed().as_millis(), "total run time");
        Ok(outcome)
    }

    fn extraction_stage(&self, stats: &Arc<PipelineStats>) -> Option<ExtractionStage> {
        let format = self.config.output;
        match (format.requires_extraction(), self.extraction.extractor()) {
            (true, Some(extractor)) => Some(ExtractionStage::new(
                Arc::clone(extractor),
                self.config.extraction_concurrency,
                Arc::clone(stats),
            )),
            (true, None) => {
                warn!(%format, "no extractor configured, derived fields will be empty");
                None
            }
            (false, Some(_)) => {
                debug!(%format, "format stores payloads, skipping extraction");
                None
            }
            (false, None) => None,
        }
    }
}

type PersistenceTask = JoinHandle<Result<usize, SinkError>>;

async fn join_stage<T>(stage: &'static str, task: JoinHandle<T>) -> Result<T, PipelineError> {
    task.await
        .map_err(|source| PipelineError::StageJoin { stage, source })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::config::{ConfigError, OutputFormat};
    use crate::extract::{ExtractedFields, ExtractionError, Extractor};
    use crate::resolver::BoxSharedItemResolver;

    struct Noop;

    #[async_trait]
    impl Extractor for Noop {
        fn name(&self) -> &str {
            "noop"
        }

        async fn extract(&self, _payload: Vec<u8>) -> Result<ExtractedFields, ExtractionError> {
            Ok(ExtractedFields::default())
        }
    }

    fn pipeline(format: OutputFormat, extraction: Extraction) -> Pipeline {
        Pipeline::new(
            PipelineConfig::new(format, "out"),
            Arc::new(BoxSharedItemResolver::new()),
            extraction,
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = Pipeline::new(
            PipelineConfig::default().with_concurrency(0),
            Arc::new(BoxSharedItemResolver::new()),
            Extraction::NotConfigured,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Config(ConfigError::InvalidConcurrency { value: 0 })
        ));
    }

    #[test]
    fn test_extraction_wiring_decision() {
        assert!(pipeline(OutputFormat::Sqlite, Extraction::available(Noop)).extraction_wired());
        assert!(pipeline(OutputFormat::Csv, Extraction::available(Noop)).extraction_wired());
        assert!(!pipeline(OutputFormat::Pdf, Extraction::available(Noop)).extraction_wired());
        assert!(!pipeline(OutputFormat::Json, Extraction::NotConfigured).extraction_wired());
    }

    #[test]
    fn test_extraction_stage_only_when_wired() {
        let stats = Arc::new(PipelineStats::new());
        let wired = pipeline(OutputFormat::Json, Extraction::available(Noop));
        assert!(wired.extraction_stage(&stats).is_some());
        let skipped = pipeline(OutputFormat::Pdf, Extraction::available(Noop));
        assert!(skipped.extraction_stage(&stats).is_none());
    }
}
