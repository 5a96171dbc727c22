//! The download stage: resolve, fetch and verify every candidate.
//!
//! One task is spawned per catalog record, gated by an item permit pool the
//! size of the fetcher's limit, so at most `concurrency` payloads are held
//! by this stage at once. Verified payloads are sent into the bounded
//! channel; a full channel parks the sending task until the next stage
//! drains, which is the only backpressure between the stages.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, trace, warn};

use super::error::DownloadError;
use super::record::{FetchedUnit, ItemState, ResolvedRecord};
use super::retry::{FailureType, RetryDecision, RetryPolicy};
use crate::catalog::CatalogRecord;
use crate::fetch::Fetcher;
use crate::integrity::{self, IntegrityError};
use crate::pipeline::PipelineStats;
use crate::resolver::{LocatorResolver, ResolveError};

/// Resolves, fetches and verifies catalog records concurrently.
#[derive(Clone)]
pub struct DownloadStage {
    fetcher: Fetcher,
    resolver: Arc<dyn LocatorResolver>,
    retry_policy: RetryPolicy,
    stats: Arc<PipelineStats>,
}

impl std::fmt::Debug for DownloadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadStage")
            .field("concurrency", &self.fetcher.limit())
            .field("resolver", &self.resolver.name())
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

impl DownloadStage {
    /// Creates a stage issuing requests through `fetcher`.
    ///
    /// The fetcher's limit is the stage's concurrency.
    #[must_use]
    pub fn new(
        fetcher: Fetcher,
        resolver: Arc<dyn LocatorResolver>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            retry_policy: RetryPolicy::default(),
            stats,
        }
    }

    /// Replaces the integrity retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Returns the configured concurrency.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.fetcher.limit()
    }

    /// Processes every record and sends verified payloads into `tx`.
    ///
    /// Returns once every item has reached a terminal state. `tx` is dropped
    /// before returning, which is what tells the next stage no more units
    /// are coming.
    #[instrument(skip_all, fields(candidates = records.len(), concurrency = self.concurrency()))]
    pub async fn run(self, records: Vec<CatalogRecord>, tx: mpsc::Sender<FetchedUnit>) {
        let started = Instant::now();
        let item_permits = Arc::new(Semaphore::new(self.concurrency()));
        let stage = Arc::new(self);
        let mut tasks = JoinSet::new();

        for record in records {
            let Ok(permit) = Arc::clone(&item_permits).acquire_owned().await else {
                warn!("item permit pool closed, stopping fan-out");
                break;
            };

            let stage = Arc::clone(&stage);
            let tx = tx.clone();
            tasks.spawn(async move {
                let _permit = permit;
                stage.process(record, &tx).await;
            });
        }

        drop(tx);
        debug!(task_count = tasks.len(), "waiting for downloads to complete");

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "download task panicked");
                stage.stats.increment_task_panics();
            }
        }

        info!(
            verified = stage.stats.verified(),
            resolution_failed = stage.stats.resolution_failed(),
            fetch_failed = stage.stats.fetch_failed(),
            integrity_failed = stage.stats.integrity_failed(),
            "download stage complete"
        );
        debug!(elapsed_ms = started.elapsed().as_millis(), "download stage time");
    }

    async fn process(&self, record: CatalogRecord, tx: &mpsc::Sender<FetchedUnit>) {
        let sequence_id = record.sequence_id;
        let filename = record.filename.clone();
        let started = Instant::now();

        match self.download(record).await {
            Ok(unit) => {
                debug!(
                    sequence_id,
                    bytes = unit.payload.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "payload verified"
                );
                if tx.send(unit).await.is_ok() {
                    self.stats.increment_emitted();
                } else {
                    warn!(sequence_id, %filename, "next stage closed, dropping verified payload");
                }
            }
            Err(e @ DownloadError::Resolution(_)) => {
                warn!(sequence_id, %filename, error = %e, "could not resolve landing page");
                self.stats.increment_resolution_failed();
            }
            Err(e @ DownloadError::Fetch(_)) => {
                warn!(sequence_id, %filename, error = %e, "could not fetch payload");
                self.stats.increment_fetch_failed();
            }
            Err(e @ DownloadError::Integrity(_)) => {
                error!(sequence_id, %filename, error = %e, "discarding payload");
                self.stats.increment_integrity_failed();
            }
        }
    }

    /// Drives one record from `Pending` to a terminal state.
    async fn download(&self, record: CatalogRecord) -> Result<FetchedUnit, DownloadError> {
        let sequence_id = record.sequence_id;
        let mut state = ItemState::Pending;

        advance(&mut state, ItemState::Resolving, sequence_id);
        let download_url = match self.resolve(&record).await {
            Ok(url) => url,
            Err(e) => {
                advance(&mut state, ItemState::FailedResolution, sequence_id);
                return Err(e.into());
            }
        };
        self.stats.increment_resolved();
        let resolved = ResolvedRecord::new(record, download_url);

        advance(&mut state, ItemState::Fetching, sequence_id);
        let result = self.fetch_verified(&resolved, &mut state).await;
        match result {
            Ok(payload) => Ok(FetchedUnit {
                payload,
                record: resolved,
            }),
            Err(e) => {
                advance(&mut state, e.terminal_state(), sequence_id);
                Err(e)
            }
        }
    }

    async fn resolve(&self, record: &CatalogRecord) -> Result<String, ResolveError> {
        let page = self
            .fetcher
            .fetch_text(&record.landing_url)
            .await
            .map_err(ResolveError::Fetch)?;
        self.resolver.resolve(&record.landing_url, &page)
    }

    /// Fetches the payload and checks its digest, retrying on mismatch.
    async fn fetch_verified(
        &self,
        record: &ResolvedRecord,
        state: &mut ItemState,
    ) -> Result<Vec<u8>, DownloadError> {
        let sequence_id = record.sequence_id();
        let url = record.download_url.as_str();
        let expected = record.catalog.expected_digest.as_str();
        let mut attempt = 0u32;
        let mut counted_fetch = false;

        loop {
            attempt += 1;
            let payload = match self.fetcher.fetch_bytes(url).await {
                Ok(payload) => payload,
                Err(e) => {
                    if let RetryDecision::DoNotRetry { reason } =
                        self.retry_policy.should_retry(FailureType::Transport, attempt)
                    {
                        debug!(sequence_id, %reason, "not retrying fetch");
                        return Err(e.into());
                    }
                    continue;
                }
            };
            if !counted_fetch {
                self.stats.increment_fetched();
                counted_fetch = true;
            }

            advance(state, ItemState::Verifying, sequence_id);
            if integrity::verify(&payload, expected) {
                advance(state, ItemState::Verified, sequence_id);
                self.stats.increment_verified();
                return Ok(payload);
            }

            let actual = integrity::sha1_hex(&payload);
            match self
                .retry_policy
                .should_retry(FailureType::IntegrityMismatch, attempt)
            {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    error!(
                        sequence_id,
                        filename = %record.catalog.filename,
                        url,
                        expected,
                        actual = %actual,
                        attempt = next_attempt,
                        "integrity could not be verified, retrying"
                    );
                    self.stats.increment_integrity_retried();
                    advance(state, ItemState::Retrying, sequence_id);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(sequence_id, %reason, "not retrying payload");
                    return Err(IntegrityError {
                        sequence_id,
                        url: url.to_string(),
                        expected: expected.to_string(),
                        actual,
                    }
                    .into());
                }
            }
        }
    }
}

fn advance(state: &mut ItemState, next: ItemState, sequence_id: u64) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal transition {state} -> {next}"
    );
    trace!(sequence_id, from = %state, to = %next, "item state");
    *state = next;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fetch::HttpClient;

    fn stage(limit: usize) -> DownloadStage {
        let fetcher = Fetcher::new(HttpClient::new().unwrap(), limit);
        let resolver: Arc<dyn LocatorResolver> =
            Arc::new(|_: &str, page: &str| -> Result<String, ResolveError> {
                Ok(page.to_string())
            });
        DownloadStage::new(fetcher, resolver, Arc::new(PipelineStats::new()))
    }

    #[test]
    fn test_concurrency_follows_fetcher_limit() {
        assert_eq!(stage(7).concurrency(), 7);
    }

    #[test]
    fn test_debug_names_resolver() {
        let rendered = format!("{:?}", stage(1));
        assert!(rendered.contains("custom"), "{rendered}");
    }

    #[tokio::test]
    async fn test_empty_catalog_closes_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        stage(2).run(Vec::new(), tx).await;
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_advance_updates_state() {
        let mut state = ItemState::Pending;
        advance(&mut state, ItemState::Resolving, 0);
        assert_eq!(state, ItemState::Resolving);
    }
}
