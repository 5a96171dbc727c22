//! Run-wide counters shared by every stage.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// Statistics from one pipeline run.
///
/// Stages hold an `Arc<PipelineStats>` and bump counters from concurrent
/// tasks. Take a [`PipelineOutcome`] with [`snapshot`](Self::snapshot) once
/// the run has drained.
#[derive(Debug, Default)]
pub struct PipelineStats {
    candidates: AtomicUsize,
    resolved: AtomicUsize,
    resolution_failed: AtomicUsize,
    fetched: AtomicUsize,
    fetch_failed: AtomicUsize,
    verified: AtomicUsize,
    integrity_retried: AtomicUsize,
    integrity_failed: AtomicUsize,
    emitted: AtomicUsize,
    extracted: AtomicUsize,
    extraction_failed: AtomicUsize,
    consumed: AtomicUsize,
    written: AtomicUsize,
    write_failed: AtomicUsize,
    task_panics: AtomicUsize,
}

macro_rules! counters {
    ($($field:ident => $incr:ident),* $(,)?) => {
        impl PipelineStats {
            $(
                #[doc = concat!("Returns the `", stringify!($field), "` counter.")]
                #[must_use]
                pub fn $field(&self) -> usize {
                    self.$field.load(Ordering::SeqCst)
                }

                pub(crate) fn $incr(&self) {
                    self.$field.fetch_add(1, Ordering::SeqCst);
                }
            )*
        }
    };
}

counters! {
    resolved => increment_resolved,
    resolution_failed => increment_resolution_failed,
    fetched => increment_fetched,
    fetch_failed => increment_fetch_failed,
    verified => increment_verified,
    integrity_retried => increment_integrity_retried,
    integrity_failed => increment_integrity_failed,
    emitted => increment_emitted,
    extracted => increment_extracted,
    extraction_failed => increment_extraction_failed,
    consumed => increment_consumed,
    write_failed => increment_write_failed,
    task_panics => increment_task_panics,
}

impl PipelineStats {
    /// Creates a tracker with every counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records admitted after truncation.
    #[must_use]
    pub fn candidates(&self) -> usize {
        self.candidates.load(Ordering::SeqCst)
    }

    pub(crate) fn set_candidates(&self, n: usize) {
        self.candidates.store(n, Ordering::SeqCst);
    }

    /// Returns the number of items durably written by the sink.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written.load(Ordering::SeqCst)
    }

    pub(crate) fn add_written(&self, n: usize) {
        self.written.fetch_add(n, Ordering::SeqCst);
    }

    /// Copies the counters into a plain value.
    #[must_use]
    pub fn snapshot(&self) -> PipelineOutcome {
        PipelineOutcome {
            candidates: self.candidates(),
            resolved: self.resolved(),
            resolution_failed: self.resolution_failed(),
            fetched: self.fetched(),
            fetch_failed: self.fetch_failed(),
            verified: self.verified(),
            integrity_retried: self.integrity_retried(),
            integrity_failed: self.integrity_failed(),
            emitted: self.emitted(),
            extracted: self.extracted(),
            extraction_failed: self.extraction_failed(),
            consumed: self.consumed(),
            written: self.written(),
            write_failed: self.write_failed(),
            task_panics: self.task_panics(),
        }
    }
}

/// Final counts of a run.
///
/// `written <= verified <= candidates` always holds, and every candidate
/// ends in exactly one of written, resolution/fetch/integrity/extraction
/// failure, write failure or panic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineOutcome {
    pub candidates: usize,
    pub resolved: usize,
    pub resolution_failed: usize,
    pub fetched: usize,
    pub fetch_failed: usize,
    pub verified: usize,
    pub integrity_retried: usize,
    pub integrity_failed: usize,
    pub emitted: usize,
    pub extracted: usize,
    pub extraction_failed: usize,
    pub consumed: usize,
    pub written: usize,
    pub write_failed: usize,
    pub task_panics: usize,
}

impl PipelineOutcome {
    /// Returns the number of candidates that did not reach the sink.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.candidates.saturating_sub(self.written)
    }

    /// Returns the sum of every terminal per-item outcome.
    #[must_use]
    pub fn accounted(&self) -> usize {
        self.written
            + self.resolution_failed
            + self.fetch_failed
            + self.integrity_failed
            + self.extraction_failed
            + self.write_failed
            + self.task_panics
    }
}
