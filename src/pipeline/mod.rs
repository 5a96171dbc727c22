//! Run supervision and accounting.
//!
//! ```text
//! CatalogLoader -> DownloadStage -> [ExtractionStage] -> PersistenceStage
//!                 (fan-out)      mpsc               mpsc
//! ```

mod error;
mod stats;
mod supervisor;

pub use error::PipelineError;
pub use stats::{PipelineOutcome, PipelineStats};
pub use supervisor::Pipeline;
