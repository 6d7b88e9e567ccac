mod aggregator;
mod diagnostics;
mod errors;
mod pipeline;
mod scheduler;
mod selector;

pub use aggregator::{ExtractionReport, ExtractionSummary, FailedMessage, ResultAggregator, TierFailure};
pub use diagnostics::{Diagnostics, RetryBudgets};
pub use errors::PipelineError;
pub use pipeline::{Backends, ExtractionPipeline};
pub use scheduler::{batch_bounds, BatchScheduler};
pub use selector::{fallback, select, ProbeResults};
