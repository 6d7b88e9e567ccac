use thiserror::Error;

use crate::config::ConfigError;
use crate::extractors::ExtractionError;
use crate::models::MessageError;

/// Failures the pipeline reports to its caller instead of recovering from.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
    #[error(transparent)]
    MalformedMessage(#[from] MessageError),
    #[error("Last resort extraction failed: {0}")]
    Extraction(#[from] ExtractionError)
}
