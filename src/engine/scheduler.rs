use std::ops::Range;
use std::time::Duration;

use tracing::info;

use crate::config::ExtractionConfig;
use crate::engine::ResultAggregator;
use crate::extractors::{BatchExtractor, ExtractionError};
use crate::models::RawMessage;
use crate::retry::RetryController;

/// Consecutive index ranges of at most `batch_size` items covering `len` items in order.
pub fn batch_bounds(len: usize, batch_size: usize) -> Vec<Range<usize>> {
    let batch_size = batch_size.max(1);

    (0..len).step_by(batch_size)
        .map(|start| start..(start + batch_size).min(len))
        .collect()
}

/// Feeds batches to a tier one after another, retrying the failed part of each batch.
pub struct BatchScheduler<'a> {
    config: &'a ExtractionConfig
}

impl<'a> BatchScheduler<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self { config }
    }

    /// A batch is finished, successfully or with its retries spent, before the next one starts.
    ///
    /// # Errors
    /// Stops at the first fatal error reported by the tier.
    pub async fn run(&self, messages: &[RawMessage], extractor: &dyn BatchExtractor, aggregator: &mut ResultAggregator) -> Result<(), ExtractionError> {
        let config = self.config;
        let retry = RetryController::new(config.message_attempts(), Duration::ZERO);
        let bounds = batch_bounds(messages.len(), self.config.batch_size);
        let batches = bounds.len();

        info!(
            "Processing {} messages with [{}] (batch size: {}, workers: {}, message retries: {}, field retries: {})",
            messages.len(),
            extractor.tier(),
            self.config.batch_size,
            self.config.max_workers,
            self.config.max_message_retries,
            self.config.max_field_retries
        );

        for (index, range) in bounds.into_iter().enumerate() {
            info!("Processing batch {}/{}: messages {} to {} of {}", index + 1, batches, range.start + 1, range.end, messages.len());

            let outcome = retry.run(messages[range].to_vec(), move |pending| extractor.attempt(pending, config)).await?;

            aggregator.absorb(index + 1, outcome);
        }

        Ok(())
    }
}
