use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::config::Tier;
use crate::extractors::ExtractionError;
use crate::models::{RawMessage, TransactionRecord};
use crate::retry::RetryOutcome;
use crate::types::MessageId;

/// A message left out of the results after its retries were spent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedMessage {
    pub message_id: MessageId,
    pub batch: usize,
    pub reason: String
}

/// A tier abandoned during an invocation, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierFailure {
    pub tier: Tier,
    pub reason: String
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct ExtractionSummary {
    pub submitted: usize,
    pub succeeded: usize,
    pub dropped: usize
}

/// Everything one pipeline invocation produced.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    /// Tier that produced the records.
    pub tier: Tier,
    /// In completion order, not input order.
    pub records: Vec<TransactionRecord>,
    pub dropped: Vec<FailedMessage>,
    pub failed_tiers: Vec<TierFailure>,
    pub submitted: usize
}

impl ExtractionReport {
    pub fn summary(&self) -> ExtractionSummary {
        ExtractionSummary {
            submitted: self.submitted,
            succeeded: self.records.len(),
            dropped: self.dropped.len()
        }
    }
}

/// Collects batch outcomes of a single tier run.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    submitted: usize,
    records: Vec<TransactionRecord>,
    seen: HashSet<MessageId>,
    dropped: Vec<FailedMessage>
}

impl ResultAggregator {
    pub fn new(submitted: usize) -> Self {
        Self {
            submitted,
            ..Self::default()
        }
    }

    pub fn absorb(&mut self, batch: usize, outcome: RetryOutcome<RawMessage, TransactionRecord, ExtractionError>) {
        for record in outcome.succeeded {
            if self.seen.insert(record.transaction_id.clone()) {
                self.records.push(record);
            } else {
                warn!("Batch {batch}: ignoring second result for message [{}]", record.transaction_id);
            }
        }

        if outcome.failed.is_empty() {
            return
        }

        let message_ids: Vec<&str> = outcome.failed.iter().map(|(message, _)| message.id.as_str()).collect();

        warn!(
            "Batch {batch}: Could not process {} messages after {} attempts. Message IDs: {message_ids:?}",
            outcome.failed.len(),
            outcome.attempts
        );

        for (message, error) in outcome.failed {
            self.dropped.push(FailedMessage {
                message_id: message.id,
                batch,
                reason: error.to_string()
            });
        }
    }

    pub fn finish(self, tier: Tier) -> ExtractionReport {
        ExtractionReport {
            tier,
            records: self.records,
            dropped: self.dropped,
            failed_tiers: Vec::new(),
            submitted: self.submitted
        }
    }
}
