//! The three extraction tiers and the vocabulary they share.

mod deterministic;
mod errors;
mod parallel;
mod single;
#[cfg(test)]
mod tests;

use std::fmt;
use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{ExtractionConfig, Tier};
use crate::models::{RawMessage, TransactionRecord};
use crate::retry::{Retryable, RoundOutcome};

pub use deterministic::DeterministicExtractor;
pub use errors::ExtractionError;
pub use parallel::ParallelAgentsExtractor;
pub use single::{Inspection, SingleAgentExtractor};

pub type MessageRound = RoundOutcome<RawMessage, TransactionRecord, ExtractionError>;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Amount,
    Type,
    Balance
}

impl Field {
    /// Amount and type are required for a record; balance may be missing.
    pub fn is_mandatory(&self) -> bool {
        !matches!(self, Field::Balance)
    }
}

impl Display for Field {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            Field::Amount => "amount",
            Field::Type => "type",
            Field::Balance => "balance"
        };

        formatter.write_str(label)
    }
}

/// What one field contributed after its retries were spent.
#[derive(Debug)]
pub enum FieldOutcome<T> {
    Present(T),
    AbsentOptional,
    AbsentMandatory(ExtractionError)
}

impl<T> FieldOutcome<T> {
    /// Classifies the final result of a field's attempts; `Ok(None)` means the agent
    /// answered that the field is not in the message.
    ///
    /// # Errors
    /// Only fatal errors are returned, everything else becomes an outcome.
    pub fn settle(field: Field, result: Result<Option<T>, ExtractionError>) -> Result<Self, ExtractionError> {
        match result {
            Ok(Some(value)) => Ok(FieldOutcome::Present(value)),
            Err(error) if error.is_fatal() => Err(error),
            Ok(None) | Err(_) if !field.is_mandatory() => Ok(FieldOutcome::AbsentOptional),
            Ok(None) => Ok(FieldOutcome::AbsentMandatory(ExtractionError::field_missing(field))),
            Err(error) => Ok(FieldOutcome::AbsentMandatory(error))
        }
    }

    pub fn into_required(self, field: Field) -> Result<T, ExtractionError> {
        match self {
            FieldOutcome::Present(value) => Ok(value),
            FieldOutcome::AbsentMandatory(error) => Err(error),
            FieldOutcome::AbsentOptional => Err(ExtractionError::field_missing(field))
        }
    }

    pub fn into_optional(self) -> Option<T> {
        match self {
            FieldOutcome::Present(value) => Some(value),
            FieldOutcome::AbsentOptional | FieldOutcome::AbsentMandatory(_) => None
        }
    }
}

/// A tier, seen from the batch scheduler.
#[async_trait]
pub trait BatchExtractor: Send + Sync {
    fn tier(&self) -> Tier;

    /// Makes one attempt at every message still pending in a batch.
    ///
    /// # Errors
    /// Returns `BackendUnavailable` when the tier cannot continue at all; per message
    /// failures are reported inside the round instead.
    async fn attempt(&self, pending: Vec<RawMessage>, config: &ExtractionConfig) -> Result<MessageRound, ExtractionError>;
}
