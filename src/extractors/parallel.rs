use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::agents::{FieldAgents, InferenceBackend};
use crate::config::{ExtractionConfig, Tier};
use crate::extractors::{BatchExtractor, ExtractionError, Field, FieldOutcome, MessageRound};
use crate::models::{Balance, RawMessage, TransactionFields, TransactionRecord, TransactionType};
use crate::retry::{Retryable, RetryController};

/// Extracts each field of a message with its own agent, the three running concurrently.
pub struct ParallelAgentsExtractor {
    agents: FieldAgents
}

impl ParallelAgentsExtractor {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            agents: FieldAgents::new(backend)
        }
    }

    /// Runs the amount, type and balance agents for one message, each with its own retry budget.
    ///
    /// A failed amount or type fails the message as soon as it is known; a failed balance
    /// only turns the balance into `Balance::Unknown`.
    pub async fn extract_message(&self, message: &RawMessage, config: &ExtractionConfig) -> Result<TransactionRecord, ExtractionError> {
        let retry = RetryController::new(config.field_attempts(), config.field_retry_delay);
        let body = message.body.as_str();

        let amount = async {
            let result = retry.run_single(move || async move {
                self.agents.amount.run(body).await
                    .map(Some)
                    .map_err(|error| ExtractionError::agent(Field::Amount, error))
            }).await;

            FieldOutcome::<Decimal>::settle(Field::Amount, result)?.into_required(Field::Amount)
        };

        let transaction_type = async {
            let result = retry.run_single(move || async move {
                self.agents.transaction_type.run(body).await
                    .map(Some)
                    .map_err(|error| ExtractionError::agent(Field::Type, error))
            }).await;

            FieldOutcome::<TransactionType>::settle(Field::Type, result)?.into_required(Field::Type)
        };

        let available_balance = async {
            let result = retry.run_single(move || async move {
                self.agents.balance.run(body).await
                    .map_err(|error| ExtractionError::agent(Field::Balance, error))
            }).await;

            if let Err(error) = &result {
                debug!("Balance for message [{}] falls back to unknown: {error}", message.id);
            }

            Ok::<_, ExtractionError>(Balance::from(FieldOutcome::settle(Field::Balance, result)?.into_optional()))
        };

        let (amount, transaction_type, available_balance) = tokio::try_join!(amount, transaction_type, available_balance)
            .map_err(|error| error.escalate(&message.id))?;

        let fields = TransactionFields {
            amount,
            transaction_type,
            available_balance
        };

        TransactionRecord::new(message, fields).map_err(|error| ExtractionError::malformed_message(&error))
    }
}

#[async_trait]
impl BatchExtractor for ParallelAgentsExtractor {
    fn tier(&self) -> Tier {
        Tier::ParallelAgents
    }

    async fn attempt(&self, pending: Vec<RawMessage>, config: &ExtractionConfig) -> Result<MessageRound, ExtractionError> {
        let results: Vec<(RawMessage, Result<TransactionRecord, ExtractionError>)> = stream::iter(pending)
            .map(move |message| async move {
                let result = self.extract_message(&message, config).await;
                (message, result)
            })
            .buffer_unordered(config.max_workers)
            .collect()
            .await;

        let mut outcome = MessageRound::default();

        for (message, result) in results {
            match result {
                Ok(record) => {
                    info!("Successfully processed message [{}]", message.id);
                    outcome.succeeded.push(record);
                },
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    warn!("Failed to extract transaction details from message [{}], will retry: {error}", message.id);
                    outcome.failed.push((message, error));
                }
            }
        }

        Ok(outcome)
    }
}
