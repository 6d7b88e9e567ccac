use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::agents::{batch_agent, AgentError, BatchResponse, InferenceBackend, StructuredAgent};
use crate::config::{ExtractionConfig, Tier};
use crate::extractors::{BatchExtractor, ExtractionError, MessageRound};
use crate::models::{RawMessage, TransactionFields, TransactionRecord};
use crate::types::MessageId;

const PREVIEW_CHARS: usize = 200;

/// Debug view of a single message pushed through the single-agent tier.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub message_id: MessageId,
    pub received_at: Option<DateTime<Utc>>,
    pub body_preview: String,
    pub raw_response: Option<String>,
    pub extracted: Option<TransactionFields>,
    pub success: bool,
    pub error: Option<String>
}

/// Extracts every pending message of a batch with one agent call.
pub struct SingleAgentExtractor {
    agent: StructuredAgent<BatchResponse>
}

impl SingleAgentExtractor {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            agent: batch_agent(backend)
        }
    }

    /// Sends one message on its own and reports every step, without retries.
    pub async fn inspect(&self, message: &RawMessage) -> Inspection {
        let mut inspection = Inspection {
            message_id: message.id.clone(),
            received_at: message.received_at().ok(),
            body_preview: preview(&message.body),
            raw_response: None,
            extracted: None,
            success: false,
            error: None
        };

        info!("Inspecting single message [{}]", message.id);

        let raw = match self.agent.call(&batch_payload(std::slice::from_ref(message))).await {
            Ok(raw) => raw,
            Err(error) => {
                inspection.error = Some(error.to_string());
                return inspection
            }
        };

        inspection.raw_response = Some(raw.clone());

        match StructuredAgent::<BatchResponse>::parse(&raw) {
            Ok(mut results) => match results.remove(&message.id) {
                Some(Ok(fields)) => {
                    inspection.extracted = Some(fields);
                    inspection.success = true;
                },
                Some(Err(error)) => inspection.error = Some(error.to_string()),
                None => inspection.error = Some("Message id not found in response".to_string())
            },
            Err(error) => inspection.error = Some(error.to_string())
        }

        inspection
    }
}

/// JSON object mapping message ids to bodies, the input format of the batch agent.
fn batch_payload(messages: &[RawMessage]) -> String {
    let payload: serde_json::Map<String, serde_json::Value> = messages.iter()
        .map(|message| (message.id.clone(), serde_json::Value::String(message.body.clone())))
        .collect();

    serde_json::Value::Object(payload).to_string()
}

fn preview(body: &str) -> String {
    if body.chars().count() > PREVIEW_CHARS {
        format!("{}...", body.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        body.to_string()
    }
}

#[async_trait]
impl BatchExtractor for SingleAgentExtractor {
    fn tier(&self) -> Tier {
        Tier::SingleAgent
    }

    async fn attempt(&self, pending: Vec<RawMessage>, _config: &ExtractionConfig) -> Result<MessageRound, ExtractionError> {
        info!("Sending {} messages to [{}] on [{}]", pending.len(), self.agent.name(), self.agent.backend_name());

        let mut results = match self.agent.run(&batch_payload(&pending)).await {
            Ok(results) => results,
            Err(AgentError::Backend(error)) if error.is_unreachable() => {
                return Err(ExtractionError::backend_unavailable(&error))
            },
            Err(error) => {
                error!("Batch extraction call failed: {error}");

                let reason = error.to_string();
                let failed = pending.into_iter()
                    .map(|message| {
                        let error = ExtractionError::message(&message.id, reason.clone());
                        (message, error)
                    })
                    .collect();

                return Ok(MessageRound { succeeded: Vec::new(), failed })
            }
        };

        let mut outcome = MessageRound::default();

        for message in pending {
            let error = match results.remove(&message.id) {
                Some(Ok(fields)) => match TransactionRecord::new(&message, fields) {
                    Ok(record) => {
                        info!("Successfully processed message [{}]", message.id);
                        outcome.succeeded.push(record);
                        continue
                    },
                    Err(error) => ExtractionError::malformed_message(&error)
                },
                Some(Err(error)) => ExtractionError::invalid_entry(&message.id, &error),
                None => ExtractionError::missing_from_batch(&message.id)
            };

            warn!("{error}, will retry");
            outcome.failed.push((message, error));
        }

        Ok(outcome)
    }
}
