//! Structured-output agents backed by a local inference server.
//!
//! An agent wraps an [`InferenceBackend`] with a fixed prompt profile and a response
//! contract. The backend only moves text; parsing and validation of the structured
//! answer happen here so every backend is held to the same field rules.

mod backend;
mod errors;
mod ollama;
mod prober;
mod profiles;
mod responses;
mod structured;

use std::sync::Arc;

pub use backend::{CompletionRequest, InferenceBackend};
pub use errors::{AgentError, BackendError, ValidationError};
pub use ollama::{OllamaBackend, DEFAULT_BASE_URL};
pub use prober::{probe, ProbeResult, PROBE_AGENT};
pub use profiles::{AMOUNT_AGENT, BALANCE_AGENT, BATCH_AGENT, TYPE_AGENT};
pub use responses::{AmountResponse, BalanceResponse, BatchResponse, TransactionDetails, TypeResponse};
pub use structured::{sanitize_response, StructuredAgent, StructuredOutput};

/// One agent per field, used by the parallel tier.
pub struct FieldAgents {
    pub amount: StructuredAgent<AmountResponse>,
    pub transaction_type: StructuredAgent<TypeResponse>,
    pub balance: StructuredAgent<BalanceResponse>
}

impl FieldAgents {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            amount: StructuredAgent::new(&profiles::AMOUNT_PROFILE, backend.clone()),
            transaction_type: StructuredAgent::new(&profiles::TYPE_PROFILE, backend.clone()),
            balance: StructuredAgent::new(&profiles::BALANCE_PROFILE, backend)
        }
    }
}

/// Agent returning every field for a whole batch of messages in one call.
pub fn batch_agent(backend: Arc<dyn InferenceBackend>) -> StructuredAgent<BatchResponse> {
    StructuredAgent::new(&profiles::BATCH_PROFILE, backend)
}
