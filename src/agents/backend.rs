use async_trait::async_trait;

use crate::agents::BackendError;

/// A single prompt sent to an inference backend on behalf of an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Name of the agent issuing the request.
    pub agent: String,
    pub system: String,
    pub prompt: String
}

impl CompletionRequest {
    pub fn new(agent: impl Into<String>, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            system: system.into(),
            prompt: prompt.into()
        }
    }
}

/// Text completion capability of a local model server.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Human readable identifier used in logs and diagnostics.
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError>;
}
