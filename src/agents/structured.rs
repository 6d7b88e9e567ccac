use std::marker::PhantomData;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::agents::{AgentError, BackendError, CompletionRequest, InferenceBackend, ValidationError};

/// Fixed prompt material of an agent.
#[derive(Debug)]
pub struct AgentProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub instructions: &'static [&'static str]
}

/// Response contract of an agent: the JSON it must produce and the rules it must obey.
pub trait StructuredOutput: DeserializeOwned {
    type Validated;

    /// JSON shape shown to the model.
    const SHAPE: &'static str;

    fn validate(self) -> Result<Self::Validated, ValidationError>;
}

/// An agent constrained to answer with a single validated `T`.
pub struct StructuredAgent<T> {
    profile: &'static AgentProfile,
    backend: Arc<dyn InferenceBackend>,
    output: PhantomData<fn() -> T>
}

impl<T: StructuredOutput> StructuredAgent<T> {
    pub fn new(profile: &'static AgentProfile, backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            profile,
            backend,
            output: PhantomData
        }
    }

    pub fn name(&self) -> &'static str {
        self.profile.name
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn system_prompt(&self) -> String {
        let instructions: Vec<String> = self.profile.instructions.iter()
            .map(|instruction| format!("- {instruction}"))
            .collect();

        format!(
            "{}\n\nInstructions:\n{}\n\nRespond with one JSON object of the shape {} and nothing else.",
            self.profile.description,
            instructions.join("\n"),
            T::SHAPE
        )
    }

    /// Sends `payload` to the backend and returns the raw answer.
    pub async fn call(&self, payload: &str) -> Result<String, BackendError> {
        let request = CompletionRequest::new(self.profile.name, self.system_prompt(), payload);
        let raw = self.backend.complete(&request).await?;

        trace!("Agent [{}] answered: {raw}", self.profile.name);

        Ok(raw)
    }

    /// Parses and validates a raw answer against `T`.
    pub fn parse(raw: &str) -> Result<T::Validated, ValidationError> {
        let response: T = serde_json::from_str(&sanitize_response(raw))
            .map_err(|error| ValidationError::Malformed(error.to_string()))?;

        response.validate()
    }

    pub async fn run(&self, payload: &str) -> Result<T::Validated, AgentError> {
        let raw = self.call(payload).await?;

        Ok(Self::parse(&raw)?)
    }
}

static REASONING_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));

/// Reduces a model answer to the JSON object it carries.
///
/// Reasoning models prefix their answer with a `<think>` block and chat models like to
/// wrap JSON in code fences; both are dropped and the outermost object is kept.
pub fn sanitize_response(raw: &str) -> String {
    let text = REASONING_BLOCK.replace_all(raw, "");

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => text[start..=end].to_string(),
        _ => text.trim().to_string()
    }
}
