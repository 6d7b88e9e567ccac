use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agents::{BackendError, CompletionRequest, InferenceBackend};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama chat endpoint running a local model.
pub struct OllamaBackend {
    client: reqwest::Client,
    model: String,
    base_url: String
}

impl OllamaBackend {
    /// Creates a backend for `model`; `base_url` defaults to the local Ollama port.
    pub fn new(model: impl Into<String>, base_url: Option<String>, request_timeout: Duration) -> Result<Self, BackendError> {
        let model = model.into();
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|error| BackendError::Unreachable {
                backend: model.clone(),
                reason: format!("could not build HTTP client: {error}")
            })?;

        Ok(Self {
            client,
            model,
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn map_transport_error(&self, error: reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout { backend: self.model.clone() }
        } else if error.is_connect() {
            BackendError::Unreachable {
                backend: self.model.clone(),
                reason: format!("{error}. Make sure Ollama is running at {}", self.base_url)
            }
        } else {
            BackendError::InvalidResponse {
                backend: self.model.clone(),
                reason: error.to_string()
            }
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    format: &'static str,
    options: ChatOptions
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        let mut messages = Vec::with_capacity(2);

        if !request.system.is_empty() {
            messages.push(ChatMessage { role: "system", content: &request.system });
        }

        messages.push(ChatMessage { role: "user", content: &request.prompt });

        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            format: "json",
            options: ChatOptions { temperature: 0.0 }
        };

        let response = self.client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|error| self.map_transport_error(error))?;

        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

            return Err(BackendError::Status {
                backend: self.model.clone(),
                status: status.as_u16(),
                body: text
            })
        }

        let chat: ChatResponse = response.json().await.map_err(|error| BackendError::InvalidResponse {
            backend: self.model.clone(),
            reason: error.to_string()
        })?;

        Ok(chat.message.content)
    }
}
