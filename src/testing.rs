use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::agents::{BackendError, CompletionRequest, InferenceBackend};

type Handler = Box<dyn Fn(&CompletionRequest, usize) -> Result<String, BackendError> + Send + Sync>;

/// Backend whose answers are produced by a closure, counting calls per agent.
///
/// The closure receives the request and how many times that agent was called before.
pub struct ScriptedBackend {
    name: String,
    handler: Handler,
    delay: Duration,
    calls: Mutex<HashMap<String, usize>>,
    prompts: Mutex<Vec<CompletionRequest>>
}

impl ScriptedBackend {
    pub fn new(handler: impl Fn(&CompletionRequest, usize) -> Result<String, BackendError> + Send + Sync + 'static) -> Self {
        Self {
            name: "scripted".to_string(),
            handler: Box::new(handler),
            delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
            prompts: Mutex::new(Vec::new())
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self, agent: &str) -> usize {
        self.calls.lock().map(|calls| calls.get(agent).copied().unwrap_or(0)).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().map(|calls| calls.values().sum()).unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.prompts.lock().map(|prompts| prompts.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let previous = {
            let mut calls = self.calls.lock().expect("call counter poisoned");
            let counter = calls.entry(request.agent.clone()).or_insert(0);
            *counter += 1;
            *counter - 1
        };

        self.prompts.lock().expect("request log poisoned").push(request.clone());

        (self.handler)(request, previous)
    }
}

pub fn unreachable() -> BackendError {
    BackendError::Unreachable {
        backend: "scripted".to_string(),
        reason: "connection refused".to_string()
    }
}

pub fn bad_status() -> BackendError {
    BackendError::Status {
        backend: "scripted".to_string(),
        status: 500,
        body: "model crashed".to_string()
    }
}
