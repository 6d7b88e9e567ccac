use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::agents::{CompletionRequest, InferenceBackend};

pub const PROBE_AGENT: &str = "probe";

/// Outcome of a health check against one backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub available: bool,
    pub error: Option<String>
}

impl ProbeResult {
    pub fn available() -> Self {
        Self { available: true, error: None }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self { available: false, error: Some(reason.into()) }
    }
}

/// Sends a minimal request and reports whether it completed within `limit`.
///
/// Never fails: every error, including a timeout, is folded into an unavailable result.
pub async fn probe(backend: &dyn InferenceBackend, limit: Duration) -> ProbeResult {
    let request = CompletionRequest::new(PROBE_AGENT, "", "test");

    match timeout(limit, backend.complete(&request)).await {
        Ok(Ok(_)) => {
            debug!("Backend [{}] is available", backend.name());
            ProbeResult::available()
        },
        Ok(Err(error)) => {
            warn!("Backend [{}] probe failed: {error}", backend.name());
            ProbeResult::unavailable(error.to_string())
        },
        Err(_) => {
            warn!("Backend [{}] probe did not finish within {limit:?}", backend.name());
            ProbeResult::unavailable(format!("no answer within {limit:?}"))
        }
    }
}
