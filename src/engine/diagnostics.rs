use serde::Serialize;

use crate::agents::ProbeResult;
use crate::config::{ExtractionConfig, Tier};

/// Operator facing snapshot of how the pipeline would run right now.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub active_tier: Tier,
    pub configured_strategy: Tier,
    pub parallel_enabled: bool,
    pub single_enabled: bool,
    pub parallel_probe: ProbeResult,
    pub single_probe: ProbeResult,
    pub batch_size: usize,
    pub max_workers: usize,
    pub retry: RetryBudgets
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct RetryBudgets {
    pub max_message_retries: usize,
    pub max_field_retries: usize,
    pub message_attempts: usize,
    pub field_attempts: usize,
    pub field_retry_delay_ms: u64
}

impl From<&ExtractionConfig> for RetryBudgets {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            max_message_retries: config.max_message_retries,
            max_field_retries: config.max_field_retries,
            message_attempts: config.message_attempts(),
            field_attempts: config.field_attempts(),
            field_retry_delay_ms: u64::try_from(config.field_retry_delay.as_millis()).unwrap_or(u64::MAX)
        }
    }
}
