mod errors;

use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

pub use errors::ConfigError;

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_MAX_WORKERS: usize = 4;
pub const DEFAULT_MAX_MESSAGE_RETRIES: usize = 3;
pub const DEFAULT_MAX_FIELD_RETRIES: usize = 2;
pub const DEFAULT_FIELD_RETRY_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Extraction strategies in fixed precedence order, most capable first.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    ParallelAgents,
    SingleAgent,
    Deterministic
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::ParallelAgents, Tier::SingleAgent, Tier::Deterministic];

    /// The tier tried when this one is unavailable or fails outright.
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::ParallelAgents => Some(Tier::SingleAgent),
            Tier::SingleAgent => Some(Tier::Deterministic),
            Tier::Deterministic => None
        }
    }

    /// This tier followed by every tier below it.
    pub fn chain(self) -> impl Iterator<Item = Tier> {
        Tier::ALL.into_iter().filter(move |tier| *tier >= self)
    }
}

impl Display for Tier {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tier::ParallelAgents => "parallel-agents",
            Tier::SingleAgent => "single-agent",
            Tier::Deterministic => "deterministic"
        };

        formatter.write_str(label)
    }
}

impl FromStr for Tier {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "parallel-agents" | "parallel" => Ok(Tier::ParallelAgents),
            "single-agent" | "single" => Ok(Tier::SingleAgent),
            "deterministic" | "regex" => Ok(Tier::Deterministic),
            _ => Err(ConfigError::UnknownTier(value.to_string()))
        }
    }
}

/// Per invocation settings for the extraction pipeline.
///
/// `strategy` is the most capable tier the caller allows; every tier below it stays
/// eligible as a fallback.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub batch_size: usize,
    pub max_workers: usize,
    pub max_message_retries: usize,
    pub max_field_retries: usize,
    pub strategy: Tier,
    /// Pause between two attempts at the same field.
    pub field_retry_delay: Duration,
    pub probe_timeout: Duration
}

impl ExtractionConfig {
    pub fn with_strategy(mut self, strategy: Tier) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn message_attempts(&self) -> usize {
        self.max_message_retries + 1
    }

    pub fn field_attempts(&self) -> usize {
        self.max_field_retries + 1
    }

    pub fn allows(&self, tier: Tier) -> bool {
        tier >= self.strategy
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize)
        }

        if self.max_workers == 0 {
            return Err(ConfigError::ZeroWorkers)
        }

        Ok(())
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            max_message_retries: DEFAULT_MAX_MESSAGE_RETRIES,
            max_field_retries: DEFAULT_MAX_FIELD_RETRIES,
            strategy: Tier::ParallelAgents,
            field_retry_delay: DEFAULT_FIELD_RETRY_DELAY,
            probe_timeout: DEFAULT_PROBE_TIMEOUT
        }
    }
}
