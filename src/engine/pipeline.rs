use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::agents::{probe, InferenceBackend, ProbeResult};
use crate::config::{ExtractionConfig, Tier};
use crate::engine::{fallback, select, BatchScheduler, Diagnostics, ExtractionReport, PipelineError, ProbeResults, ResultAggregator, RetryBudgets, TierFailure};
use crate::extractors::{BatchExtractor, DeterministicExtractor, ExtractionError, ParallelAgentsExtractor, SingleAgentExtractor};
use crate::models::{MessageError, RawMessage};

/// Inference backends available to the pipeline, one per backend kind.
#[derive(Clone, Default)]
pub struct Backends {
    /// Backend serving the per-field agents.
    pub parallel: Option<Arc<dyn InferenceBackend>>,
    /// Backend serving the whole-batch agent.
    pub single: Option<Arc<dyn InferenceBackend>>
}

struct AgentTier<E> {
    backend: Arc<dyn InferenceBackend>,
    extractor: E
}

/// Entry point turning raw notification emails into transaction records.
pub struct ExtractionPipeline {
    parallel: Option<AgentTier<ParallelAgentsExtractor>>,
    single: Option<AgentTier<SingleAgentExtractor>>,
    deterministic: DeterministicExtractor
}

impl ExtractionPipeline {
    pub fn new(backends: Backends) -> Self {
        Self {
            parallel: backends.parallel.map(|backend| AgentTier {
                extractor: ParallelAgentsExtractor::new(backend.clone()),
                backend
            }),
            single: backends.single.map(|backend| AgentTier {
                extractor: SingleAgentExtractor::new(backend.clone()),
                backend
            }),
            deterministic: DeterministicExtractor::new()
        }
    }

    pub async fn probe_parallel(&self, limit: Duration) -> ProbeResult {
        match &self.parallel {
            Some(tier) => probe(tier.backend.as_ref(), limit).await,
            None => ProbeResult::unavailable("no backend configured for per-field agents")
        }
    }

    pub async fn probe_single(&self, limit: Duration) -> ProbeResult {
        match &self.single {
            Some(tier) => probe(tier.backend.as_ref(), limit).await,
            None => ProbeResult::unavailable("no backend configured for the batch agent")
        }
    }

    /// Probes the backends of the tiers `config` allows; the others are left unprobed.
    pub async fn probe(&self, config: &ExtractionConfig) -> ProbeResults {
        let parallel = async {
            if config.allows(Tier::ParallelAgents) {
                Some(self.probe_parallel(config.probe_timeout).await)
            } else {
                None
            }
        };

        let single = async {
            if config.allows(Tier::SingleAgent) {
                Some(self.probe_single(config.probe_timeout).await)
            } else {
                None
            }
        };

        let (parallel, single) = tokio::join!(parallel, single);

        ProbeResults { parallel, single }
    }

    pub fn single_agent(&self) -> Option<&SingleAgentExtractor> {
        self.single.as_ref().map(|tier| &tier.extractor)
    }

    /// Extracts transactions from `messages`.
    ///
    /// The tier is chosen once for the whole invocation. When a tier cannot continue the
    /// whole message list is handed to the next live tier, ending with the deterministic
    /// extractor which always completes. Messages that exhaust their retries are dropped
    /// and listed in the report.
    ///
    /// # Errors
    /// Only for contract violations: an invalid config, a message with an empty id or an
    /// out of range timestamp, or the same message id submitted twice.
    pub async fn process(&self, messages: Vec<RawMessage>, config: &ExtractionConfig) -> Result<ExtractionReport, PipelineError> {
        config.validate()?;
        validate_messages(&messages)?;

        let probes = self.probe(config).await;
        let mut tier = select(config, &probes);
        let mut failed_tiers = Vec::new();

        loop {
            info!("Using [{tier}] extraction for {} messages", messages.len());

            match self.run_tier(tier, &messages, config).await {
                Ok(mut report) => {
                    report.failed_tiers = failed_tiers;

                    let summary = report.summary();
                    info!(
                        "Completed processing with [{tier}]. Successfully processed {} out of {} messages, dropped {}",
                        summary.succeeded,
                        summary.submitted,
                        summary.dropped
                    );

                    return Ok(report)
                },
                Err(error) if tier == Tier::Deterministic => return Err(error.into()),
                Err(error) => {
                    let next = fallback(tier, &probes);
                    error!("[{tier}] extraction failed, falling back to [{next}]: {error}");

                    failed_tiers.push(TierFailure {
                        tier,
                        reason: error.to_string()
                    });
                    tier = next;
                }
            }
        }
    }

    /// Probes both backends regardless of config and reports what `process` would do.
    pub async fn diagnostics(&self, config: &ExtractionConfig) -> Diagnostics {
        let (parallel_probe, single_probe) = tokio::join!(
            self.probe_parallel(config.probe_timeout),
            self.probe_single(config.probe_timeout)
        );

        let probes = ProbeResults {
            parallel: config.allows(Tier::ParallelAgents).then(|| parallel_probe.clone()),
            single: config.allows(Tier::SingleAgent).then(|| single_probe.clone())
        };

        Diagnostics {
            active_tier: select(config, &probes),
            configured_strategy: config.strategy,
            parallel_enabled: config.allows(Tier::ParallelAgents),
            single_enabled: config.allows(Tier::SingleAgent),
            parallel_probe,
            single_probe,
            batch_size: config.batch_size,
            max_workers: config.max_workers,
            retry: RetryBudgets::from(config)
        }
    }

    async fn run_tier(&self, tier: Tier, messages: &[RawMessage], config: &ExtractionConfig) -> Result<ExtractionReport, ExtractionError> {
        let extractor = self.extractor(tier).ok_or_else(|| ExtractionError::BackendUnavailable {
            backend: tier.to_string(),
            reason: "no backend configured".to_string()
        })?;

        let mut aggregator = ResultAggregator::new(messages.len());
        BatchScheduler::new(config).run(messages, extractor, &mut aggregator).await?;

        Ok(aggregator.finish(tier))
    }

    fn extractor(&self, tier: Tier) -> Option<&dyn BatchExtractor> {
        match tier {
            Tier::ParallelAgents => self.parallel.as_ref().map(|agent_tier| &agent_tier.extractor as &dyn BatchExtractor),
            Tier::SingleAgent => self.single.as_ref().map(|agent_tier| &agent_tier.extractor as &dyn BatchExtractor),
            Tier::Deterministic => Some(&self.deterministic)
        }
    }
}

fn validate_messages(messages: &[RawMessage]) -> Result<(), MessageError> {
    let mut seen = HashSet::with_capacity(messages.len());

    for message in messages {
        message.validate()?;

        if !seen.insert(message.id.as_str()) {
            return Err(MessageError::DuplicateId { message_id: message.id.clone() })
        }
    }

    Ok(())
}
