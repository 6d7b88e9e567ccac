use serde::Serialize;

use crate::agents::ProbeResult;
use crate::config::{ExtractionConfig, Tier};

/// Probe results for one pipeline invocation; `None` means the tier was not probed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProbeResults {
    pub parallel: Option<ProbeResult>,
    pub single: Option<ProbeResult>
}

impl ProbeResults {
    pub fn is_live(&self, tier: Tier) -> bool {
        let probe = match tier {
            Tier::ParallelAgents => &self.parallel,
            Tier::SingleAgent => &self.single,
            Tier::Deterministic => return true
        };

        probe.as_ref().is_some_and(|probe| probe.available)
    }
}

/// Picks the first live tier, starting at the configured strategy.
pub fn select(config: &ExtractionConfig, probes: &ProbeResults) -> Tier {
    select_from(config.strategy, probes)
}

/// Picks the tier to use after `failed` could not complete.
pub fn fallback(failed: Tier, probes: &ProbeResults) -> Tier {
    failed.next().map_or(Tier::Deterministic, |next| select_from(next, probes))
}

fn select_from(start: Tier, probes: &ProbeResults) -> Tier {
    start.chain()
        .find(|tier| probes.is_live(*tier))
        .unwrap_or(Tier::Deterministic)
}
