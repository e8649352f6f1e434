//! Runtime configuration for the batch pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker threads for the pipeline pool. 0 or unset uses rayon's default.
    pub threads: Option<usize>,
    /// Wall-clock budget for a full pipeline run. Default: 300_000 ms.
    pub time_budget_ms: Option<u64>,
}

impl RuntimeConfig {
    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or(0)
    }

    pub fn effective_time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms.unwrap_or(300_000))
    }
}
