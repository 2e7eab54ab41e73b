//! Orchestrator configuration

use serde::{Deserialize, Serialize};

/// Worker pool and queue sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Number of dispatch workers; values below 1 are treated as 1
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the dispatch queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Capacity of the cancellation queue
    #[serde(default = "default_cancel_queue_capacity")]
    pub cancel_queue_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            cancel_queue_capacity: default_cancel_queue_capacity(),
        }
    }
}

impl OrchestratorConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub(crate) fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}

fn default_workers() -> usize {
    1
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_cancel_queue_capacity() -> usize {
    100
}
