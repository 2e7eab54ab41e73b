//! Registry configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Capacity of each agent's outbound operation queue
    #[serde(default = "default_agent_queue_capacity")]
    pub agent_queue_capacity: usize,

    /// Interval handed to agents on registration
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            agent_queue_capacity: default_agent_queue_capacity(),
            heartbeat_interval_secs: default_heartbeat_interval(),
        }
    }
}

fn default_agent_queue_capacity() -> usize {
    100
}

fn default_heartbeat_interval() -> u64 {
    30
}
