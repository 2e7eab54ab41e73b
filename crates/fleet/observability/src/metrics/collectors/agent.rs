//! Agent connection metrics

use prometheus::{IntCounterVec, IntGaugeVec, Opts, Registry};

/// Metrics for agent connectivity and telemetry
pub struct AgentMetrics {
    /// 1 while an agent is registered for the cluster
    pub agents_connected: IntGaugeVec,

    pub heartbeats_total: IntCounterVec,

    /// Log and metric entries streamed by agents
    pub telemetry_entries_total: IntCounterVec,
}

impl AgentMetrics {
    /// Create and register agent metrics
    pub fn new(registry: &Registry) -> Self {
        let agents_connected = IntGaugeVec::new(
            Opts::new("agents_connected", "Agents currently registered"),
            &["cluster"],
        )
        .expect("Failed to create agents_connected metric");
        registry
            .register(Box::new(agents_connected.clone()))
            .expect("Failed to register agents_connected");

        let heartbeats_total = IntCounterVec::new(
            Opts::new("agent_heartbeats_total", "Heartbeats received from agents"),
            &["cluster"],
        )
        .expect("Failed to create agent_heartbeats_total metric");
        registry
            .register(Box::new(heartbeats_total.clone()))
            .expect("Failed to register agent_heartbeats_total");

        let telemetry_entries_total = IntCounterVec::new(
            Opts::new(
                "agent_telemetry_entries_total",
                "Telemetry entries received from agents",
            ),
            &["kind"],
        )
        .expect("Failed to create agent_telemetry_entries_total metric");
        registry
            .register(Box::new(telemetry_entries_total.clone()))
            .expect("Failed to register agent_telemetry_entries_total");

        Self {
            agents_connected,
            heartbeats_total,
            telemetry_entries_total,
        }
    }

    pub fn set_connected(&self, cluster: &str, connected: bool) {
        self.agents_connected
            .with_label_values(&[cluster])
            .set(i64::from(connected));
    }
}
