//! Metric collectors for fleet components

pub mod agent;
pub mod operation;

use crate::sink::MetricsSink;
use fleet_types::{OperationStatus, OperationType};
use prometheus::Registry;

/// All fleet metrics combined
pub struct FleetMetrics {
    pub operation: operation::OperationMetrics,
    pub agent: agent::AgentMetrics,
}

impl FleetMetrics {
    /// Create all fleet metrics and register them
    pub fn new(registry: &Registry) -> Self {
        Self {
            operation: operation::OperationMetrics::new(registry),
            agent: agent::AgentMetrics::new(registry),
        }
    }
}

impl MetricsSink for FleetMetrics {
    fn operation_queued(&self, op_type: OperationType) {
        self.operation
            .queued_total
            .with_label_values(&[op_type.as_str()])
            .inc();
    }

    fn queue_rejected(&self, queue: &str) {
        self.operation
            .queue_rejections_total
            .with_label_values(&[queue])
            .inc();
    }

    fn operation_finished(&self, op_type: OperationType, status: OperationStatus, duration_secs: f64) {
        self.operation
            .record_outcome(op_type.as_str(), status.as_str(), duration_secs);
    }

    fn in_flight_inc(&self) {
        self.operation.in_flight.inc();
    }

    fn in_flight_dec(&self) {
        self.operation.in_flight.dec();
    }

    fn finalize_failure(&self, op_type: OperationType) {
        self.operation
            .finalize_failures_total
            .with_label_values(&[op_type.as_str()])
            .inc();
    }

    fn heartbeat_received(&self, cluster: &str) {
        self.agent.heartbeats_total.with_label_values(&[cluster]).inc();
    }

    fn set_agent_connected(&self, cluster: &str, connected: bool) {
        self.agent.set_connected(cluster, connected);
    }

    fn telemetry_received(&self, kind: &str, count: u64) {
        self.agent
            .telemetry_entries_total
            .with_label_values(&[kind])
            .inc_by(count);
    }
}
