//! Fire-and-forget metrics interface consumed by the hub and agent

use fleet_types::{OperationStatus, OperationType};

/// Metrics sink used by the orchestrator and registry.
///
/// Every method is infallible; a sink never blocks or reports errors back to
/// the caller.
pub trait MetricsSink: Send + Sync {
    /// An operation was accepted onto the dispatch queue
    fn operation_queued(&self, op_type: OperationType);

    /// A bounded queue rejected work (`dispatch`, `cancel` or `agent`)
    fn queue_rejected(&self, queue: &str);

    /// An operation reached a terminal status
    fn operation_finished(&self, op_type: OperationType, status: OperationStatus, duration_secs: f64);

    /// Operations currently executing on this process
    fn in_flight_inc(&self);
    fn in_flight_dec(&self);

    /// A terminal write failed and the operation may be stuck in running
    fn finalize_failure(&self, op_type: OperationType);

    fn heartbeat_received(&self, cluster: &str);

    /// 1 while an agent holds a registration for `cluster`, 0 afterwards
    fn set_agent_connected(&self, cluster: &str, connected: bool);

    /// Entries accepted from a telemetry stream (`logs` or `metrics`)
    fn telemetry_received(&self, kind: &str, count: u64);
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn operation_queued(&self, _op_type: OperationType) {}
    fn queue_rejected(&self, _queue: &str) {}
    fn operation_finished(&self, _: OperationType, _: OperationStatus, _: f64) {}
    fn in_flight_inc(&self) {}
    fn in_flight_dec(&self) {}
    fn finalize_failure(&self, _op_type: OperationType) {}
    fn heartbeat_received(&self, _cluster: &str) {}
    fn set_agent_connected(&self, _cluster: &str, _connected: bool) {}
    fn telemetry_received(&self, _kind: &str, _count: u64) {}
}
