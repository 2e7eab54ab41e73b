//! Operation lifecycle metrics

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};

/// Metrics for the dispatch pipeline
pub struct OperationMetrics {
    /// Operations accepted onto the dispatch queue
    pub queued_total: IntCounterVec,

    /// Enqueue attempts rejected by a full queue
    pub queue_rejections_total: IntCounterVec,

    /// Terminal outcomes by type and status
    pub outcomes_total: IntCounterVec,

    /// Time from running to terminal
    pub duration_seconds: HistogramVec,

    /// Operations currently executing
    pub in_flight: IntGauge,

    /// Terminal writes that failed
    pub finalize_failures_total: IntCounterVec,
}

impl OperationMetrics {
    /// Create and register operation metrics
    pub fn new(registry: &Registry) -> Self {
        let queued_total = IntCounterVec::new(
            Opts::new("operations_queued_total", "Operations accepted for dispatch"),
            &["type"],
        )
        .expect("Failed to create operations_queued_total metric");
        registry
            .register(Box::new(queued_total.clone()))
            .expect("Failed to register operations_queued_total");

        let queue_rejections_total = IntCounterVec::new(
            Opts::new("queue_rejections_total", "Enqueues rejected by a full queue"),
            &["queue"],
        )
        .expect("Failed to create queue_rejections_total metric");
        registry
            .register(Box::new(queue_rejections_total.clone()))
            .expect("Failed to register queue_rejections_total");

        let outcomes_total = IntCounterVec::new(
            Opts::new("operation_outcomes_total", "Operations reaching a terminal status"),
            &["type", "status"],
        )
        .expect("Failed to create operation_outcomes_total metric");
        registry
            .register(Box::new(outcomes_total.clone()))
            .expect("Failed to register operation_outcomes_total");

        let duration_seconds = HistogramVec::new(
            HistogramOpts::new("operation_duration_seconds", "Operation execution time")
                .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
            &["type"],
        )
        .expect("Failed to create operation_duration_seconds metric");
        registry
            .register(Box::new(duration_seconds.clone()))
            .expect("Failed to register operation_duration_seconds");

        let in_flight = IntGauge::new("operations_in_flight", "Operations currently executing")
            .expect("Failed to create operations_in_flight metric");
        registry
            .register(Box::new(in_flight.clone()))
            .expect("Failed to register operations_in_flight");

        let finalize_failures_total = IntCounterVec::new(
            Opts::new(
                "finalize_failures_total",
                "Terminal status writes that failed",
            ),
            &["type"],
        )
        .expect("Failed to create finalize_failures_total metric");
        registry
            .register(Box::new(finalize_failures_total.clone()))
            .expect("Failed to register finalize_failures_total");

        Self {
            queued_total,
            queue_rejections_total,
            outcomes_total,
            duration_seconds,
            in_flight,
            finalize_failures_total,
        }
    }

    /// Record a terminal outcome
    pub fn record_outcome(&self, op_type: &str, status: &str, duration_secs: f64) {
        self.outcomes_total
            .with_label_values(&[op_type, status])
            .inc();
        self.duration_seconds
            .with_label_values(&[op_type])
            .observe(duration_secs);
    }
}
