//! Metrics collection and export
//!
//! Prometheus-compatible metrics for the dispatch pipeline and agent
//! connectivity. Exposition over HTTP is left to the embedding binary.

pub mod collectors;
pub mod exporter;
pub mod registry;

pub use collectors::FleetMetrics;
pub use exporter::export_metrics;
pub use registry::MetricsRegistry;
