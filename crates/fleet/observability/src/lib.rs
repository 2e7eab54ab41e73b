//! Fleet Observability
//!
//! Metrics and logging infrastructure for fleet components.
//!
//! ## Features
//!
//! - **Metrics**: Prometheus collectors for operations and agents, reached
//!   through the [`MetricsSink`] trait
//! - **Logging**: `tracing-subscriber` setup with optional JSON output

pub mod error;
pub mod logging;
pub mod metrics;
pub mod sink;

pub use error::ObservabilityError;
pub use logging::{init_tracing, LoggingConfig};
pub use metrics::{FleetMetrics, MetricsRegistry};
pub use sink::{MetricsSink, NoopMetrics};
