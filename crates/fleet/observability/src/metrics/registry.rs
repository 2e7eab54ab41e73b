//! Prefixed Prometheus registry holding the fleet collectors

use super::collectors::FleetMetrics;
use super::exporter::export_metrics;
use crate::error::Result;
use crate::sink::MetricsSink;
use prometheus::Registry;
use std::sync::Arc;

/// Owns the Prometheus registry and the collectors registered into it
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Arc<Registry>,
    fleet: Arc<FleetMetrics>,
}

impl MetricsRegistry {
    /// Registry with the default `fleet` prefix
    pub fn new() -> Self {
        Self::with_prefix("fleet")
    }

    /// Registry whose metric names are prefixed with `prefix_`
    pub fn with_prefix(prefix: &str) -> Self {
        let registry = Registry::new_custom(Some(prefix.to_string()), None).unwrap_or_else(|e| {
            tracing::warn!(prefix, error = %e, "Invalid metrics prefix, using none");
            Registry::new()
        });
        let fleet = Arc::new(FleetMetrics::new(&registry));
        Self {
            registry: Arc::new(registry),
            fleet,
        }
    }

    pub fn fleet(&self) -> &FleetMetrics {
        &self.fleet
    }

    /// The collectors as a sink for components
    pub fn sink(&self) -> Arc<dyn MetricsSink> {
        self.fleet.clone()
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Current values in Prometheus text format
    pub fn export(&self) -> Result<String> {
        export_metrics(&self.registry)
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
