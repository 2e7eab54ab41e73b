//! Source of the cluster facts an agent reports

use crate::config::StaticClusterConfig;
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use fleet_types::{ClusterHealth, ClusterInfo};

/// Reads version, node counts and health from the managed cluster
#[async_trait]
pub trait ClusterInspector: Send + Sync {
    /// Static metadata sent on registration
    async fn cluster_info(&self) -> Result<ClusterInfo>;

    /// Health snapshot sent with every heartbeat
    async fn health(&self) -> Result<ClusterHealth>;
}

/// Reports the configured metadata and treats every node as ready
#[derive(Debug, Clone)]
pub struct StaticInspector {
    info: ClusterInfo,
}

impl StaticInspector {
    pub fn new(info: ClusterInfo) -> Self {
        Self { info }
    }
}

impl From<&StaticClusterConfig> for StaticInspector {
    fn from(config: &StaticClusterConfig) -> Self {
        Self::new(config.into())
    }
}

#[async_trait]
impl ClusterInspector for StaticInspector {
    async fn cluster_info(&self) -> Result<ClusterInfo> {
        Ok(self.info.clone())
    }

    async fn health(&self) -> Result<ClusterHealth> {
        Ok(ClusterHealth {
            status: "healthy".to_string(),
            ready_nodes: self.info.node_count,
            total_nodes: self.info.node_count,
            issues: Vec::new(),
            last_check: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_inspector_reports_config() {
        let config = StaticClusterConfig {
            kubernetes_version: "v1.28.4".to_string(),
            node_count: 4,
            ..StaticClusterConfig::default()
        };
        let inspector = StaticInspector::from(&config);

        let info = inspector.cluster_info().await.unwrap();
        assert_eq!(info.kubernetes_version, "v1.28.4");
        assert_eq!(info.platform, "kubernetes");

        let health = inspector.health().await.unwrap();
        assert_eq!(health.ready_nodes, 4);
        assert!(!health.is_degraded());
    }
}
