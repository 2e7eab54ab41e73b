//! Cluster records and the metadata agents report about them

use crate::ClusterId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Connection state of a managed cluster as seen by the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterState {
    Connected,
    Disconnected,
    Degraded,
}

impl ClusterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterState::Connected => "connected",
            ClusterState::Disconnected => "disconnected",
            ClusterState::Degraded => "degraded",
        }
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A managed Kubernetes cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,

    /// Unique, agent-chosen name
    pub name: String,

    pub status: ClusterState,
    pub labels: BTreeMap<String, String>,
    pub kubernetes_version: String,
    pub platform: String,
    pub region: String,
    pub node_count: u32,

    /// Last time an agent registered or heartbeated for this cluster
    pub last_seen: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cluster {
    /// Build a freshly connected cluster from agent-reported metadata
    pub fn from_info(name: impl Into<String>, info: &ClusterInfo) -> Self {
        let now = Utc::now();
        Self {
            id: ClusterId::generate(),
            name: name.into(),
            status: ClusterState::Connected,
            labels: info.labels.clone(),
            kubernetes_version: info.kubernetes_version.clone(),
            platform: info.platform.clone(),
            region: info.region.clone(),
            node_count: info.node_count,
            last_seen: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh metadata after a re-registration
    pub fn apply_info(&mut self, info: &ClusterInfo) {
        let now = Utc::now();
        self.labels = info.labels.clone();
        self.kubernetes_version = info.kubernetes_version.clone();
        self.platform = info.platform.clone();
        self.region = info.region.clone();
        self.node_count = info.node_count;
        self.status = ClusterState::Connected;
        self.last_seen = Some(now);
        self.updated_at = now;
    }
}

/// Static facts an agent reports when registering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub kubernetes_version: String,
    pub platform: String,
    pub node_count: u32,
    pub region: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Point-in-time health snapshot carried by heartbeats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterHealth {
    /// Free-form summary such as "healthy" or "degraded"
    pub status: String,
    pub ready_nodes: u32,
    pub total_nodes: u32,
    #[serde(default)]
    pub issues: Vec<String>,
    pub last_check: DateTime<Utc>,
}

impl ClusterHealth {
    pub fn is_degraded(&self) -> bool {
        self.ready_nodes < self.total_nodes || !self.issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ClusterInfo {
        ClusterInfo {
            kubernetes_version: "v1.29.2".to_string(),
            platform: "eks".to_string(),
            node_count: 3,
            region: "us-east-1".to_string(),
            labels: BTreeMap::from([("env".to_string(), "prod".to_string())]),
        }
    }

    #[test]
    fn test_from_info_is_connected() {
        let cluster = Cluster::from_info("prod-east", &info());
        assert_eq!(cluster.status, ClusterState::Connected);
        assert_eq!(cluster.node_count, 3);
        assert!(cluster.last_seen.is_some());
    }

    #[test]
    fn test_apply_info_keeps_identity() {
        let mut cluster = Cluster::from_info("prod-east", &info());
        let id = cluster.id;
        cluster.status = ClusterState::Disconnected;

        let mut updated = info();
        updated.node_count = 5;
        cluster.apply_info(&updated);

        assert_eq!(cluster.id, id);
        assert_eq!(cluster.node_count, 5);
        assert_eq!(cluster.status, ClusterState::Connected);
    }

    #[test]
    fn test_health_degraded_when_nodes_not_ready() {
        let health = ClusterHealth {
            status: "healthy".to_string(),
            ready_nodes: 2,
            total_nodes: 3,
            issues: vec![],
            last_check: Utc::now(),
        };
        assert!(health.is_degraded());
    }
}
