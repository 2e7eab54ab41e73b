//! Cluster persistence

use crate::error::{Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fleet_types::{Cluster, ClusterId, ClusterState};

/// Storage for managed clusters, unique by name
#[async_trait]
pub trait ClusterStore: Send + Sync {
    async fn get_by_id(&self, id: &ClusterId) -> Result<Option<Cluster>>;

    async fn get_by_name(&self, name: &str) -> Result<Option<Cluster>>;

    /// Insert a new cluster; fails if the name is taken
    async fn create(&self, cluster: Cluster) -> Result<Cluster>;

    /// Replace an existing cluster record
    async fn update(&self, cluster: Cluster) -> Result<Cluster>;

    async fn update_last_seen(&self, id: &ClusterId, at: DateTime<Utc>) -> Result<()>;

    async fn set_state(&self, id: &ClusterId, state: ClusterState) -> Result<()>;

    async fn list(&self) -> Result<Vec<Cluster>>;
}

/// In-memory cluster store with a name index
pub struct InMemoryClusterStore {
    clusters: DashMap<ClusterId, Cluster>,
    by_name: DashMap<String, ClusterId>,
}

impl InMemoryClusterStore {
    pub fn new() -> Self {
        Self {
            clusters: DashMap::new(),
            by_name: DashMap::new(),
        }
    }
}

impl Default for InMemoryClusterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterStore for InMemoryClusterStore {
    async fn get_by_id(&self, id: &ClusterId) -> Result<Option<Cluster>> {
        Ok(self.clusters.get(id).map(|c| c.clone()))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Cluster>> {
        let Some(id) = self.by_name.get(name).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.clusters.get(&id).map(|c| c.clone()))
    }

    async fn create(&self, cluster: Cluster) -> Result<Cluster> {
        match self.by_name.entry(cluster.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(StoreError::ClusterAlreadyExists(cluster.name))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(cluster.id);
                self.clusters.insert(cluster.id, cluster.clone());
                Ok(cluster)
            }
        }
    }

    async fn update(&self, cluster: Cluster) -> Result<Cluster> {
        let mut entry = self
            .clusters
            .get_mut(&cluster.id)
            .ok_or_else(|| StoreError::ClusterNotFound(cluster.id.to_string()))?;
        if entry.name != cluster.name {
            return Err(StoreError::Backend(format!(
                "cluster {} cannot be renamed",
                cluster.id
            )));
        }
        *entry = cluster.clone();
        Ok(cluster)
    }

    async fn update_last_seen(&self, id: &ClusterId, at: DateTime<Utc>) -> Result<()> {
        let mut entry = self
            .clusters
            .get_mut(id)
            .ok_or_else(|| StoreError::ClusterNotFound(id.to_string()))?;
        entry.last_seen = Some(at);
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn set_state(&self, id: &ClusterId, state: ClusterState) -> Result<()> {
        let mut entry = self
            .clusters
            .get_mut(id)
            .ok_or_else(|| StoreError::ClusterNotFound(id.to_string()))?;
        entry.status = state;
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Cluster>> {
        let mut clusters: Vec<Cluster> = self.clusters.iter().map(|c| c.value().clone()).collect();
        clusters.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clusters)
    }
}
