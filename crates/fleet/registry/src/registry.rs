//! Agent connection table and the operations the gRPC layer exposes

use crate::config::RegistryConfig;
use crate::connection::{AgentConnection, ConnectionInfo, OperationStream, Registration};
use crate::error::{RegistryError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fleet_observability::MetricsSink;
use fleet_store::{ClusterStore, OperationStore, StoreError};
use fleet_types::{
    Cluster, ClusterHealth, ClusterId, ClusterInfo, ClusterState, Operation, OperationId,
    OperationStatus,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;

/// Completion report sent by an agent
#[derive(Debug, Clone)]
pub struct ResultReport {
    pub operation_id: OperationId,
    pub cluster_id: ClusterId,
    pub success: bool,
    pub message: String,
    pub result: Value,
    pub completed_at: DateTime<Utc>,
}

/// Tracks which agent serves which cluster and routes operations to it
pub struct AgentRegistry {
    config: RegistryConfig,
    clusters: Arc<dyn ClusterStore>,
    operations: Arc<dyn OperationStore>,
    metrics: Arc<dyn MetricsSink>,
    connections: DashMap<ClusterId, AgentConnection>,
    closing: AtomicBool,
}

impl AgentRegistry {
    pub fn new(
        config: RegistryConfig,
        clusters: Arc<dyn ClusterStore>,
        operations: Arc<dyn OperationStore>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            config,
            clusters,
            operations,
            metrics,
            connections: DashMap::new(),
            closing: AtomicBool::new(false),
        }
    }

    /// Upsert the cluster by name and (re)create its connection entry
    pub async fn register(
        &self,
        cluster_name: &str,
        agent_version: &str,
        info: ClusterInfo,
    ) -> Result<Registration> {
        self.ensure_open()?;
        let cluster_name = cluster_name.trim();
        if cluster_name.is_empty() {
            return Err(RegistryError::InvalidArgument(
                "cluster_name must not be empty".to_string(),
            ));
        }

        let cluster = self.upsert_cluster(cluster_name, &info).await?;
        let connection = AgentConnection::new(
            cluster.id,
            cluster.name.clone(),
            agent_version.to_string(),
            self.config.agent_queue_capacity,
        );
        let session_token = connection.session_token.clone();

        if let Some(previous) = self.connections.insert(cluster.id, connection) {
            tracing::info!(
                cluster_id = %cluster.id,
                previous_version = %previous.agent_version,
                "Replacing existing agent registration"
            );
        }
        self.metrics.set_agent_connected(&cluster.name, true);

        tracing::info!(
            cluster_id = %cluster.id,
            cluster_name = %cluster.name,
            agent_version,
            "Agent registered"
        );

        Ok(Registration {
            cluster_id: cluster.id,
            session_token,
            heartbeat_interval_secs: self.config.heartbeat_interval_secs,
        })
    }

    async fn upsert_cluster(&self, name: &str, info: &ClusterInfo) -> Result<Cluster> {
        if let Some(mut existing) = self.clusters.get_by_name(name).await? {
            existing.apply_info(info);
            return Ok(self.clusters.update(existing).await?);
        }

        match self.clusters.create(Cluster::from_info(name, info)).await {
            Ok(cluster) => Ok(cluster),
            // Lost a race with a concurrent registration of the same name
            Err(StoreError::ClusterAlreadyExists(_)) => {
                let mut existing = self
                    .clusters
                    .get_by_name(name)
                    .await?
                    .ok_or_else(|| StoreError::ClusterNotFound(name.to_string()))?;
                existing.apply_info(info);
                Ok(self.clusters.update(existing).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Record liveness for a registered agent. Never creates a registration.
    pub async fn heartbeat(
        &self,
        cluster_id: ClusterId,
        health: Option<ClusterHealth>,
    ) -> Result<DateTime<Utc>> {
        let now = Utc::now();
        let cluster_name = {
            let mut conn = self
                .connections
                .get_mut(&cluster_id)
                .ok_or(RegistryError::AgentNotFound(cluster_id))?;
            conn.last_heartbeat = now;
            conn.cluster_name.clone()
        };

        self.clusters.update_last_seen(&cluster_id, now).await?;
        if let Some(health) = health {
            let state = if health.is_degraded() {
                ClusterState::Degraded
            } else {
                ClusterState::Connected
            };
            self.clusters.set_state(&cluster_id, state).await?;
        }
        self.metrics.heartbeat_received(&cluster_name);

        tracing::debug!(cluster_id = %cluster_id, "Heartbeat received");
        Ok(now)
    }

    /// Attach the operation stream for a registration.
    ///
    /// An empty `session_token` attaches to the current registration.
    pub fn open_stream(&self, cluster_id: ClusterId, session_token: &str) -> Result<OperationStream> {
        self.ensure_open()?;
        let mut conn = self
            .connections
            .get_mut(&cluster_id)
            .ok_or(RegistryError::AgentNotFound(cluster_id))?;

        if !session_token.is_empty() && conn.session_token != session_token {
            return Err(RegistryError::FailedPrecondition(format!(
                "session for cluster {cluster_id} has been replaced"
            )));
        }
        let receiver = conn.receiver.take().ok_or_else(|| {
            RegistryError::FailedPrecondition(format!(
                "an operation stream is already open for cluster {cluster_id}"
            ))
        })?;

        Ok(OperationStream {
            cluster_id,
            session_token: conn.session_token.clone(),
            receiver,
        })
    }

    /// Stream teardown: drop the registration only if it is still the one the
    /// stream was opened for
    pub async fn release_stream(&self, cluster_id: ClusterId, session_token: &str) -> Result<bool> {
        match self
            .connections
            .remove_if(&cluster_id, |_, conn| conn.session_token == session_token)
        {
            Some((_, conn)) => {
                tracing::info!(cluster_id = %cluster_id, "Operation stream closed; agent disconnected");
                self.mark_disconnected(conn).await?;
                Ok(true)
            }
            None => {
                tracing::debug!(cluster_id = %cluster_id, "Stale stream closed; registration kept");
                Ok(false)
            }
        }
    }

    /// Remove a registration unconditionally. Returns false if none existed.
    pub async fn disconnect_agent(&self, cluster_id: ClusterId) -> Result<bool> {
        match self.connections.remove(&cluster_id) {
            Some((_, conn)) => {
                tracing::info!(cluster_id = %cluster_id, "Agent disconnected");
                self.mark_disconnected(conn).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop every registration and refuse new ones.
    ///
    /// Each open operation stream ends once its queue drains, which lets the
    /// server finish its in-flight RPCs. Returns the number of agents removed.
    pub async fn disconnect_all(&self) -> Result<usize> {
        self.closing.store(true, Ordering::SeqCst);
        let mut removed = 0;
        for cluster_id in self.connected_clusters() {
            if self.disconnect_agent(cluster_id).await? {
                removed += 1;
            }
        }
        tracing::info!(agents = removed, "Disconnected all agents");
        Ok(removed)
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closing() {
            return Err(RegistryError::ShuttingDown);
        }
        Ok(())
    }

    async fn mark_disconnected(&self, conn: AgentConnection) -> Result<()> {
        // A newer registration may have landed meanwhile
        if self.connections.contains_key(&conn.cluster_id) {
            return Ok(());
        }
        self.metrics.set_agent_connected(&conn.cluster_name, false);
        self.clusters
            .set_state(&conn.cluster_id, ClusterState::Disconnected)
            .await?;
        Ok(())
    }

    /// Non-blocking handoff onto the cluster's outbound queue
    pub fn queue_operation(&self, cluster_id: ClusterId, operation: Operation) -> Result<()> {
        let conn = self
            .connections
            .get(&cluster_id)
            .ok_or(RegistryError::NotConnected(cluster_id))?;

        let operation_id = operation.id;
        match conn.sender.try_send(operation) {
            Ok(()) => {
                tracing::debug!(
                    cluster_id = %cluster_id,
                    operation_id = %operation_id,
                    "Operation queued for agent"
                );
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.queue_rejected("agent");
                Err(RegistryError::QueueFull(cluster_id))
            }
            Err(TrySendError::Closed(_)) => Err(RegistryError::NotConnected(cluster_id)),
        }
    }

    /// Authoritative completion of an agent-delegated operation
    pub async fn report_result(&self, report: ResultReport) -> Result<Operation> {
        let operation = self.load_operation(&report.operation_id).await?;
        if operation.cluster_id != report.cluster_id {
            return Err(RegistryError::InvalidArgument(format!(
                "operation {} does not belong to cluster {}",
                report.operation_id, report.cluster_id
            )));
        }
        if operation.is_terminal() {
            return Err(RegistryError::FailedPrecondition(format!(
                "operation {} is already {}",
                operation.id, operation.status
            )));
        }

        let status = if report.success {
            OperationStatus::Success
        } else {
            OperationStatus::Failed
        };
        let empty = report.result.as_object().is_some_and(|o| o.is_empty());
        let result = if empty && !report.message.is_empty() {
            json!({ "message": report.message })
        } else {
            report.result
        };

        let finished = self
            .operations
            .set_finished(&operation.id, status, Some(result))
            .await
            .map_err(precondition_or_store)?;

        let duration = operation
            .started_at
            .map(|start| (report.completed_at - start).num_milliseconds().max(0) as f64 / 1000.0)
            .unwrap_or(0.0);
        self.metrics
            .operation_finished(finished.op_type, status, duration);

        tracing::info!(
            operation_id = %finished.id,
            cluster_id = %report.cluster_id,
            status = %status,
            "Agent reported result"
        );
        Ok(finished)
    }

    /// Hub-authoritative cancellation of a queued or running operation
    pub async fn cancel_operation(
        &self,
        operation_id: OperationId,
        cluster_id: Option<ClusterId>,
        reason: &str,
    ) -> Result<Operation> {
        let operation = self.load_operation(&operation_id).await?;
        if let Some(cluster_id) = cluster_id {
            if operation.cluster_id != cluster_id {
                return Err(RegistryError::InvalidArgument(format!(
                    "operation {operation_id} does not belong to cluster {cluster_id}"
                )));
            }
        }
        if operation.is_terminal() {
            return Err(RegistryError::FailedPrecondition(format!(
                "operation {} is already {}",
                operation.id, operation.status
            )));
        }

        let reason = if reason.is_empty() {
            "cancelled by request"
        } else {
            reason
        };
        let cancelled = self
            .operations
            .cancel_operation(&operation_id, json!({ "cancelled": true, "reason": reason }))
            .await
            .map_err(precondition_or_store)?;

        self.metrics
            .operation_finished(cancelled.op_type, OperationStatus::Cancelled, 0.0);
        tracing::info!(operation_id = %operation_id, reason, "Operation cancelled");
        Ok(cancelled)
    }

    async fn load_operation(&self, id: &OperationId) -> Result<Operation> {
        self.operations
            .get_by_id(id)
            .await?
            .ok_or(RegistryError::OperationNotFound(*id))
    }

    /// Look up a cluster that telemetry claims to come from
    pub async fn known_cluster(&self, cluster_id: ClusterId) -> Result<Cluster> {
        self.clusters
            .get_by_id(&cluster_id)
            .await?
            .ok_or(RegistryError::ClusterNotFound(cluster_id))
    }

    pub fn record_telemetry(&self, kind: &str, count: u64) {
        if count > 0 {
            self.metrics.telemetry_received(kind, count);
        }
    }

    pub fn is_connected(&self, cluster_id: &ClusterId) -> bool {
        self.connections.contains_key(cluster_id)
    }

    pub fn connected_clusters(&self) -> Vec<ClusterId> {
        let mut ids: Vec<ClusterId> = self.connections.iter().map(|c| *c.key()).collect();
        ids.sort();
        ids
    }

    pub fn connection(&self, cluster_id: &ClusterId) -> Option<ConnectionInfo> {
        self.connections.get(cluster_id).map(|c| c.info())
    }

    pub fn heartbeat_interval_secs(&self) -> u64 {
        self.config.heartbeat_interval_secs
    }
}

fn precondition_or_store(e: StoreError) -> RegistryError {
    if e.is_status_rejection() {
        RegistryError::FailedPrecondition(e.to_string())
    } else {
        RegistryError::Store(e)
    }
}
