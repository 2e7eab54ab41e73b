//! Hub assembly and gRPC server lifecycle

use crate::bridge::AgentDispatchBridge;
use crate::config::{HubConfig, ServerConfig};
use crate::error::{HubError, HubResult};
use fleet_observability::{MetricsRegistry, MetricsSink};
use fleet_orchestrator::Orchestrator;
use fleet_registry::{AgentRegistry, AgentServiceImpl};
use fleet_store::{
    ClusterStore, InMemoryClusterStore, InMemoryOperationStore, OperationStore, StoreError,
};
use fleet_types::{ClusterId, Operation, OperationId, OperationStatus, OperationType};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::{Identity, Server, ServerTlsConfig};

/// Stores, registry, bridge and orchestrator wired together
pub struct Hub {
    operations: Arc<dyn OperationStore>,
    clusters: Arc<dyn ClusterStore>,
    metrics: MetricsRegistry,
    registry: Arc<AgentRegistry>,
    orchestrator: Orchestrator,
}

impl Hub {
    /// Hub backed by the in-memory stores
    pub fn new(config: &HubConfig) -> Self {
        Self::with_stores(
            config,
            Arc::new(InMemoryOperationStore::new()),
            Arc::new(InMemoryClusterStore::new()),
        )
    }

    pub fn with_stores(
        config: &HubConfig,
        operations: Arc<dyn OperationStore>,
        clusters: Arc<dyn ClusterStore>,
    ) -> Self {
        let metrics = MetricsRegistry::new();
        let sink: Arc<dyn MetricsSink> = metrics.sink();

        let registry = Arc::new(AgentRegistry::new(
            config.registry.clone(),
            clusters.clone(),
            operations.clone(),
            sink.clone(),
        ));
        let bridge = Arc::new(AgentDispatchBridge::new(registry.clone()));
        let orchestrator = Orchestrator::new(
            config.orchestrator.clone(),
            operations.clone(),
            bridge,
            sink,
        );

        Self {
            operations,
            clusters,
            metrics,
            registry,
            orchestrator,
        }
    }

    /// Start the orchestrator's workers under `ctx`
    pub fn start(&self, ctx: CancellationToken) -> HubResult<()> {
        self.orchestrator.start(ctx)?;
        tracing::info!("Hub orchestrator started");
        Ok(())
    }

    /// Drain the dispatch queue and wait for the workers
    pub async fn stop(&self) {
        self.orchestrator.stop().await;
        tracing::info!("Hub orchestrator stopped");
    }

    /// Persist a new operation and queue it for dispatch.
    ///
    /// If the dispatch queue rejects it, the stored record is cancelled so it
    /// does not linger as `queued`.
    pub async fn submit_operation(
        &self,
        cluster_id: ClusterId,
        op_type: OperationType,
        payload: Value,
    ) -> HubResult<Operation> {
        let operation = self
            .operations
            .create(Operation::new(cluster_id, op_type, payload))
            .await?;

        if let Err(e) = self.orchestrator.queue_operation(operation.clone()) {
            tracing::warn!(operation_id = %operation.id, error = %e, "Dispatch queue rejected operation");
            let reason = json!({ "cancelled": true, "reason": e.to_string() });
            if let Err(store_err) = self.operations.cancel_operation(&operation.id, reason).await {
                tracing::error!(
                    operation_id = %operation.id,
                    error = %store_err,
                    "Failed to cancel rejected operation"
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            operation_id = %operation.id,
            cluster_id = %cluster_id,
            op_type = %op_type,
            "Operation submitted"
        );
        Ok(operation)
    }

    /// Cancel an operation wherever it currently lives.
    ///
    /// A `running` operation has been handed to its agent, so the record is
    /// finalized as cancelled here and the agent's late report is rejected.
    /// Anything else goes through the orchestrator's coordinator, which
    /// cancels queued work and aborts an in-flight dispatch.
    pub async fn cancel_operation(&self, id: OperationId) -> HubResult<()> {
        let current = self
            .operations
            .get_by_id(&id)
            .await?
            .ok_or(StoreError::OperationNotFound(id))?;

        if current.status == OperationStatus::Running {
            self.registry
                .cancel_operation(id, None, "cancelled by request")
                .await?;
            return Ok(());
        }
        Ok(self.orchestrator.cancel_operation(id)?)
    }

    pub async fn operation(&self, id: &OperationId) -> HubResult<Option<Operation>> {
        Ok(self.operations.get_by_id(id).await?)
    }

    /// Wait until an operation reaches `status` or `timeout` elapses
    pub async fn wait_for_status(
        &self,
        id: &OperationId,
        status: OperationStatus,
        timeout: Duration,
    ) -> HubResult<Operation> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let current = self
                .operations
                .get_by_id(id)
                .await?
                .ok_or(StoreError::OperationNotFound(*id))?;
            if current.status == status || tokio::time::Instant::now() >= deadline {
                return Ok(current);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn operations(&self) -> &Arc<dyn OperationStore> {
        &self.operations
    }

    pub fn clusters(&self) -> &Arc<dyn ClusterStore> {
        &self.clusters
    }

    /// Prometheus text exposition of the hub's collectors
    pub fn metrics_text(&self) -> HubResult<String> {
        Ok(self.metrics.export()?)
    }

    pub fn agent_service(&self) -> AgentServiceImpl {
        AgentServiceImpl::new(self.registry.clone())
    }
}

/// tonic server builder with keepalive and optional TLS applied
pub fn transport(config: &ServerConfig) -> HubResult<Server> {
    let mut builder = Server::builder()
        .http2_keepalive_interval(Some(Duration::from_secs(config.keepalive_interval_secs)))
        .http2_keepalive_timeout(Some(Duration::from_secs(config.keepalive_timeout_secs)));

    if let Some(tls) = &config.tls {
        let cert = std::fs::read(&tls.cert_path)?;
        let key = std::fs::read(&tls.key_path)?;
        builder = builder
            .tls_config(ServerTlsConfig::new().identity(Identity::from_pem(cert, key)))
            .map_err(|e| HubError::Tls(e.to_string()))?;
    }

    Ok(builder)
}

/// Serve the agent service on the configured address until `shutdown` resolves
pub async fn serve<F>(hub: &Hub, config: &ServerConfig, shutdown: F) -> HubResult<()>
where
    F: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind(config.grpc_listen_addr).await?;
    tracing::info!("fleetd listening on {}", listener.local_addr()?);
    serve_with_listener(hub, config, listener, shutdown).await
}

/// Serve on an already-bound listener.
///
/// Once `shutdown` resolves every agent registration is dropped, which ends
/// the open operation streams so the graceful stop can complete.
pub async fn serve_with_listener<F>(
    hub: &Hub,
    config: &ServerConfig,
    listener: TcpListener,
    shutdown: F,
) -> HubResult<()>
where
    F: Future<Output = ()> + Send,
{
    let registry = hub.registry().clone();
    let shutdown = async move {
        shutdown.await;
        if let Err(e) = registry.disconnect_all().await {
            tracing::error!(error = %e, "Failed to disconnect agents on shutdown");
        }
    };

    transport(config)?
        .add_service(hub.agent_service().into_server())
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;
    Ok(())
}

/// Graceful shutdown signal handler
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_orchestrator::OrchestratorError;

    #[tokio::test]
    async fn test_submit_to_unconnected_cluster_fails_operation() {
        let hub = Hub::new(&HubConfig::default());
        let ctx = CancellationToken::new();
        hub.start(ctx.clone()).unwrap();

        let op = hub
            .submit_operation(ClusterId::generate(), OperationType::Apply, json!({}))
            .await
            .unwrap();
        let done = hub
            .wait_for_status(&op.id, OperationStatus::Failed, Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(done.status, OperationStatus::Failed);
        let error = done.result.unwrap()["error"].as_str().unwrap().to_string();
        assert!(error.starts_with("No agent connected for cluster"));

        hub.stop().await;
        ctx.cancel();
    }

    #[tokio::test]
    async fn test_submit_after_stop_cancels_record() {
        let hub = Hub::new(&HubConfig::default());
        hub.start(CancellationToken::new()).unwrap();
        hub.stop().await;

        let err = hub
            .submit_operation(ClusterId::generate(), OperationType::Exec, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::Orchestrator(OrchestratorError::Stopped)));
    }

    #[tokio::test]
    async fn test_cancel_of_queued_operation_is_accepted() {
        let hub = Hub::new(&HubConfig::default());
        let op = hub
            .submit_operation(ClusterId::generate(), OperationType::Sync, json!({}))
            .await
            .unwrap();

        hub.cancel_operation(op.id).await.unwrap();
        let stored = hub.operation(&op.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OperationStatus::Queued);

        let missing = hub.cancel_operation(OperationId::generate()).await;
        assert!(matches!(
            missing,
            Err(HubError::Store(StoreError::OperationNotFound(_)))
        ));
    }

    #[test]
    fn test_transport_rejects_missing_tls_files() {
        let config = ServerConfig {
            tls: Some(crate::config::TlsConfig {
                cert_path: "/nonexistent/cert.pem".into(),
                key_path: "/nonexistent/key.pem".into(),
            }),
            ..ServerConfig::default()
        };
        assert!(matches!(transport(&config), Err(HubError::Io(_))));
    }
}
