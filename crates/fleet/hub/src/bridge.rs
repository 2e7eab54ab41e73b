//! Hands orchestrated operations to the agent serving their cluster

use async_trait::async_trait;
use fleet_orchestrator::{DispatchError, DispatchOutcome, OperationDispatcher};
use fleet_registry::{AgentRegistry, RegistryError};
use fleet_types::Operation;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// [`OperationDispatcher`] that enqueues onto the agent registry.
///
/// The operation stays `running` after a successful handoff; the agent's
/// result report finalizes it.
pub struct AgentDispatchBridge {
    registry: Arc<AgentRegistry>,
}

impl AgentDispatchBridge {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl OperationDispatcher for AgentDispatchBridge {
    async fn dispatch(
        &self,
        operation: &Operation,
        cancel: CancellationToken,
    ) -> Result<DispatchOutcome, DispatchError> {
        if cancel.is_cancelled() {
            return Err(DispatchError::Failed(
                "operation cancelled before handoff to agent".to_string(),
            ));
        }
        self.registry
            .queue_operation(operation.cluster_id, operation.clone())
            .map_err(|e| match e {
                RegistryError::NotConnected(id) => DispatchError::NotConnected(id),
                RegistryError::QueueFull(id) => DispatchError::QueueFull(id),
                other => DispatchError::Failed(other.to_string()),
            })?;
        Ok(DispatchOutcome::Delegated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_observability::NoopMetrics;
    use fleet_registry::RegistryConfig;
    use fleet_store::{InMemoryClusterStore, InMemoryOperationStore};
    use fleet_types::{ClusterId, ClusterInfo, OperationType};
    use serde_json::json;

    fn registry() -> Arc<AgentRegistry> {
        Arc::new(AgentRegistry::new(
            RegistryConfig::default(),
            Arc::new(InMemoryClusterStore::new()),
            Arc::new(InMemoryOperationStore::new()),
            Arc::new(NoopMetrics),
        ))
    }

    #[tokio::test]
    async fn test_dispatch_without_agent() {
        let bridge = AgentDispatchBridge::new(registry());
        let op = Operation::new(ClusterId::generate(), OperationType::Apply, json!({}));

        let err = bridge
            .dispatch(&op, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotConnected(id) if id == op.cluster_id));
        assert_eq!(
            err.to_string(),
            format!("No agent connected for cluster {}", op.cluster_id)
        );
    }

    #[tokio::test]
    async fn test_dispatch_delegates_to_agent_queue() {
        let registry = registry();
        let reg = registry
            .register("bridge-test", "0.1.0", ClusterInfo::default())
            .await
            .unwrap();
        let bridge = AgentDispatchBridge::new(registry.clone());
        let op = Operation::new(reg.cluster_id, OperationType::Sync, json!({"revision": "abc"}));

        let outcome = bridge.dispatch(&op, CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Delegated);

        let mut stream = registry.open_stream(reg.cluster_id, "").unwrap();
        assert_eq!(stream.recv().await.unwrap().id, op.id);
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_handoff() {
        let registry = registry();
        let reg = registry
            .register("bridge-cancel", "0.1.0", ClusterInfo::default())
            .await
            .unwrap();
        let bridge = AgentDispatchBridge::new(registry.clone());
        let op = Operation::new(reg.cluster_id, OperationType::Exec, json!({}));

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = bridge.dispatch(&op, cancel).await.unwrap_err();
        assert!(matches!(err, DispatchError::Failed(_)));

        let mut stream = registry.open_stream(reg.cluster_id, "").unwrap();
        let queued =
            tokio::time::timeout(std::time::Duration::from_millis(50), stream.recv()).await;
        assert!(queued.is_err());
    }
}
