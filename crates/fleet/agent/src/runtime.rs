//! Agent lifecycle: register, heartbeat, consume the operation stream

use crate::client::{HubClient, Session};
use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::executor::Executor;
use crate::inspector::ClusterInspector;
use fleet_types::{HandlerSet, OperationId};
use futures::StreamExt;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Per-cluster agent
pub struct AgentRuntime {
    config: AgentConfig,
    cluster_name: String,
    client: Arc<dyn HubClient>,
    inspector: Arc<dyn ClusterInspector>,
    executor: Executor,
    session: RwLock<Option<Session>>,
}

impl AgentRuntime {
    pub fn new(
        config: AgentConfig,
        client: Arc<dyn HubClient>,
        inspector: Arc<dyn ClusterInspector>,
        handlers: HandlerSet,
    ) -> Self {
        let cluster_name = config.resolve_cluster_name();
        let executor = Executor::new(handlers, client.clone(), config.max_concurrent_operations);
        Self {
            config,
            cluster_name,
            client,
            inspector,
            executor,
            session: RwLock::new(None),
        }
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// Current registration, if any
    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.executor.in_flight()
    }

    /// Cancel a locally executing operation
    pub fn cancel_operation(&self, id: &OperationId) -> Result<()> {
        self.executor.cancel_operation(id)
    }

    /// Register with the hub and remember the session
    pub async fn connect(&self) -> Result<Session> {
        let info = self.inspector.cluster_info().await?;
        let mut session = self
            .client
            .register(&self.cluster_name, &self.config.agent_version, &info)
            .await?;
        if session.heartbeat_interval_secs == 0 {
            session.heartbeat_interval_secs = self.config.heartbeat_interval_secs;
        }

        tracing::info!(
            cluster_id = %session.cluster_id,
            cluster_name = %self.cluster_name,
            heartbeat_interval_secs = session.heartbeat_interval_secs,
            "Registered with hub"
        );
        *self.session.write() = Some(session.clone());
        Ok(session)
    }

    /// Run until `shutdown` fires, re-registering whenever the stream drops.
    ///
    /// Operations still executing at shutdown are cancelled and reported
    /// before this returns.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let reconnect_delay = Duration::from_secs(self.config.reconnect_delay_secs);

        while !shutdown.is_cancelled() {
            match self.connect().await {
                Ok(session) => {
                    let outcome = tokio::select! {
                        res = self.stream_loop(&session, &shutdown) => res,
                        _ = self.heartbeat_loop(&session, &shutdown) => Ok(()),
                    };
                    match outcome {
                        Ok(()) => tracing::info!(cluster_id = %session.cluster_id, "Operation stream ended"),
                        Err(e) => tracing::warn!(cluster_id = %session.cluster_id, error = %e, "Operation stream failed"),
                    }
                    *self.session.write() = None;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Registration with hub failed");
                }
            }

            if shutdown.is_cancelled() {
                break;
            }
            tracing::info!(
                delay_secs = self.config.reconnect_delay_secs,
                "Reconnecting to hub"
            );
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(reconnect_delay) => {}
            }
        }

        tracing::info!(in_flight = self.executor.in_flight(), "Agent shutting down");
        self.executor.wait_idle().await;
        Ok(())
    }

    async fn stream_loop(&self, session: &Session, shutdown: &CancellationToken) -> Result<()> {
        let mut feed = self.client.stream_operations(session).await?;
        tracing::info!(cluster_id = %session.cluster_id, "Operation stream opened");

        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                next = feed.next() => next,
            };

            match next {
                Some(Ok(operation)) => {
                    tracing::debug!(operation_id = %operation.id, op_type = %operation.op_type, "Operation received");
                    tokio::select! {
                        _ = shutdown.cancelled() => return Ok(()),
                        res = self.executor.submit(operation, shutdown) => res?,
                    }
                }
                Some(Err(AgentError::Convert(e))) => {
                    tracing::warn!(error = %e, "Skipping malformed operation from hub");
                }
                Some(Err(e)) => return Err(e),
                None => return Ok(()),
            }
        }
    }

    async fn heartbeat_loop(&self, session: &Session, shutdown: &CancellationToken) {
        let period = Duration::from_secs(session.heartbeat_interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = ticker.tick() => {}
            }
            match self.send_heartbeat(session).await {
                Ok(()) => tracing::debug!(cluster_id = %session.cluster_id, "Heartbeat sent"),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(cluster_id = %session.cluster_id, "Hub no longer knows this agent")
                }
                Err(e) => tracing::warn!(cluster_id = %session.cluster_id, error = %e, "Heartbeat failed"),
            }
        }
    }

    async fn send_heartbeat(&self, session: &Session) -> Result<()> {
        let health = self.inspector.health().await?;
        self.client.heartbeat(session.cluster_id, &health).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::DryRunHandler;
    use crate::inspector::StaticInspector;
    use crate::testing::{eventually, next_report, FakeHub};
    use fleet_types::{ClusterInfo, Operation, OperationType};
    use serde_json::json;

    fn runtime(hub: Arc<FakeHub>, reconnect_delay_secs: u64) -> Arc<AgentRuntime> {
        let config = AgentConfig {
            cluster_name: Some("unit-cluster".to_string()),
            reconnect_delay_secs,
            ..AgentConfig::default()
        };
        Arc::new(AgentRuntime::new(
            config,
            hub,
            Arc::new(StaticInspector::new(ClusterInfo::default())),
            HandlerSet::uniform(Arc::new(DryRunHandler)),
        ))
    }

    #[tokio::test]
    async fn test_connect_stores_session() {
        let (hub, _reports) = FakeHub::with_heartbeat_interval(0);
        let rt = runtime(hub.clone(), 0);

        let session = rt.connect().await.unwrap();
        assert_eq!(session.cluster_id, hub.cluster_id);
        // Zero from the hub falls back to the configured interval
        assert_eq!(session.heartbeat_interval_secs, 30);
        assert_eq!(rt.session(), Some(session));
    }

    #[tokio::test]
    async fn test_executes_streamed_operations() {
        let (hub, mut reports) = FakeHub::new();
        let feed = hub.push_feed();
        let rt = runtime(hub.clone(), 0);
        let shutdown = CancellationToken::new();

        let task = tokio::spawn({
            let rt = rt.clone();
            let shutdown = shutdown.clone();
            async move { rt.run(shutdown).await }
        });

        let op = Operation::new(hub.cluster_id, OperationType::Apply, json!({"manifest": "x"}));
        feed.send(op.clone()).unwrap();

        let report = next_report(&mut reports).await;
        assert_eq!(report.operation_id, op.id);
        assert!(report.success);
        assert_eq!(report.result["dry_run"], json!(true));

        shutdown.cancel();
        task.await.unwrap().unwrap();
        assert_eq!(hub.registrations(), 1);
        assert_eq!(hub.registered_names(), vec!["unit-cluster".to_string()]);
    }

    #[tokio::test]
    async fn test_reregisters_when_stream_ends() {
        let (hub, _reports) = FakeHub::new();
        let first = hub.push_feed();
        let rt = runtime(hub.clone(), 0);
        let shutdown = CancellationToken::new();

        let task = tokio::spawn({
            let rt = rt.clone();
            let shutdown = shutdown.clone();
            async move { rt.run(shutdown).await }
        });

        assert!(eventually(|| hub.registrations() == 1).await);
        drop(first);
        assert!(eventually(|| hub.registrations() == 2).await);

        shutdown.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_heartbeats_on_hub_interval() {
        let (hub, _reports) = FakeHub::with_heartbeat_interval(1);
        let _feed = hub.push_feed();
        let rt = runtime(hub.clone(), 0);
        let shutdown = CancellationToken::new();

        let task = tokio::spawn({
            let rt = rt.clone();
            let shutdown = shutdown.clone();
            async move { rt.run(shutdown).await }
        });

        tokio::time::timeout(Duration::from_secs(5), async {
            while hub.heartbeats() == 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await
        .unwrap();

        shutdown.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_cancel_unknown_operation_is_not_found() {
        let (hub, _reports) = FakeHub::new();
        let rt = runtime(hub, 0);
        let id = OperationId::generate();
        assert!(matches!(rt.cancel_operation(&id), Err(AgentError::NotFound(_))));
    }
}
