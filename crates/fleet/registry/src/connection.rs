//! Per-cluster agent connection state

use chrono::{DateTime, Utc};
use fleet_types::{ClusterId, Operation};
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// A live agent registration. Owned by the registry's connection table.
#[derive(Debug)]
pub(crate) struct AgentConnection {
    pub cluster_id: ClusterId,
    pub cluster_name: String,
    pub agent_version: String,
    pub session_token: String,
    pub connected_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
    pub sender: mpsc::Sender<Operation>,

    /// Taken by the first stream opened for this registration
    pub receiver: Option<mpsc::Receiver<Operation>>,
}

impl AgentConnection {
    pub fn new(
        cluster_id: ClusterId,
        cluster_name: String,
        agent_version: String,
        capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let now = Utc::now();
        Self {
            cluster_id,
            cluster_name,
            agent_version,
            session_token: uuid::Uuid::new_v4().to_string(),
            connected_at: now,
            last_heartbeat: now,
            sender,
            receiver: Some(receiver),
        }
    }

    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            cluster_id: self.cluster_id,
            cluster_name: self.cluster_name.clone(),
            agent_version: self.agent_version.clone(),
            session_token: self.session_token.clone(),
            connected_at: self.connected_at,
            last_heartbeat: self.last_heartbeat,
            streaming: self.receiver.is_none(),
        }
    }
}

/// Read-only snapshot of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub cluster_id: ClusterId,
    pub cluster_name: String,
    pub agent_version: String,
    pub session_token: String,
    pub connected_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,

    /// An operation stream is attached
    pub streaming: bool,
}

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub cluster_id: ClusterId,
    pub session_token: String,
    pub heartbeat_interval_secs: u64,
}

/// Receiving half of an agent's outbound queue, bound to one registration
#[derive(Debug)]
pub struct OperationStream {
    pub cluster_id: ClusterId,
    pub session_token: String,
    pub(crate) receiver: mpsc::Receiver<Operation>,
}

impl OperationStream {
    /// Next queued operation; `None` once the registration is replaced or removed
    pub async fn recv(&mut self) -> Option<Operation> {
        self.receiver.recv().await
    }

    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Operation>> {
        self.receiver.poll_recv(cx)
    }
}
