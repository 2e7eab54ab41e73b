//! In-process hub double for unit tests

use crate::client::{HubClient, OperationFeed, OperationReport, Session};
use crate::error::Result;
use async_trait::async_trait;
use fleet_types::{ClusterHealth, ClusterId, ClusterInfo, Operation};
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub(crate) struct FakeHub {
    pub cluster_id: ClusterId,
    pub heartbeat_interval_secs: u64,
    registrations: AtomicUsize,
    heartbeats: AtomicUsize,
    registered_names: Mutex<Vec<String>>,
    feeds: Mutex<VecDeque<mpsc::UnboundedReceiver<Operation>>>,
    reports: mpsc::UnboundedSender<OperationReport>,
}

impl FakeHub {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<OperationReport>) {
        Self::with_heartbeat_interval(30)
    }

    pub fn with_heartbeat_interval(
        secs: u64,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<OperationReport>) {
        let (reports, rx) = mpsc::unbounded_channel();
        let hub = Arc::new(Self {
            cluster_id: ClusterId::generate(),
            heartbeat_interval_secs: secs,
            registrations: AtomicUsize::new(0),
            heartbeats: AtomicUsize::new(0),
            registered_names: Mutex::new(Vec::new()),
            feeds: Mutex::new(VecDeque::new()),
            reports,
        });
        (hub, rx)
    }

    /// Queue the next operation stream the agent will open
    pub fn push_feed(&self) -> mpsc::UnboundedSender<Operation> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.feeds.lock().push_back(rx);
        tx
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    pub fn heartbeats(&self) -> usize {
        self.heartbeats.load(Ordering::SeqCst)
    }

    pub fn registered_names(&self) -> Vec<String> {
        self.registered_names.lock().clone()
    }
}

#[async_trait]
impl HubClient for FakeHub {
    async fn register(
        &self,
        cluster_name: &str,
        _agent_version: &str,
        _info: &ClusterInfo,
    ) -> Result<Session> {
        let n = self.registrations.fetch_add(1, Ordering::SeqCst) + 1;
        self.registered_names.lock().push(cluster_name.to_string());
        Ok(Session {
            cluster_id: self.cluster_id,
            session_token: format!("session-{n}"),
            heartbeat_interval_secs: self.heartbeat_interval_secs,
        })
    }

    async fn heartbeat(&self, _cluster_id: ClusterId, _health: &ClusterHealth) -> Result<()> {
        self.heartbeats.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stream_operations(&self, _session: &Session) -> Result<OperationFeed> {
        match self.feeds.lock().pop_front() {
            Some(rx) => Ok(UnboundedReceiverStream::new(rx).map(Ok).boxed()),
            None => Ok(futures::stream::pending().boxed()),
        }
    }

    async fn report_result(&self, report: OperationReport) -> Result<()> {
        let _ = self.reports.send(report);
        Ok(())
    }
}

pub(crate) async fn next_report(
    reports: &mut mpsc::UnboundedReceiver<OperationReport>,
) -> OperationReport {
    tokio::time::timeout(Duration::from_secs(2), reports.recv())
        .await
        .expect("timed out waiting for a report")
        .expect("report channel closed")
}

/// Poll `check` until it holds or two seconds pass
pub(crate) async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
