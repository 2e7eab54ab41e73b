//! Bounded dispatch queue, worker pool and cancellation coordinator

use crate::cancel::CancelRegistry;
use crate::config::OrchestratorConfig;
use crate::dispatcher::{DispatchOutcome, OperationDispatcher};
use crate::error::{OrchestratorError, Result};
use fleet_observability::MetricsSink;
use fleet_store::{OperationStore, StoreError};
use fleet_types::{Operation, OperationId, OperationStatus};
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<Operation>>>;

/// Drives queued operations through their lifecycle.
///
/// `queue_operation` and `cancel_operation` never block; a saturated queue is
/// reported to the caller immediately. Workers re-read each operation from the
/// store before acting on it, so the store stays the source of truth.
pub struct Orchestrator {
    config: OrchestratorConfig,
    inner: Arc<Inner>,
    dispatch_tx: Mutex<Option<mpsc::Sender<Operation>>>,
    cancel_tx: Mutex<Option<mpsc::Sender<OperationId>>>,
    receivers: Mutex<Option<(mpsc::Receiver<Operation>, mpsc::Receiver<OperationId>)>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// State shared by the worker and coordinator tasks
struct Inner {
    store: Arc<dyn OperationStore>,
    dispatcher: Arc<dyn OperationDispatcher>,
    metrics: Arc<dyn MetricsSink>,
    cancels: CancelRegistry,
}

/// Terminal decision for one processed operation
enum Finish {
    Delegated,
    Terminal { status: OperationStatus, result: Value },
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        store: Arc<dyn OperationStore>,
        dispatcher: Arc<dyn OperationDispatcher>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let (dispatch_tx, dispatch_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (cancel_tx, cancel_rx) = mpsc::channel(config.cancel_queue_capacity.max(1));

        Self {
            config,
            inner: Arc::new(Inner {
                store,
                dispatcher,
                metrics,
                cancels: CancelRegistry::new(),
            }),
            dispatch_tx: Mutex::new(Some(dispatch_tx)),
            cancel_tx: Mutex::new(Some(cancel_tx)),
            receivers: Mutex::new(Some((dispatch_rx, cancel_rx))),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Enqueue an operation that already exists in the store
    pub fn queue_operation(&self, operation: Operation) -> Result<()> {
        let guard = self.dispatch_tx.lock();
        let tx = guard.as_ref().ok_or(OrchestratorError::Stopped)?;

        let id = operation.id;
        let op_type = operation.op_type;
        match tx.try_send(operation) {
            Ok(()) => {
                self.inner.metrics.operation_queued(op_type);
                tracing::debug!(operation_id = %id, op_type = %op_type, "Operation queued");
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.inner.metrics.queue_rejected("dispatch");
                tracing::warn!(operation_id = %id, "Dispatch queue full");
                Err(OrchestratorError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(OrchestratorError::Stopped),
        }
    }

    /// Request cancellation; handled asynchronously by the coordinator
    pub fn cancel_operation(&self, id: OperationId) -> Result<()> {
        let guard = self.cancel_tx.lock();
        let tx = guard.as_ref().ok_or(OrchestratorError::Stopped)?;

        match tx.try_send(id) {
            Ok(()) => {
                tracing::debug!(operation_id = %id, "Cancellation requested");
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.inner.metrics.queue_rejected("cancel");
                tracing::warn!(operation_id = %id, "Cancellation queue full");
                Err(OrchestratorError::CancellationQueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(OrchestratorError::Stopped),
        }
    }

    /// Spawn the workers and the cancellation coordinator.
    ///
    /// Every per-operation token is a child of `ctx`; cancelling `ctx` aborts
    /// in-flight work and makes the tasks exit.
    pub fn start(&self, ctx: CancellationToken) -> Result<()> {
        if self.dispatch_tx.lock().is_none() {
            return Err(OrchestratorError::Stopped);
        }
        let (dispatch_rx, cancel_rx) = self
            .receivers
            .lock()
            .take()
            .ok_or(OrchestratorError::AlreadyStarted)?;

        let workers = self.config.effective_workers();
        let dispatch_rx: SharedReceiver = Arc::new(tokio::sync::Mutex::new(dispatch_rx));
        let mut tasks = Vec::with_capacity(workers + 1);

        for worker in 0..workers {
            let inner = self.inner.clone();
            let rx = dispatch_rx.clone();
            let ctx = ctx.clone();
            tasks.push(tokio::spawn(async move {
                inner.worker_loop(worker, rx, ctx).await;
            }));
        }

        let inner = self.inner.clone();
        tasks.push(tokio::spawn(async move {
            inner.coordinator_loop(cancel_rx, ctx).await;
        }));

        *self.tasks.lock() = tasks;
        tracing::info!(workers, "Orchestrator started");
        Ok(())
    }

    /// Close the queues and wait for workers to drain. A second call is a no-op.
    pub async fn stop(&self) {
        let Some(sender) = self.dispatch_tx.lock().take() else {
            tracing::debug!("Orchestrator already stopped");
            return;
        };
        drop(sender);
        self.cancel_tx.lock().take();

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Orchestrator task ended abnormally");
            }
        }
        tracing::info!("Orchestrator stopped");
    }

    /// Operations currently holding a cancel handle
    pub fn in_flight(&self) -> usize {
        self.inner.cancels.len()
    }
}

impl Inner {
    async fn worker_loop(&self, worker: usize, rx: SharedReceiver, ctx: CancellationToken) {
        tracing::debug!(worker, "Worker started");
        loop {
            let next = {
                let mut rx = rx.lock().await;
                tokio::select! {
                    biased;
                    _ = ctx.cancelled() => None,
                    op = rx.recv() => op,
                }
            };
            match next {
                Some(op) => self.process(op, &ctx).await,
                None => break,
            }
        }
        tracing::debug!(worker, "Worker exiting");
    }

    async fn process(&self, queued: Operation, ctx: &CancellationToken) {
        let id = queued.id;

        let current = match self.store.get_by_id(&id).await {
            Ok(Some(op)) => op,
            Ok(None) => {
                tracing::warn!(operation_id = %id, "Dequeued operation not found in store");
                return;
            }
            Err(e) => {
                tracing::error!(operation_id = %id, error = %e, "Failed to load operation");
                return;
            }
        };
        if current.is_terminal() {
            tracing::debug!(operation_id = %id, status = %current.status, "Skipping finished operation");
            return;
        }

        let token = ctx.child_token();
        self.cancels.register(id, token.clone());

        let running = match self.store.set_started(&id).await {
            Ok(op) => op,
            Err(e) => {
                tracing::warn!(operation_id = %id, error = %e, "Could not start operation");
                self.cancels.remove(&id);
                return;
            }
        };

        self.metrics.in_flight_inc();
        let started = Instant::now();
        tracing::info!(
            operation_id = %id,
            cluster_id = %running.cluster_id,
            op_type = %running.op_type,
            "Dispatching operation"
        );

        let finish = self.execute(&running, token).await;

        if let Finish::Terminal { status, result } = finish {
            match self.store.set_finished(&id, status, Some(result)).await {
                Ok(_) => {
                    self.metrics.operation_finished(
                        running.op_type,
                        status,
                        started.elapsed().as_secs_f64(),
                    );
                    tracing::info!(operation_id = %id, status = %status, "Operation finished");
                }
                Err(e) => {
                    self.metrics.finalize_failure(running.op_type);
                    tracing::error!(
                        operation_id = %id,
                        status = %status,
                        error = %e,
                        "Failed to persist final status"
                    );
                }
            }
        } else {
            tracing::debug!(operation_id = %id, "Operation delegated");
        }

        self.metrics.in_flight_dec();
        self.cancels.remove(&id);
    }

    /// Run the dispatcher, racing it against the operation's token.
    ///
    /// A handoff the dispatcher already completed stands even if the token
    /// fired meanwhile; the delegate owns the outcome from then on.
    async fn execute(&self, op: &Operation, token: CancellationToken) -> Finish {
        let dispatch = AssertUnwindSafe(self.dispatcher.dispatch(op, token.clone())).catch_unwind();

        let finish = tokio::select! {
            biased;
            res = dispatch => match res {
                Ok(Ok(DispatchOutcome::Delegated)) => Finish::Delegated,
                Ok(Ok(DispatchOutcome::Completed { status, result })) => Finish::Terminal { status, result },
                Ok(Err(e)) => {
                    tracing::warn!(operation_id = %op.id, error = %e, "Dispatch failed");
                    Finish::Terminal {
                        status: OperationStatus::Failed,
                        result: json!({ "error": e.to_string() }),
                    }
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    tracing::error!(operation_id = %op.id, panic = %message, "Dispatcher panicked");
                    Finish::Terminal {
                        status: OperationStatus::Failed,
                        result: json!({ "error": format!("dispatcher panicked: {message}") }),
                    }
                }
            },
            _ = token.cancelled() => cancelled_finish(),
        };

        match finish {
            Finish::Terminal { .. } if token.is_cancelled() => cancelled_finish(),
            other => other,
        }
    }

    async fn coordinator_loop(&self, mut rx: mpsc::Receiver<OperationId>, ctx: CancellationToken) {
        loop {
            let id = tokio::select! {
                _ = ctx.cancelled() => break,
                id = rx.recv() => match id {
                    Some(id) => id,
                    None => break,
                },
            };
            self.handle_cancel(id).await;
        }
        tracing::debug!("Cancellation coordinator exiting");
    }

    async fn handle_cancel(&self, id: OperationId) {
        if self.cancels.cancel(&id) {
            tracing::info!(operation_id = %id, "Cancelled in-flight operation");
            return;
        }

        match self
            .store
            .update_status(&id, OperationStatus::Queued, OperationStatus::Cancelled)
            .await
        {
            Ok(op) => {
                self.metrics
                    .operation_finished(op.op_type, OperationStatus::Cancelled, 0.0);
                tracing::info!(operation_id = %id, "Cancelled queued operation");
            }
            Err(StoreError::StatusConflict { actual, .. }) => {
                tracing::info!(operation_id = %id, status = %actual, "Operation not cancellable");
            }
            Err(StoreError::OperationNotFound(_)) => {
                tracing::warn!(operation_id = %id, "Cancellation for unknown operation");
            }
            Err(e) => {
                tracing::error!(operation_id = %id, error = %e, "Failed to cancel operation");
            }
        }
    }
}

fn cancelled_finish() -> Finish {
    Finish::Terminal {
        status: OperationStatus::Cancelled,
        result: json!({ "cancelled": true, "reason": "operation cancelled while executing" }),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::DispatchError;
    use async_trait::async_trait;
    use fleet_observability::NoopMetrics;
    use fleet_store::InMemoryOperationStore;
    use fleet_types::{ClusterId, OperationType};
    use std::time::Duration;

    /// Records dispatch order and finishes with success, or per-type behavior
    #[derive(Default)]
    struct ScriptedDispatcher {
        seen: Mutex<Vec<OperationId>>,
        started: Mutex<Option<mpsc::UnboundedSender<OperationId>>>,
    }

    impl ScriptedDispatcher {
        fn announcing() -> (Arc<Self>, mpsc::UnboundedReceiver<OperationId>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let dispatcher = Self {
                seen: Mutex::new(Vec::new()),
                started: Mutex::new(Some(tx)),
            };
            (Arc::new(dispatcher), rx)
        }

        fn seen(&self) -> Vec<OperationId> {
            self.seen.lock().clone()
        }
    }

    #[async_trait]
    impl OperationDispatcher for ScriptedDispatcher {
        async fn dispatch(
            &self,
            op: &Operation,
            _cancel: CancellationToken,
        ) -> std::result::Result<DispatchOutcome, DispatchError> {
            self.seen.lock().push(op.id);
            if let Some(tx) = self.started.lock().as_ref() {
                let _ = tx.send(op.id);
            }
            match op.op_type {
                // Never returns and never looks at its token
                OperationType::Exec => std::future::pending().await,
                OperationType::Delete => panic!("delete handler exploded"),
                OperationType::Sync => Err(DispatchError::NotConnected(op.cluster_id)),
                OperationType::Apply => Ok(DispatchOutcome::Completed {
                    status: OperationStatus::Success,
                    result: json!({ "applied": true }),
                }),
            }
        }
    }

    /// Hands off after its token has already fired
    struct SelfCancellingDispatcher;

    #[async_trait]
    impl OperationDispatcher for SelfCancellingDispatcher {
        async fn dispatch(
            &self,
            _op: &Operation,
            cancel: CancellationToken,
        ) -> std::result::Result<DispatchOutcome, DispatchError> {
            cancel.cancel();
            Ok(DispatchOutcome::Delegated)
        }
    }

    struct Fixture {
        store: Arc<InMemoryOperationStore>,
        dispatcher: Arc<ScriptedDispatcher>,
        orchestrator: Orchestrator,
    }

    fn fixture(dispatcher: Arc<ScriptedDispatcher>) -> Fixture {
        fixture_with(OrchestratorConfig::default(), dispatcher)
    }

    fn fixture_with(config: OrchestratorConfig, dispatcher: Arc<ScriptedDispatcher>) -> Fixture {
        let store = Arc::new(InMemoryOperationStore::new());
        let orchestrator = Orchestrator::new(
            config,
            store.clone(),
            dispatcher.clone(),
            Arc::new(NoopMetrics),
        );
        Fixture {
            store,
            dispatcher,
            orchestrator,
        }
    }

    async fn persisted(store: &InMemoryOperationStore, op_type: OperationType) -> Operation {
        store
            .create(Operation::new(ClusterId::generate(), op_type, json!({})))
            .await
            .unwrap()
    }

    async fn wait_for(store: &InMemoryOperationStore, id: OperationId, status: OperationStatus) -> Operation {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let op = store.get_by_id(&id).await.unwrap().unwrap();
                if op.status == status {
                    return op;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("operation {id} never reached {status}"))
    }

    #[tokio::test]
    async fn test_queue_full_does_not_block() {
        let f = fixture(Arc::new(ScriptedDispatcher::default()));
        for _ in 0..1000 {
            f.orchestrator
                .queue_operation(Operation::new(ClusterId::generate(), OperationType::Apply, json!({})))
                .unwrap();
        }

        let err = f
            .orchestrator
            .queue_operation(Operation::new(ClusterId::generate(), OperationType::Apply, json!({})))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::QueueFull));
    }

    #[tokio::test]
    async fn test_cancellation_queue_full_does_not_block() {
        let f = fixture(Arc::new(ScriptedDispatcher::default()));
        for _ in 0..100 {
            f.orchestrator.cancel_operation(OperationId::generate()).unwrap();
        }

        let err = tokio::time::timeout(Duration::from_millis(100), async {
            f.orchestrator.cancel_operation(OperationId::generate())
        })
        .await
        .unwrap()
        .unwrap_err();
        assert!(matches!(err, OrchestratorError::CancellationQueueFull));
    }

    #[tokio::test]
    async fn test_operation_runs_to_success() {
        let f = fixture(Arc::new(ScriptedDispatcher::default()));
        let op = persisted(&f.store, OperationType::Apply).await;

        f.orchestrator.start(CancellationToken::new()).unwrap();
        f.orchestrator.queue_operation(op.clone()).unwrap();

        let done = wait_for(&f.store, op.id, OperationStatus::Success).await;
        assert_eq!(done.result, Some(json!({ "applied": true })));
        assert!(done.started_at.is_some() && done.finished_at.is_some());

        f.orchestrator.stop().await;
        assert_eq!(f.orchestrator.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_single_worker_keeps_enqueue_order() {
        let f = fixture(Arc::new(ScriptedDispatcher::default()));
        let cluster = ClusterId::generate();
        let o1 = f
            .store
            .create(Operation::new(cluster, OperationType::Apply, json!({"n": 1})))
            .await
            .unwrap();
        let o2 = f
            .store
            .create(Operation::new(cluster, OperationType::Apply, json!({"n": 2})))
            .await
            .unwrap();

        f.orchestrator.queue_operation(o1.clone()).unwrap();
        f.orchestrator.queue_operation(o2.clone()).unwrap();
        f.orchestrator.start(CancellationToken::new()).unwrap();

        wait_for(&f.store, o2.id, OperationStatus::Success).await;
        assert_eq!(f.dispatcher.seen(), vec![o1.id, o2.id]);
        f.orchestrator.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_worker_pool_dispatches_each_operation_once() {
        let f = fixture_with(
            OrchestratorConfig::default().with_workers(4),
            Arc::new(ScriptedDispatcher::default()),
        );
        let mut ids = Vec::new();
        for _ in 0..50 {
            let op = persisted(&f.store, OperationType::Apply).await;
            f.orchestrator.queue_operation(op.clone()).unwrap();
            ids.push(op.id);
        }

        f.orchestrator.start(CancellationToken::new()).unwrap();
        for id in &ids {
            wait_for(&f.store, *id, OperationStatus::Success).await;
        }
        f.orchestrator.stop().await;

        let mut seen = f.dispatcher.seen();
        assert_eq!(seen.len(), ids.len());
        seen.sort();
        ids.sort();
        assert_eq!(seen, ids);
        assert_eq!(f.orchestrator.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_completed_handoff_survives_token_cancellation() {
        let store = Arc::new(InMemoryOperationStore::new());
        let orchestrator = Orchestrator::new(
            OrchestratorConfig::default(),
            store.clone(),
            Arc::new(SelfCancellingDispatcher),
            Arc::new(NoopMetrics),
        );
        let op = persisted(&store, OperationType::Apply).await;

        orchestrator.start(CancellationToken::new()).unwrap();
        orchestrator.queue_operation(op.clone()).unwrap();
        wait_for(&store, op.id, OperationStatus::Running).await;
        orchestrator.stop().await;

        let stored = store.get_by_id(&op.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OperationStatus::Running);
        assert!(stored.result.is_none());
    }

    #[tokio::test]
    async fn test_not_queued_operation_is_not_dispatched() {
        let f = fixture(Arc::new(ScriptedDispatcher::default()));
        let stale = persisted(&f.store, OperationType::Apply).await;
        f.store.set_started(&stale.id).await.unwrap();
        let fresh = persisted(&f.store, OperationType::Apply).await;

        f.orchestrator.queue_operation(stale.clone()).unwrap();
        f.orchestrator.queue_operation(fresh.clone()).unwrap();
        f.orchestrator.start(CancellationToken::new()).unwrap();

        wait_for(&f.store, fresh.id, OperationStatus::Success).await;
        assert_eq!(f.dispatcher.seen(), vec![fresh.id]);

        let untouched = f.store.get_by_id(&stale.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, OperationStatus::Running);
        f.orchestrator.stop().await;
        assert_eq!(f.orchestrator.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_cancel_blocked_and_queued_operations() {
        let (dispatcher, mut started) = ScriptedDispatcher::announcing();
        let f = fixture(dispatcher);
        let blocked = persisted(&f.store, OperationType::Exec).await;
        let waiting = persisted(&f.store, OperationType::Apply).await;

        f.orchestrator.start(CancellationToken::new()).unwrap();
        f.orchestrator.queue_operation(blocked.clone()).unwrap();
        assert_eq!(started.recv().await, Some(blocked.id));
        f.orchestrator.queue_operation(waiting.clone()).unwrap();
        assert_eq!(f.orchestrator.in_flight(), 1);

        // Still queued behind the blocked one: cancelled directly
        f.orchestrator.cancel_operation(waiting.id).unwrap();
        let cancelled = wait_for(&f.store, waiting.id, OperationStatus::Cancelled).await;
        assert!(cancelled.started_at.is_none());

        // Dispatch never returns, so the token decides the outcome
        f.orchestrator.cancel_operation(blocked.id).unwrap();
        let aborted = wait_for(&f.store, blocked.id, OperationStatus::Cancelled).await;
        assert_eq!(aborted.result.as_ref().unwrap()["cancelled"], json!(true));

        f.orchestrator.stop().await;
        assert_eq!(f.dispatcher.seen(), vec![blocked.id]);
        assert_eq!(f.orchestrator.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_cancel_of_finished_operation_keeps_result() {
        let f = fixture(Arc::new(ScriptedDispatcher::default()));
        let done = persisted(&f.store, OperationType::Apply).await;
        f.store.set_started(&done.id).await.unwrap();
        f.store
            .set_finished(&done.id, OperationStatus::Success, Some(json!({"kept": 1})))
            .await
            .unwrap();
        let marker = persisted(&f.store, OperationType::Apply).await;

        f.orchestrator.start(CancellationToken::new()).unwrap();
        f.orchestrator.cancel_operation(done.id).unwrap();
        f.orchestrator.cancel_operation(marker.id).unwrap();

        // The coordinator is FIFO: once the marker is cancelled, `done` was handled
        wait_for(&f.store, marker.id, OperationStatus::Cancelled).await;
        let stored = f.store.get_by_id(&done.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OperationStatus::Success);
        assert_eq!(stored.result, Some(json!({"kept": 1})));
        f.orchestrator.stop().await;
    }

    #[tokio::test]
    async fn test_panic_fails_operation_and_worker_survives() {
        let f = fixture(Arc::new(ScriptedDispatcher::default()));
        let bad = persisted(&f.store, OperationType::Delete).await;
        let good = persisted(&f.store, OperationType::Apply).await;

        f.orchestrator.start(CancellationToken::new()).unwrap();
        f.orchestrator.queue_operation(bad.clone()).unwrap();
        f.orchestrator.queue_operation(good.clone()).unwrap();

        let failed = wait_for(&f.store, bad.id, OperationStatus::Failed).await;
        let error = failed.result.unwrap()["error"].as_str().unwrap().to_string();
        assert!(error.contains("delete handler exploded"));
        wait_for(&f.store, good.id, OperationStatus::Success).await;
        f.orchestrator.stop().await;
    }

    #[tokio::test]
    async fn test_dispatch_error_fails_operation() {
        let f = fixture(Arc::new(ScriptedDispatcher::default()));
        let op = persisted(&f.store, OperationType::Sync).await;

        f.orchestrator.start(CancellationToken::new()).unwrap();
        f.orchestrator.queue_operation(op.clone()).unwrap();

        let failed = wait_for(&f.store, op.id, OperationStatus::Failed).await;
        let error = failed.result.unwrap()["error"].as_str().unwrap().to_string();
        assert!(error.contains("No agent connected"));
        f.orchestrator.stop().await;
    }

    #[tokio::test]
    async fn test_lifecycle_errors() {
        let f = fixture(Arc::new(ScriptedDispatcher::default()));
        f.orchestrator.start(CancellationToken::new()).unwrap();
        assert!(matches!(
            f.orchestrator.start(CancellationToken::new()),
            Err(OrchestratorError::AlreadyStarted)
        ));

        f.orchestrator.stop().await;
        f.orchestrator.stop().await;

        let op = Operation::new(ClusterId::generate(), OperationType::Apply, json!({}));
        assert!(matches!(
            f.orchestrator.queue_operation(op.clone()),
            Err(OrchestratorError::Stopped)
        ));
        assert!(matches!(
            f.orchestrator.cancel_operation(op.id),
            Err(OrchestratorError::Stopped)
        ));
    }

    #[tokio::test]
    async fn test_root_cancellation_stops_workers() {
        let (dispatcher, mut started) = ScriptedDispatcher::announcing();
        let f = fixture(dispatcher);
        let blocked = persisted(&f.store, OperationType::Exec).await;
        let ctx = CancellationToken::new();

        f.orchestrator.start(ctx.clone()).unwrap();
        f.orchestrator.queue_operation(blocked.clone()).unwrap();
        started.recv().await.unwrap();

        ctx.cancel();
        wait_for(&f.store, blocked.id, OperationStatus::Cancelled).await;
        tokio::time::timeout(Duration::from_secs(5), f.orchestrator.stop())
            .await
            .unwrap();
    }
}
