//! Bounded, cancellable execution of operations received from the hub

use crate::client::{HubClient, OperationReport};
use crate::error::{AgentError, Result};
use chrono::Utc;
use dashmap::DashMap;
use fleet_types::{HandlerError, HandlerSet, Operation, OperationId};
use futures::FutureExt;
use serde_json::{json, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Runs each operation on its own task, at most `max_concurrent` at a time.
///
/// Every accepted operation produces exactly one result report.
#[derive(Clone)]
pub struct Executor {
    inner: Arc<Inner>,
}

struct Inner {
    handlers: HandlerSet,
    client: Arc<dyn HubClient>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    cancels: DashMap<OperationId, CancellationToken>,
}

impl Executor {
    pub fn new(handlers: HandlerSet, client: Arc<dyn HubClient>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            inner: Arc::new(Inner {
                handlers,
                client,
                permits: Arc::new(Semaphore::new(max_concurrent)),
                max_concurrent,
                cancels: DashMap::new(),
            }),
        }
    }

    /// Wait for a free slot, then start `operation` under a child of `parent`
    pub async fn submit(&self, operation: Operation, parent: &CancellationToken) -> Result<()> {
        if self.inner.cancels.contains_key(&operation.id) {
            tracing::warn!(operation_id = %operation.id, "Operation already executing; ignoring redelivery");
            return Ok(());
        }

        let permit = self
            .inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AgentError::ShuttingDown)?;

        let token = parent.child_token();
        self.inner.cancels.insert(operation.id, token.clone());

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let report = inner.execute(&operation, token).await;
            inner.cancels.remove(&operation.id);

            if let Err(e) = inner.client.report_result(report).await {
                tracing::error!(
                    operation_id = %operation.id,
                    error = %e,
                    "Failed to report operation result"
                );
            }
        });
        Ok(())
    }

    /// Cancel an executing operation
    pub fn cancel_operation(&self, id: &OperationId) -> Result<()> {
        let token = self
            .inner
            .cancels
            .get(id)
            .ok_or(AgentError::NotFound(*id))?;
        token.cancel();
        tracing::info!(operation_id = %id, "Cancellation requested");
        Ok(())
    }

    pub fn in_flight(&self) -> usize {
        self.inner.cancels.len()
    }

    /// Resolve once every running operation has finished and reported
    pub async fn wait_idle(&self) {
        let all = u32::try_from(self.inner.max_concurrent).unwrap_or(u32::MAX);
        if let Ok(permits) = self.inner.permits.acquire_many(all).await {
            drop(permits);
        }
    }
}

enum Outcome {
    Completed(Value),
    Failed(String),
    Cancelled,
}

impl Inner {
    async fn execute(&self, op: &Operation, token: CancellationToken) -> OperationReport {
        tracing::info!(operation_id = %op.id, op_type = %op.op_type, "Executing operation");

        let run = AssertUnwindSafe(self.handlers.handle(op, token.clone())).catch_unwind();
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Outcome::Cancelled,
            res = run => match res {
                Ok(Ok(value)) => Outcome::Completed(value),
                Ok(Err(HandlerError::Cancelled)) => Outcome::Cancelled,
                Ok(Err(e)) => Outcome::Failed(e.to_string()),
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    tracing::error!(operation_id = %op.id, panic = %message, "Handler panicked");
                    Outcome::Failed(format!("handler panicked: {message}"))
                }
            },
        };

        let (success, message, result) = match outcome {
            Outcome::Completed(value) => (true, String::new(), value),
            Outcome::Failed(message) => (false, message, json!({})),
            Outcome::Cancelled => (false, "operation cancelled".to_string(), json!({})),
        };

        if success {
            tracing::info!(operation_id = %op.id, "Operation succeeded");
        } else {
            tracing::warn!(operation_id = %op.id, message = %message, "Operation did not succeed");
        }

        OperationReport {
            operation_id: op.id,
            cluster_id: op.cluster_id,
            success,
            message,
            result,
            completed_at: Utc::now(),
        }
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
