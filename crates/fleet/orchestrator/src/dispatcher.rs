//! The seam between the worker pool and whatever executes an operation
//!
//! A dispatcher either finishes the operation in-process and returns
//! [`DispatchOutcome::Completed`], or hands it to someone else (an agent) and
//! returns [`DispatchOutcome::Delegated`], in which case the terminal write
//! belongs to that party.

use async_trait::async_trait;
use fleet_types::{ClusterId, HandlerError, HandlerSet, Operation, OperationStatus};
use serde_json::{json, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// What happened to a dispatched operation
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Handed off; status stays running until the executor reports back
    Delegated,

    /// Finished here with a terminal status
    Completed {
        status: OperationStatus,
        result: Value,
    },
}

/// Dispatch could not hand the operation over
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("No agent connected for cluster {0}")]
    NotConnected(ClusterId),

    #[error("Agent queue for cluster {0} is full")]
    QueueFull(ClusterId),

    #[error("{0}")]
    Failed(String),
}

#[async_trait]
pub trait OperationDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        operation: &Operation,
        cancel: CancellationToken,
    ) -> Result<DispatchOutcome, DispatchError>;
}

/// Runs operations in-process through their type handlers
#[derive(Debug, Clone)]
pub struct HandlerDispatcher {
    handlers: HandlerSet,
}

impl HandlerDispatcher {
    pub fn new(handlers: HandlerSet) -> Self {
        Self { handlers }
    }
}

#[async_trait]
impl OperationDispatcher for HandlerDispatcher {
    async fn dispatch(
        &self,
        operation: &Operation,
        cancel: CancellationToken,
    ) -> Result<DispatchOutcome, DispatchError> {
        let outcome = match self.handlers.handle(operation, cancel).await {
            Ok(result) => DispatchOutcome::Completed {
                status: OperationStatus::Success,
                result,
            },
            Err(HandlerError::Cancelled) => DispatchOutcome::Completed {
                status: OperationStatus::Cancelled,
                result: json!({ "cancelled": true, "reason": "handler observed cancellation" }),
            },
            Err(e) => DispatchOutcome::Completed {
                status: OperationStatus::Failed,
                result: json!({ "error": e.to_string() }),
            },
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_types::{OperationHandler, OperationType};
    use std::sync::Arc;

    struct Reject;

    #[async_trait]
    impl OperationHandler for Reject {
        async fn handle(&self, _: &Operation, _: CancellationToken) -> Result<Value, HandlerError> {
            Err(HandlerError::InvalidPayload("manifest missing".to_string()))
        }

        fn name(&self) -> &str {
            "reject"
        }
    }

    #[tokio::test]
    async fn test_handler_error_becomes_failed() {
        let dispatcher =
            HandlerDispatcher::new(HandlerSet::new().with(OperationType::Apply, Arc::new(Reject)));
        let op = Operation::new(ClusterId::generate(), OperationType::Apply, json!({}));

        let outcome = dispatcher
            .dispatch(&op, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Completed {
                status: OperationStatus::Failed,
                result: json!({"error": "invalid payload: manifest missing"}),
            }
        );
    }

    #[tokio::test]
    async fn test_unregistered_type_fails_descriptively() {
        let dispatcher = HandlerDispatcher::new(HandlerSet::new());
        let op = Operation::new(ClusterId::generate(), OperationType::Sync, json!({}));

        let outcome = dispatcher
            .dispatch(&op, CancellationToken::new())
            .await
            .unwrap();
        match outcome {
            DispatchOutcome::Completed { status, result } => {
                assert_eq!(status, OperationStatus::Failed);
                assert!(result["error"].as_str().unwrap().contains("sync"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
