//! Type-specific operation handlers
//!
//! Handlers are the integration point with whatever actually touches a
//! cluster (manifest apply, exec, sync). Cancellation is cooperative: every
//! handler receives a [`CancellationToken`] and is expected to return promptly
//! once it fires.

use crate::{Operation, OperationType};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Handler errors
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    #[error("no handler registered for operation type {0}")]
    Unsupported(OperationType),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Failed(String),
}

/// Executes one kind of operation
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Run the operation and return its result document
    async fn handle(
        &self,
        operation: &Operation,
        cancel: CancellationToken,
    ) -> Result<Value, HandlerError>;

    /// Handler name for logging
    fn name(&self) -> &str;
}

/// Handlers keyed by operation type
#[derive(Clone, Default)]
pub struct HandlerSet {
    handlers: HashMap<OperationType, Arc<dyn OperationHandler>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the same handler for every operation type
    pub fn uniform(handler: Arc<dyn OperationHandler>) -> Self {
        let mut set = Self::new();
        for ty in OperationType::ALL {
            set.register(ty, handler.clone());
        }
        set
    }

    pub fn with(mut self, op_type: OperationType, handler: Arc<dyn OperationHandler>) -> Self {
        self.register(op_type, handler);
        self
    }

    pub fn register(&mut self, op_type: OperationType, handler: Arc<dyn OperationHandler>) {
        self.handlers.insert(op_type, handler);
    }

    pub fn get(&self, op_type: OperationType) -> Option<&Arc<dyn OperationHandler>> {
        self.handlers.get(&op_type)
    }

    /// Route the operation to its type handler
    pub async fn handle(
        &self,
        operation: &Operation,
        cancel: CancellationToken,
    ) -> Result<Value, HandlerError> {
        let handler = self
            .get(operation.op_type)
            .ok_or(HandlerError::Unsupported(operation.op_type))?;
        handler.handle(operation, cancel).await
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<(&str, &str)> = self
            .handlers
            .iter()
            .map(|(ty, h)| (ty.as_str(), h.name()))
            .collect();
        names.sort();
        f.debug_struct("HandlerSet").field("handlers", &names).finish()
    }
}
