//! Orchestrator error types

use fleet_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Dispatch queue saturated; the caller may retry later
    #[error("Dispatch queue is full")]
    QueueFull,

    #[error("Cancellation queue is full")]
    CancellationQueueFull,

    #[error("Orchestrator is stopped")]
    Stopped,

    #[error("Orchestrator already started")]
    AlreadyStarted,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
