//! Registry error types

use fleet_store::StoreError;
use fleet_types::{ClusterId, OperationId};
use thiserror::Error;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No registration exists for the cluster
    #[error("Agent not registered for cluster {0}")]
    AgentNotFound(ClusterId),

    #[error("Cluster not found: {0}")]
    ClusterNotFound(ClusterId),

    #[error("Operation not found: {0}")]
    OperationNotFound(OperationId),

    /// Dispatch target has no live registration
    #[error("No agent connected for cluster {0}")]
    NotConnected(ClusterId),

    #[error("Agent queue for cluster {0} is full")]
    QueueFull(ClusterId),

    #[error("Registry is shutting down")]
    ShuttingDown,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
