//! Store error types

use fleet_types::{OperationId, OperationStatus};
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Operation not found: {0}")]
    OperationNotFound(OperationId),

    #[error("Operation already exists: {0}")]
    OperationAlreadyExists(OperationId),

    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("Cluster already exists: {0}")]
    ClusterAlreadyExists(String),

    /// The state machine forbids the requested move
    #[error("Invalid transition for operation {id}: {from} -> {to}")]
    InvalidTransition {
        id: OperationId,
        from: OperationStatus,
        to: OperationStatus,
    },

    /// A compare-and-set found a different status than expected
    #[error("Status conflict for operation {id}: expected {expected}, found {actual}")]
    StatusConflict {
        id: OperationId,
        expected: OperationStatus,
        actual: OperationStatus,
    },

    #[error("Storage error: {0}")]
    Backend(String),
}

impl StoreError {
    /// True when the row exists but its current status forbids the write
    pub fn is_status_rejection(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidTransition { .. } | StoreError::StatusConflict { .. }
        )
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
