//! Operation persistence
//!
//! Every status write goes through the state machine in
//! [`OperationStatus::can_transition_to`]; implementations must apply the check
//! and the write atomically for a single row.

use crate::error::{Result, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use fleet_types::{ClusterId, Operation, OperationId, OperationStatus};
use serde_json::Value;

/// Durable storage for operations
#[async_trait]
pub trait OperationStore: Send + Sync {
    /// Persist a new operation
    async fn create(&self, operation: Operation) -> Result<Operation>;

    /// Get an operation by ID
    async fn get_by_id(&self, id: &OperationId) -> Result<Option<Operation>>;

    /// Compare-and-set the status: succeeds only if the current status is
    /// `expected` and the move to `next` is legal
    async fn update_status(
        &self,
        id: &OperationId,
        expected: OperationStatus,
        next: OperationStatus,
    ) -> Result<Operation>;

    /// Replace the result document of a non-terminal operation
    async fn update_result(&self, id: &OperationId, result: Value) -> Result<Operation>;

    /// queued -> running, stamping `started_at`
    async fn set_started(&self, id: &OperationId) -> Result<Operation>;

    /// Move to a terminal status, stamping `finished_at` and storing the result
    async fn set_finished(
        &self,
        id: &OperationId,
        status: OperationStatus,
        result: Option<Value>,
    ) -> Result<Operation>;

    /// Cancel a queued or running operation, recording `result`
    async fn cancel_operation(&self, id: &OperationId, result: Value) -> Result<Operation>;

    /// List operations for a cluster, oldest first
    async fn list_by_cluster(&self, cluster_id: &ClusterId) -> Result<Vec<Operation>>;
}

/// In-memory operation store for development and testing
pub struct InMemoryOperationStore {
    operations: DashMap<OperationId, Operation>,
}

impl InMemoryOperationStore {
    pub fn new() -> Self {
        Self {
            operations: DashMap::new(),
        }
    }

    /// Apply a status move to a row under its shard lock
    fn transition<F>(&self, id: &OperationId, next: OperationStatus, guard: F) -> Result<Operation>
    where
        F: FnOnce(&Operation) -> Result<()>,
    {
        let mut entry = self
            .operations
            .get_mut(id)
            .ok_or(StoreError::OperationNotFound(*id))?;
        let op = entry.value_mut();

        guard(op)?;
        if !op.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                id: *id,
                from: op.status,
                to: next,
            });
        }

        let now = Utc::now();
        op.status = next;
        op.updated_at = now;
        if next == OperationStatus::Running {
            op.started_at = Some(now);
        }
        if next.is_terminal() {
            op.finished_at = Some(now);
        }
        Ok(op.clone())
    }
}

impl Default for InMemoryOperationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperationStore for InMemoryOperationStore {
    async fn create(&self, operation: Operation) -> Result<Operation> {
        let id = operation.id;
        match self.operations.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(StoreError::OperationAlreadyExists(id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(operation.clone());
                Ok(operation)
            }
        }
    }

    async fn get_by_id(&self, id: &OperationId) -> Result<Option<Operation>> {
        Ok(self.operations.get(id).map(|op| op.clone()))
    }

    async fn update_status(
        &self,
        id: &OperationId,
        expected: OperationStatus,
        next: OperationStatus,
    ) -> Result<Operation> {
        self.transition(id, next, |op| {
            if op.status != expected {
                return Err(StoreError::StatusConflict {
                    id: *id,
                    expected,
                    actual: op.status,
                });
            }
            Ok(())
        })
    }

    async fn update_result(&self, id: &OperationId, result: Value) -> Result<Operation> {
        let mut entry = self
            .operations
            .get_mut(id)
            .ok_or(StoreError::OperationNotFound(*id))?;
        let op = entry.value_mut();
        if op.status.is_terminal() {
            return Err(StoreError::InvalidTransition {
                id: *id,
                from: op.status,
                to: op.status,
            });
        }
        op.result = Some(result);
        op.updated_at = Utc::now();
        Ok(op.clone())
    }

    async fn set_started(&self, id: &OperationId) -> Result<Operation> {
        self.update_status(id, OperationStatus::Queued, OperationStatus::Running)
            .await
    }

    async fn set_finished(
        &self,
        id: &OperationId,
        status: OperationStatus,
        result: Option<Value>,
    ) -> Result<Operation> {
        if !status.is_terminal() {
            let current = self
                .operations
                .get(id)
                .map(|op| op.status)
                .ok_or(StoreError::OperationNotFound(*id))?;
            return Err(StoreError::InvalidTransition {
                id: *id,
                from: current,
                to: status,
            });
        }

        let mut entry = self
            .operations
            .get_mut(id)
            .ok_or(StoreError::OperationNotFound(*id))?;
        let op = entry.value_mut();
        if !op.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id: *id,
                from: op.status,
                to: status,
            });
        }

        let now = Utc::now();
        op.status = status;
        op.result = result;
        op.finished_at = Some(now);
        op.updated_at = now;
        Ok(op.clone())
    }

    async fn cancel_operation(&self, id: &OperationId, result: Value) -> Result<Operation> {
        let mut entry = self
            .operations
            .get_mut(id)
            .ok_or(StoreError::OperationNotFound(*id))?;
        let op = entry.value_mut();
        if !op.status.can_transition_to(OperationStatus::Cancelled) {
            return Err(StoreError::InvalidTransition {
                id: *id,
                from: op.status,
                to: OperationStatus::Cancelled,
            });
        }

        let now = Utc::now();
        op.status = OperationStatus::Cancelled;
        op.result = Some(result);
        op.finished_at = Some(now);
        op.updated_at = now;
        Ok(op.clone())
    }

    async fn list_by_cluster(&self, cluster_id: &ClusterId) -> Result<Vec<Operation>> {
        let mut ops: Vec<Operation> = self
            .operations
            .iter()
            .filter(|op| &op.cluster_id == cluster_id)
            .map(|op| op.value().clone())
            .collect();
        ops.sort_by_key(|op| op.created_at);
        Ok(ops)
    }
}
