//! Operation model and its status state machine
//!
//! An [`Operation`] is a unit of work that targets exactly one cluster. Its
//! status only ever moves forward:
//!
//! ```text
//! queued ──► running ──► success | failed | cancelled
//!    └──────────────────► cancelled
//! ```
//!
//! Terminal statuses admit no further transitions. Stores enforce this with
//! [`OperationStatus::can_transition_to`].

use crate::{ClusterId, OperationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Kind of work an operation performs against its cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Apply,
    Exec,
    Sync,
    Delete,
}

impl OperationType {
    pub const ALL: [OperationType; 4] = [
        OperationType::Apply,
        OperationType::Exec,
        OperationType::Sync,
        OperationType::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Apply => "apply",
            OperationType::Exec => "exec",
            OperationType::Sync => "sync",
            OperationType::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apply" => Ok(OperationType::Apply),
            "exec" => Ok(OperationType::Exec),
            "sync" => Ok(OperationType::Sync),
            "delete" => Ok(OperationType::Delete),
            other => Err(UnknownVariant {
                kind: "operation type",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle status of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Queued,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Queued => "queued",
            OperationStatus::Running => "running",
            OperationStatus::Success => "success",
            OperationStatus::Failed => "failed",
            OperationStatus::Cancelled => "cancelled",
        }
    }

    /// Success, failed and cancelled are final.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationStatus::Success | OperationStatus::Failed | OperationStatus::Cancelled
        )
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: OperationStatus) -> bool {
        use OperationStatus::*;
        matches!(
            (self, next),
            (Queued, Running)
                | (Queued, Cancelled)
                | (Running, Success)
                | (Running, Failed)
                | (Running, Cancelled)
        )
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(OperationStatus::Queued),
            "running" => Ok(OperationStatus::Running),
            "success" => Ok(OperationStatus::Success),
            "failed" => Ok(OperationStatus::Failed),
            "cancelled" => Ok(OperationStatus::Cancelled),
            other => Err(UnknownVariant {
                kind: "operation status",
                value: other.to_string(),
            }),
        }
    }
}

/// Returned when parsing an enum from an unrecognised string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// A unit of work targeting one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub cluster_id: ClusterId,
    pub op_type: OperationType,
    pub status: OperationStatus,

    /// Opaque key-value document interpreted by the type handler
    pub payload: Value,

    /// Opaque key-value document written on completion
    pub result: Option<Value>,

    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Operation {
    /// Create a new queued operation
    pub fn new(cluster_id: ClusterId, op_type: OperationType, payload: Value) -> Self {
        let now = Utc::now();
        Self {
            id: OperationId::generate(),
            cluster_id,
            op_type,
            status: OperationStatus::Queued,
            payload,
            result: None,
            started_at: None,
            finished_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Wall-clock time between start and finish, when both are known
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_operation_is_queued() {
        let op = Operation::new(ClusterId::generate(), OperationType::Apply, json!({}));
        assert_eq!(op.status, OperationStatus::Queued);
        assert!(op.result.is_none());
        assert!(op.started_at.is_none());
    }

    #[test]
    fn test_terminal_statuses_admit_no_transitions() {
        let all = [
            OperationStatus::Queued,
            OperationStatus::Running,
            OperationStatus::Success,
            OperationStatus::Failed,
            OperationStatus::Cancelled,
        ];
        for from in [
            OperationStatus::Success,
            OperationStatus::Failed,
            OperationStatus::Cancelled,
        ] {
            for to in all {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn test_queued_cannot_skip_to_success() {
        assert!(!OperationStatus::Queued.can_transition_to(OperationStatus::Success));
        assert!(!OperationStatus::Queued.can_transition_to(OperationStatus::Failed));
        assert!(OperationStatus::Queued.can_transition_to(OperationStatus::Cancelled));
        assert!(OperationStatus::Running.can_transition_to(OperationStatus::Cancelled));
    }

    #[test]
    fn test_type_parses_wire_names() {
        for ty in OperationType::ALL {
            assert_eq!(ty.as_str().parse::<OperationType>().unwrap(), ty);
        }
        assert!("restart".parse::<OperationType>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let value = serde_json::to_value(OperationStatus::Cancelled).unwrap();
        assert_eq!(value, json!("cancelled"));
    }
}
