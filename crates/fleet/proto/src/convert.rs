//! Conversions between the fleet model and the wire messages
//!
//! Payloads and results travel as JSON-encoded objects; timestamps as unix
//! milliseconds.

use crate::pb::fleet::agent::v1 as pb;
use chrono::{DateTime, TimeZone, Utc};
use fleet_types::{
    ClusterHealth, ClusterId, ClusterInfo, Operation, OperationId, OperationStatus, UnknownVariant,
};
use serde_json::{Map, Value};
use thiserror::Error;

/// A wire message could not be mapped onto the model
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid {field}: {source}")]
    InvalidId {
        field: &'static str,
        source: uuid::Error,
    },

    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariant),

    #[error("invalid JSON in {field}: {source}")]
    InvalidJson {
        field: &'static str,
        source: serde_json::Error,
    },

    #[error("{field} must be a JSON object")]
    NotAnObject { field: &'static str },
}

pub fn datetime_to_unix_ms(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Zero or out-of-range values mean "now"
pub fn unix_ms_to_datetime(ms: i64) -> DateTime<Utc> {
    if ms <= 0 {
        return Utc::now();
    }
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn encode_json(value: &Value) -> String {
    value.to_string()
}

/// Decode a JSON object field. An empty string decodes to `{}`.
pub fn decode_json(field: &'static str, raw: &str) -> Result<Value, ConvertError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let value: Value =
        serde_json::from_str(raw).map_err(|source| ConvertError::InvalidJson { field, source })?;
    if !value.is_object() {
        return Err(ConvertError::NotAnObject { field });
    }
    Ok(value)
}

pub fn parse_operation_id(raw: &str) -> Result<OperationId, ConvertError> {
    raw.parse().map_err(|source| ConvertError::InvalidId {
        field: "operation_id",
        source,
    })
}

pub fn parse_cluster_id(raw: &str) -> Result<ClusterId, ConvertError> {
    raw.parse().map_err(|source| ConvertError::InvalidId {
        field: "cluster_id",
        source,
    })
}

fn count_to_wire(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

fn count_from_wire(count: i32) -> u32 {
    u32::try_from(count).unwrap_or(0)
}

impl From<&ClusterInfo> for pb::ClusterInfo {
    fn from(info: &ClusterInfo) -> Self {
        Self {
            kubernetes_version: info.kubernetes_version.clone(),
            platform: info.platform.clone(),
            node_count: count_to_wire(info.node_count),
            region: info.region.clone(),
            labels: info
                .labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

impl From<pb::ClusterInfo> for ClusterInfo {
    fn from(info: pb::ClusterInfo) -> Self {
        Self {
            kubernetes_version: info.kubernetes_version,
            platform: info.platform,
            node_count: count_from_wire(info.node_count),
            region: info.region,
            labels: info.labels.into_iter().collect(),
        }
    }
}

impl From<&ClusterHealth> for pb::ClusterStatus {
    fn from(health: &ClusterHealth) -> Self {
        Self {
            status: health.status.clone(),
            ready_nodes: count_to_wire(health.ready_nodes),
            total_nodes: count_to_wire(health.total_nodes),
            issues: health.issues.clone(),
            last_check: datetime_to_unix_ms(health.last_check),
        }
    }
}

impl From<pb::ClusterStatus> for ClusterHealth {
    fn from(status: pb::ClusterStatus) -> Self {
        Self {
            status: status.status,
            ready_nodes: count_from_wire(status.ready_nodes),
            total_nodes: count_from_wire(status.total_nodes),
            issues: status.issues,
            last_check: unix_ms_to_datetime(status.last_check),
        }
    }
}

/// Wire form of an operation about to be streamed to its agent
pub fn operation_to_wire(op: &Operation) -> pb::Operation {
    let timeout_seconds = op
        .payload
        .get("timeout_seconds")
        .and_then(Value::as_i64)
        .and_then(|secs| i32::try_from(secs).ok())
        .unwrap_or(0);

    pb::Operation {
        id: op.id.to_string(),
        cluster_id: op.cluster_id.to_string(),
        r#type: op.op_type.as_str().to_string(),
        payload: encode_json(&op.payload),
        created_at: datetime_to_unix_ms(op.created_at),
        timeout_seconds,
    }
}

/// Rebuild an operation received from the hub. It is already running there.
pub fn operation_from_wire(msg: pb::Operation) -> Result<Operation, ConvertError> {
    let created_at = unix_ms_to_datetime(msg.created_at);
    Ok(Operation {
        id: parse_operation_id(&msg.id)?,
        cluster_id: parse_cluster_id(&msg.cluster_id)?,
        op_type: msg.r#type.parse()?,
        status: OperationStatus::Running,
        payload: decode_json("payload", &msg.payload)?,
        result: None,
        started_at: Some(Utc::now()),
        finished_at: None,
        created_at,
        updated_at: created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_types::OperationType;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_operation_survives_the_wire() {
        let op = Operation::new(
            ClusterId::generate(),
            OperationType::Exec,
            json!({"command": ["kubectl", "get", "pods"], "timeout_seconds": 90}),
        );

        let wire = operation_to_wire(&op);
        assert_eq!(wire.r#type, "exec");
        assert_eq!(wire.timeout_seconds, 90);

        let back = operation_from_wire(wire).unwrap();
        assert_eq!(back.id, op.id);
        assert_eq!(back.cluster_id, op.cluster_id);
        assert_eq!(back.op_type, OperationType::Exec);
        assert_eq!(back.payload, op.payload);
        assert_eq!(
            datetime_to_unix_ms(back.created_at),
            datetime_to_unix_ms(op.created_at)
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut wire = operation_to_wire(&Operation::new(
            ClusterId::generate(),
            OperationType::Apply,
            json!({}),
        ));
        wire.r#type = "restart".to_string();
        assert!(matches!(
            operation_from_wire(wire),
            Err(ConvertError::UnknownVariant(_))
        ));
    }

    #[test]
    fn test_decode_json_rules() {
        assert_eq!(decode_json("result", "").unwrap(), json!({}));
        assert_eq!(decode_json("result", r#"{"a":1}"#).unwrap(), json!({"a": 1}));
        assert!(matches!(
            decode_json("result", "[1,2]"),
            Err(ConvertError::NotAnObject { field: "result" })
        ));
        assert!(matches!(
            decode_json("result", "{"),
            Err(ConvertError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_cluster_info_labels_and_counts() {
        let info = ClusterInfo {
            kubernetes_version: "v1.30.1".to_string(),
            platform: "gke".to_string(),
            node_count: 4,
            region: "europe-west1".to_string(),
            labels: BTreeMap::from([("team".to_string(), "infra".to_string())]),
        };
        let wire = pb::ClusterInfo::from(&info);
        assert_eq!(wire.labels.get("team").map(String::as_str), Some("infra"));

        let mut negative = wire.clone();
        negative.node_count = -3;
        assert_eq!(ClusterInfo::from(negative).node_count, 0);
        assert_eq!(ClusterInfo::from(wire), info);
    }

    #[test]
    fn test_bad_ids() {
        assert!(matches!(
            parse_cluster_id("not-a-uuid"),
            Err(ConvertError::InvalidId {
                field: "cluster_id",
                ..
            })
        ));
    }
}
