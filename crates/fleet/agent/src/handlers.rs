//! Built-in operation handlers

use async_trait::async_trait;
use fleet_types::{HandlerError, Operation, OperationHandler};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

/// Acknowledges operations without touching the cluster.
///
/// The result echoes the payload's top-level keys so a caller can see what
/// would have been acted on.
#[derive(Debug, Clone, Default)]
pub struct DryRunHandler;

#[async_trait]
impl OperationHandler for DryRunHandler {
    async fn handle(
        &self,
        operation: &Operation,
        cancel: CancellationToken,
    ) -> Result<Value, HandlerError> {
        if cancel.is_cancelled() {
            return Err(HandlerError::Cancelled);
        }
        let payload = operation
            .payload
            .as_object()
            .ok_or_else(|| HandlerError::InvalidPayload("payload must be an object".to_string()))?;

        let mut keys: Vec<&str> = payload.keys().map(String::as_str).collect();
        keys.sort_unstable();

        tracing::info!(
            operation_id = %operation.id,
            op_type = %operation.op_type,
            "Dry-run operation acknowledged"
        );
        Ok(json!({
            "dry_run": true,
            "type": operation.op_type.as_str(),
            "payload_keys": keys,
        }))
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_types::{ClusterId, OperationType};

    #[tokio::test]
    async fn test_dry_run_echoes_payload_keys() {
        let op = Operation::new(
            ClusterId::generate(),
            OperationType::Apply,
            json!({"namespace": "web", "manifest": "kind: Deployment"}),
        );
        let result = DryRunHandler
            .handle(&op, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            result,
            json!({"dry_run": true, "type": "apply", "payload_keys": ["manifest", "namespace"]})
        );
    }

    #[tokio::test]
    async fn test_dry_run_honours_cancellation() {
        let op = Operation::new(ClusterId::generate(), OperationType::Delete, json!({}));
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(
            DryRunHandler.handle(&op, token).await,
            Err(HandlerError::Cancelled)
        ));
    }
}
