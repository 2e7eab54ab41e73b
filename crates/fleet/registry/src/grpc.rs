use crate::connection::OperationStream;
use crate::error::RegistryError;
use crate::registry::{AgentRegistry, ResultReport};
use fleet_proto::convert::{
    datetime_to_unix_ms, decode_json, operation_to_wire, parse_cluster_id, parse_operation_id,
    unix_ms_to_datetime,
};
use fleet_proto::v1::agent_service_server::{AgentService, AgentServiceServer};
use fleet_proto::v1::{
    CancelOperationRequest, CancelOperationResponse, HeartbeatRequest, HeartbeatResponse,
    LogEntry, MetricSample, Operation as WireOperation, RegisterRequest, RegisterResponse,
    ReportResultRequest, ReportResultResponse, StreamLogsResponse, StreamMetricsResponse,
    StreamOperationsRequest,
};
use fleet_proto::ConvertError;
use fleet_types::{ClusterHealth, ClusterId, ClusterInfo};
use std::collections::HashSet;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_stream::Stream;
use tonic::{Request, Response, Status, Streaming};

/// tonic front-end for [`AgentRegistry`]
#[derive(Clone)]
pub struct AgentServiceImpl {
    registry: Arc<AgentRegistry>,
}

impl AgentServiceImpl {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    pub fn into_server(self) -> AgentServiceServer<Self> {
        AgentServiceServer::new(self)
    }

    /// Telemetry is accepted only from clusters the hub knows about
    async fn is_known(&self, raw: &str, seen: &mut HashSet<ClusterId>) -> bool {
        let Ok(cluster_id) = parse_cluster_id(raw) else {
            return false;
        };
        if seen.contains(&cluster_id) {
            return true;
        }
        match self.registry.known_cluster(cluster_id).await {
            Ok(_) => {
                seen.insert(cluster_id);
                true
            }
            Err(_) => false,
        }
    }
}

#[tonic::async_trait]
impl AgentService for AgentServiceImpl {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let req = request.into_inner();
        let info: ClusterInfo = req.cluster_info.map(Into::into).unwrap_or_default();

        let registration = self
            .registry
            .register(&req.cluster_name, &req.agent_version, info)
            .await
            .map_err(registry_error_to_status)?;

        Ok(Response::new(RegisterResponse {
            cluster_id: registration.cluster_id.to_string(),
            session_token: registration.session_token,
            heartbeat_interval_seconds: i32::try_from(registration.heartbeat_interval_secs)
                .unwrap_or(i32::MAX),
        }))
    }

    async fn heartbeat(
        &self,
        request: Request<HeartbeatRequest>,
    ) -> Result<Response<HeartbeatResponse>, Status> {
        let req = request.into_inner();
        let cluster_id = parse_cluster_id(&req.cluster_id).map_err(convert_error_to_status)?;
        let health: Option<ClusterHealth> = req.status.map(Into::into);

        let server_time = self
            .registry
            .heartbeat(cluster_id, health)
            .await
            .map_err(registry_error_to_status)?;

        Ok(Response::new(HeartbeatResponse {
            acknowledged: true,
            server_time: datetime_to_unix_ms(server_time),
        }))
    }

    type StreamOperationsStream = AgentOperationStream;

    async fn stream_operations(
        &self,
        request: Request<StreamOperationsRequest>,
    ) -> Result<Response<Self::StreamOperationsStream>, Status> {
        let req = request.into_inner();
        let cluster_id = parse_cluster_id(&req.cluster_id).map_err(convert_error_to_status)?;
        let stream = self
            .registry
            .open_stream(cluster_id, &req.session_token)
            .map_err(registry_error_to_status)?;

        tracing::info!(cluster_id = %cluster_id, "Operation stream opened");
        Ok(Response::new(AgentOperationStream {
            stream,
            registry: self.registry.clone(),
        }))
    }

    async fn report_result(
        &self,
        request: Request<ReportResultRequest>,
    ) -> Result<Response<ReportResultResponse>, Status> {
        let req = request.into_inner();
        let report = ResultReport {
            operation_id: parse_operation_id(&req.operation_id).map_err(convert_error_to_status)?,
            cluster_id: parse_cluster_id(&req.cluster_id).map_err(convert_error_to_status)?,
            success: req.success,
            message: req.message,
            result: decode_json("result", &req.result).map_err(convert_error_to_status)?,
            completed_at: unix_ms_to_datetime(req.completed_at),
        };

        self.registry
            .report_result(report)
            .await
            .map_err(registry_error_to_status)?;

        Ok(Response::new(ReportResultResponse { acknowledged: true }))
    }

    async fn cancel_operation(
        &self,
        request: Request<CancelOperationRequest>,
    ) -> Result<Response<CancelOperationResponse>, Status> {
        let req = request.into_inner();
        let operation_id = parse_operation_id(&req.operation_id).map_err(convert_error_to_status)?;
        let cluster_id = if req.cluster_id.is_empty() {
            None
        } else {
            Some(parse_cluster_id(&req.cluster_id).map_err(convert_error_to_status)?)
        };

        let cancelled = self
            .registry
            .cancel_operation(operation_id, cluster_id, &req.reason)
            .await
            .map_err(registry_error_to_status)?;

        Ok(Response::new(CancelOperationResponse {
            cancelled: true,
            message: format!("operation {} cancelled", cancelled.id),
        }))
    }

    async fn stream_logs(
        &self,
        request: Request<Streaming<LogEntry>>,
    ) -> Result<Response<StreamLogsResponse>, Status> {
        let mut entries = request.into_inner();
        let mut seen = HashSet::new();
        let mut accepted = 0u64;

        while let Some(entry) = entries.message().await? {
            if !self.is_known(&entry.cluster_id, &mut seen).await {
                tracing::debug!(cluster_id = %entry.cluster_id, "Dropping log entry from unknown cluster");
                continue;
            }
            emit_agent_log(&entry);
            accepted += 1;
        }

        self.registry.record_telemetry("log", accepted);
        Ok(Response::new(StreamLogsResponse { accepted }))
    }

    async fn stream_metrics(
        &self,
        request: Request<Streaming<MetricSample>>,
    ) -> Result<Response<StreamMetricsResponse>, Status> {
        let mut samples = request.into_inner();
        let mut seen = HashSet::new();
        let mut accepted = 0u64;

        while let Some(sample) = samples.message().await? {
            if !self.is_known(&sample.cluster_id, &mut seen).await || sample.name.is_empty() {
                continue;
            }
            tracing::trace!(
                cluster_id = %sample.cluster_id,
                name = %sample.name,
                value = sample.value,
                "Agent metric sample"
            );
            accepted += 1;
        }

        self.registry.record_telemetry("metric", accepted);
        Ok(Response::new(StreamMetricsResponse { accepted }))
    }
}

/// Response body of `StreamOperations`.
///
/// Operations leave the agent queue only when the transport polls for the
/// next message, so the queue capacity alone bounds undelivered work. The
/// stream ends once its registration is replaced or removed; dropping it
/// releases the registration it was opened for.
pub struct AgentOperationStream {
    stream: OperationStream,
    registry: Arc<AgentRegistry>,
}

impl std::fmt::Debug for AgentOperationStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentOperationStream")
            .field("stream", &self.stream)
            .finish_non_exhaustive()
    }
}

impl Stream for AgentOperationStream {
    type Item = Result<WireOperation, Status>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.stream.poll_recv(cx) {
            Poll::Ready(Some(operation)) => {
                tracing::debug!(
                    cluster_id = %this.stream.cluster_id,
                    operation_id = %operation.id,
                    "Operation sent to agent"
                );
                Poll::Ready(Some(Ok(operation_to_wire(&operation))))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for AgentOperationStream {
    fn drop(&mut self) {
        let cluster_id = self.stream.cluster_id;
        let session_token = std::mem::take(&mut self.stream.session_token);
        let registry = self.registry.clone();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = registry.release_stream(cluster_id, &session_token).await {
                        tracing::error!(cluster_id = %cluster_id, error = %e, "Failed to tear down agent connection");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(cluster_id = %cluster_id, "Operation stream dropped outside a runtime");
            }
        }
    }
}

fn emit_agent_log(entry: &LogEntry) {
    let cluster_id = entry.cluster_id.as_str();
    let operation_id = entry.operation_id.as_str();
    let message = entry.message.as_str();
    match entry.level.to_ascii_lowercase().as_str() {
        "error" => tracing::error!(target: "fleet::agent", cluster_id, operation_id, "{message}"),
        "warn" | "warning" => {
            tracing::warn!(target: "fleet::agent", cluster_id, operation_id, "{message}")
        }
        "debug" => tracing::debug!(target: "fleet::agent", cluster_id, operation_id, "{message}"),
        "trace" => tracing::trace!(target: "fleet::agent", cluster_id, operation_id, "{message}"),
        _ => tracing::info!(target: "fleet::agent", cluster_id, operation_id, "{message}"),
    }
}

pub fn registry_error_to_status(err: RegistryError) -> Status {
    match err {
        RegistryError::AgentNotFound(_)
        | RegistryError::ClusterNotFound(_)
        | RegistryError::OperationNotFound(_) => Status::not_found(err.to_string()),
        RegistryError::NotConnected(_) | RegistryError::ShuttingDown => {
            Status::unavailable(err.to_string())
        }
        RegistryError::QueueFull(_) => Status::resource_exhausted(err.to_string()),
        RegistryError::InvalidArgument(message) => Status::invalid_argument(message),
        RegistryError::FailedPrecondition(message) => Status::failed_precondition(message),
        RegistryError::Store(e) => Status::internal(e.to_string()),
    }
}

fn convert_error_to_status(err: ConvertError) -> Status {
    Status::invalid_argument(err.to_string())
}
