//! Connection to the hub's AgentService

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleet_proto::convert::{
    datetime_to_unix_ms, encode_json, operation_from_wire, parse_cluster_id,
};
use fleet_proto::v1::agent_service_client::AgentServiceClient;
use fleet_proto::v1::{
    HeartbeatRequest, RegisterRequest, ReportResultRequest, StreamOperationsRequest,
};
use fleet_types::{ClusterHealth, ClusterId, ClusterInfo, Operation, OperationId};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use std::time::Duration;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};

/// Operations pushed by the hub, in delivery order
pub type OperationFeed = BoxStream<'static, Result<Operation>>;

/// What the hub handed back on registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub cluster_id: ClusterId,
    pub session_token: String,
    pub heartbeat_interval_secs: u64,
}

/// Final outcome of one executed operation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationReport {
    pub operation_id: OperationId,
    pub cluster_id: ClusterId,
    pub success: bool,
    pub message: String,
    pub result: Value,
    pub completed_at: DateTime<Utc>,
}

/// The RPCs the runtime needs from the hub
#[async_trait]
pub trait HubClient: Send + Sync {
    async fn register(
        &self,
        cluster_name: &str,
        agent_version: &str,
        info: &ClusterInfo,
    ) -> Result<Session>;

    async fn heartbeat(&self, cluster_id: ClusterId, health: &ClusterHealth) -> Result<()>;

    async fn stream_operations(&self, session: &Session) -> Result<OperationFeed>;

    async fn report_result(&self, report: OperationReport) -> Result<()>;
}

/// tonic-backed [`HubClient`]
#[derive(Clone)]
pub struct GrpcHubClient {
    inner: AgentServiceClient<Channel>,
}

impl GrpcHubClient {
    /// Build a lazily connecting channel to `config.hub_endpoint`.
    ///
    /// The channel reconnects on its own; RPCs fail with `Unavailable` while
    /// the hub is unreachable.
    pub fn connect(config: &AgentConfig) -> Result<Self> {
        let mut endpoint = Endpoint::from_shared(config.hub_endpoint.clone())
            .map_err(|e| {
                AgentError::Config(format!("invalid hub endpoint {}: {e}", config.hub_endpoint))
            })?
            .connect_timeout(Duration::from_secs(10))
            .http2_keep_alive_interval(Duration::from_secs(config.keepalive_interval_secs))
            .keep_alive_timeout(Duration::from_secs(config.keepalive_timeout_secs))
            .keep_alive_while_idle(true);

        if config.use_tls() {
            endpoint = endpoint.tls_config(tls_config(config)?)?;
        }

        tracing::info!(
            endpoint = %config.hub_endpoint,
            tls = config.use_tls(),
            "Configured hub connection"
        );
        Ok(Self::from_channel(endpoint.connect_lazy()))
    }

    pub fn from_channel(channel: Channel) -> Self {
        Self {
            inner: AgentServiceClient::new(channel),
        }
    }
}

fn tls_config(config: &AgentConfig) -> Result<ClientTlsConfig> {
    let mut tls = ClientTlsConfig::new();
    if let Some(settings) = &config.tls {
        if let Some(path) = &settings.ca_cert_path {
            let pem = std::fs::read(path)?;
            tls = tls.ca_certificate(Certificate::from_pem(pem));
        }
        if let Some(domain) = &settings.domain_name {
            tls = tls.domain_name(domain.clone());
        }
    }
    Ok(tls)
}

#[async_trait]
impl HubClient for GrpcHubClient {
    async fn register(
        &self,
        cluster_name: &str,
        agent_version: &str,
        info: &ClusterInfo,
    ) -> Result<Session> {
        let resp = self
            .inner
            .clone()
            .register(RegisterRequest {
                cluster_name: cluster_name.to_string(),
                agent_version: agent_version.to_string(),
                cluster_info: Some(info.into()),
            })
            .await?
            .into_inner();

        Ok(Session {
            cluster_id: parse_cluster_id(&resp.cluster_id)?,
            session_token: resp.session_token,
            heartbeat_interval_secs: u64::try_from(resp.heartbeat_interval_seconds).unwrap_or(0),
        })
    }

    async fn heartbeat(&self, cluster_id: ClusterId, health: &ClusterHealth) -> Result<()> {
        self.inner
            .clone()
            .heartbeat(HeartbeatRequest {
                cluster_id: cluster_id.to_string(),
                status: Some(health.into()),
            })
            .await?;
        Ok(())
    }

    async fn stream_operations(&self, session: &Session) -> Result<OperationFeed> {
        let stream = self
            .inner
            .clone()
            .stream_operations(StreamOperationsRequest {
                cluster_id: session.cluster_id.to_string(),
                session_token: session.session_token.clone(),
            })
            .await?
            .into_inner();

        Ok(stream
            .map(|item| -> Result<Operation> {
                let wire = item?;
                Ok(operation_from_wire(wire)?)
            })
            .boxed())
    }

    async fn report_result(&self, report: OperationReport) -> Result<()> {
        self.inner
            .clone()
            .report_result(ReportResultRequest {
                operation_id: report.operation_id.to_string(),
                cluster_id: report.cluster_id.to_string(),
                success: report.success,
                message: report.message,
                result: encode_json(&report.result),
                completed_at: datetime_to_unix_ms(report.completed_at),
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentTlsConfig;

    #[tokio::test]
    async fn test_connect_is_lazy() {
        let config = AgentConfig {
            hub_endpoint: "http://127.0.0.1:1".to_string(),
            ..AgentConfig::default()
        };
        assert!(GrpcHubClient::connect(&config).is_ok());
    }

    #[tokio::test]
    async fn test_rejects_malformed_endpoint() {
        let config = AgentConfig {
            hub_endpoint: "not a uri".to_string(),
            ..AgentConfig::default()
        };
        assert!(matches!(
            GrpcHubClient::connect(&config),
            Err(AgentError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_ca_file() {
        let config = AgentConfig {
            hub_endpoint: "https://127.0.0.1:50051".to_string(),
            tls: Some(AgentTlsConfig {
                ca_cert_path: Some("/nonexistent/ca.pem".into()),
                domain_name: None,
            }),
            ..AgentConfig::default()
        };
        assert!(matches!(GrpcHubClient::connect(&config), Err(AgentError::Io(_))));
    }
}
