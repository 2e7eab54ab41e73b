//! Configuration for fleetd

use fleet_observability::LoggingConfig;
use fleet_orchestrator::OrchestratorConfig;
use fleet_registry::RegistryConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Main hub configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubConfig {
    /// gRPC server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Worker pool and queue sizing
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Agent connection settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// gRPC server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address for the agent service
    #[serde(default = "default_grpc_listen_addr")]
    pub grpc_listen_addr: SocketAddr,

    /// HTTP/2 keepalive ping interval in seconds
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval_secs: u64,

    /// How long to wait for a keepalive ack in seconds
    #[serde(default = "default_keepalive_timeout")]
    pub keepalive_timeout_secs: u64,

    /// Serve TLS when set
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            grpc_listen_addr: default_grpc_listen_addr(),
            keepalive_interval_secs: default_keepalive_interval(),
            keepalive_timeout_secs: default_keepalive_timeout(),
            tls: None,
        }
    }
}

/// PEM-encoded server identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

fn default_grpc_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 50051))
}

fn default_keepalive_interval() -> u64 {
    30
}

fn default_keepalive_timeout() -> u64 {
    10
}

impl HubConfig {
    /// Layer defaults, an optional file and `FLEET_HUB_*` environment variables.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `FLEET_HUB_SERVER__GRPC_LISTEN_ADDR`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&HubConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("FLEET_HUB")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
