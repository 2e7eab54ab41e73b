//! Configuration for fleet-agent

use fleet_observability::LoggingConfig;
use fleet_types::ClusterInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Environment variable that overrides the configured cluster name
pub const CLUSTER_NAME_ENV: &str = "FLEET_CLUSTER_NAME";

/// Agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hub gRPC endpoint, e.g. `http://hub:50051`
    #[serde(default = "default_hub_endpoint")]
    pub hub_endpoint: String,

    /// Dial with TLS when set or when the endpoint is `https://`
    #[serde(default)]
    pub tls: Option<AgentTlsConfig>,

    /// Cluster name to register under; generated when unset
    #[serde(default)]
    pub cluster_name: Option<String>,

    #[serde(default = "default_agent_version")]
    pub agent_version: String,

    /// Used until the hub hands out its own interval
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_operations: usize,

    /// Backoff between re-registration attempts
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,

    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval_secs: u64,

    #[serde(default = "default_keepalive_timeout")]
    pub keepalive_timeout_secs: u64,

    /// Metadata reported by the static inspector
    #[serde(default)]
    pub cluster: StaticClusterConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            hub_endpoint: default_hub_endpoint(),
            tls: None,
            cluster_name: None,
            agent_version: default_agent_version(),
            heartbeat_interval_secs: default_heartbeat_interval(),
            max_concurrent_operations: default_max_concurrent(),
            reconnect_delay_secs: default_reconnect_delay(),
            keepalive_interval_secs: default_keepalive_interval(),
            keepalive_timeout_secs: default_keepalive_timeout(),
            cluster: StaticClusterConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentTlsConfig {
    /// PEM CA bundle used to verify the hub
    #[serde(default)]
    pub ca_cert_path: Option<PathBuf>,

    /// Expected server name when it differs from the endpoint host
    #[serde(default)]
    pub domain_name: Option<String>,
}

/// Cluster metadata for deployments without a live cluster client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticClusterConfig {
    #[serde(default)]
    pub kubernetes_version: String,

    #[serde(default = "default_platform")]
    pub platform: String,

    #[serde(default)]
    pub region: String,

    #[serde(default = "default_node_count")]
    pub node_count: u32,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl Default for StaticClusterConfig {
    fn default() -> Self {
        Self {
            kubernetes_version: String::new(),
            platform: default_platform(),
            region: String::new(),
            node_count: default_node_count(),
            labels: BTreeMap::new(),
        }
    }
}

impl From<&StaticClusterConfig> for ClusterInfo {
    fn from(c: &StaticClusterConfig) -> Self {
        ClusterInfo {
            kubernetes_version: c.kubernetes_version.clone(),
            platform: c.platform.clone(),
            node_count: c.node_count,
            region: c.region.clone(),
            labels: c.labels.clone(),
        }
    }
}

fn default_hub_endpoint() -> String {
    "http://127.0.0.1:50051".to_string()
}

fn default_agent_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    10
}

fn default_reconnect_delay() -> u64 {
    5
}

fn default_keepalive_interval() -> u64 {
    30
}

fn default_keepalive_timeout() -> u64 {
    10
}

fn default_platform() -> String {
    "kubernetes".to_string()
}

fn default_node_count() -> u32 {
    1
}

impl AgentConfig {
    /// Layer defaults, an optional file and `FLEET_AGENT_*` environment
    /// variables (nested keys joined with `__`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&AgentConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("FLEET_AGENT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// TLS is used when configured or implied by the endpoint scheme
    pub fn use_tls(&self) -> bool {
        self.tls.is_some() || self.hub_endpoint.starts_with("https://")
    }

    /// `FLEET_CLUSTER_NAME`, then `cluster_name`, then `cluster-<8 hex>`
    pub fn resolve_cluster_name(&self) -> String {
        let from_env = std::env::var(CLUSTER_NAME_ENV).ok();
        pick_cluster_name(from_env.as_deref(), self.cluster_name.as_deref())
    }
}

fn pick_cluster_name(from_env: Option<&str>, configured: Option<&str>) -> String {
    [from_env, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(generated_cluster_name)
}

fn generated_cluster_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("cluster-{}", &id[..8])
}
