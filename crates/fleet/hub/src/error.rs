//! Hub error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] fleet_orchestrator::OrchestratorError),

    #[error("Registry error: {0}")]
    Registry(#[from] fleet_registry::RegistryError),

    #[error("Store error: {0}")]
    Store(#[from] fleet_store::StoreError),

    #[error("Observability error: {0}")]
    Observability(#[from] fleet_observability::ObservabilityError),

    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for HubError {
    fn from(e: config::ConfigError) -> Self {
        HubError::Config(e.to_string())
    }
}

/// Result type for hub operations
pub type HubResult<T> = std::result::Result<T, HubError>;
