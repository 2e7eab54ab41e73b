//! Agent error types

use fleet_proto::ConvertError;
use fleet_types::OperationId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// No in-flight execution for the operation
    #[error("Operation not found: {0}")]
    NotFound(OperationId),

    #[error("Agent is shutting down")]
    ShuttingDown,

    #[error("Inspector error: {0}")]
    Inspector(String),

    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Hub returned {}: {}", .0.code(), .0.message())]
    Rpc(#[from] tonic::Status),

    #[error("Invalid message from hub: {0}")]
    Convert(#[from] ConvertError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for AgentError {
    fn from(e: config::ConfigError) -> Self {
        AgentError::Config(e.to_string())
    }
}

impl AgentError {
    /// The hub no longer knows this registration
    pub fn is_not_found(&self) -> bool {
        matches!(self, AgentError::Rpc(status) if status.code() == tonic::Code::NotFound)
    }
}

/// Result type for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
