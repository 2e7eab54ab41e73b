//! Fleet Registry - the hub side of the agent protocol
//!
//! Tracks one [`registry::AgentRegistry`] connection per cluster, each with a
//! bounded outbound operation queue, and serves `fleet.agent.v1.AgentService`
//! on top of it. Completion reports from agents are written to the operation
//! store here.

pub mod config;
pub mod connection;
pub mod error;
pub mod grpc;
pub mod registry;

pub use config::RegistryConfig;
pub use connection::{ConnectionInfo, OperationStream, Registration};
pub use error::{RegistryError, Result};
pub use grpc::{registry_error_to_status, AgentServiceImpl};
pub use registry::{AgentRegistry, ResultReport};
