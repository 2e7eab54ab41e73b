//! Fleet Agent - runs inside a managed cluster
//!
//! The agent registers with the hub, keeps a heartbeat going, and executes the
//! operations the hub streams to it under cancellation, reporting each result
//! exactly once.

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod inspector;
pub mod runtime;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{GrpcHubClient, HubClient, OperationFeed, OperationReport, Session};
pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use executor::Executor;
pub use handlers::DryRunHandler;
pub use inspector::{ClusterInspector, StaticInspector};
pub use runtime::AgentRuntime;
