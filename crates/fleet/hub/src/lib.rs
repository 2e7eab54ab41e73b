//! Fleet Hub library
//!
//! This module provides the core components for the fleet hub:
//! - Dispatch bridge between the orchestrator and connected agents
//! - Hub configuration
//! - Server lifecycle management

pub mod bridge;
pub mod config;
pub mod error;
pub mod server;

pub use bridge::AgentDispatchBridge;
pub use config::HubConfig;
pub use error::{HubError, HubResult};
pub use server::{serve, serve_with_listener, shutdown_signal, Hub};
