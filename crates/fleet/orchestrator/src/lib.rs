//! Fleet Orchestrator - hub-side operation dispatch
//!
//! Operations enter through a bounded, non-blocking queue and are processed by
//! a pool of workers. Each worker marks the operation running, hands it to an
//! [`OperationDispatcher`] and, unless the dispatcher delegated it elsewhere,
//! persists the terminal status. A single coordinator task serves
//! cancellation requests.

pub mod cancel;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;

pub use cancel::CancelRegistry;
pub use config::OrchestratorConfig;
pub use dispatcher::{DispatchError, DispatchOutcome, HandlerDispatcher, OperationDispatcher};
pub use error::{OrchestratorError, Result};
pub use orchestrator::Orchestrator;
