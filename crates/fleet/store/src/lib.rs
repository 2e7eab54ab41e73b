//! Fleet Store - Persistence boundary for operations and clusters
//!
//! The orchestrator and the agent registry only talk to storage through the
//! [`OperationStore`] and [`ClusterStore`] traits. Status writes are
//! compare-and-set, so two writers racing on one operation cannot both win.
//!
//! The in-memory implementations back development runs and tests.

#![deny(unsafe_code)]

pub mod cluster;
pub mod error;
pub mod operation;

pub use cluster::{ClusterStore, InMemoryClusterStore};
pub use error::{Result, StoreError};
pub use operation::{InMemoryOperationStore, OperationStore};
