//! Fleet Types - Core types for the operation-dispatch subsystem
//!
//! The hub dispatches long-running operations (apply, exec, sync, delete) to
//! per-cluster agents and tracks their lifecycle. This crate holds the model
//! shared by every other fleet crate.
//!
//! ## Key Concepts
//!
//! - **Operation**: A unit of work targeting one cluster, with a forward-only
//!   status state machine
//! - **Cluster**: A managed cluster and the metadata its agent reports
//! - **OperationHandler**: Type-specific executor, cancelled cooperatively

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod cluster;
pub mod handler;
pub mod ids;
pub mod operation;

pub use cluster::{Cluster, ClusterHealth, ClusterInfo, ClusterState};
pub use handler::{HandlerError, HandlerSet, OperationHandler};
pub use ids::{ClusterId, OperationId};
pub use operation::{Operation, OperationStatus, OperationType, UnknownVariant};
