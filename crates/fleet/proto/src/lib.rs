//! Fleet Proto - wire protocol between the hub and its agents
//!
//! Generated prost/tonic code for `fleet.agent.v1.AgentService` is checked in
//! under `src/generated` so builds need no `protoc`; the `.proto` source lives
//! in `proto/`.

pub mod convert;
pub mod pb;

pub use convert::ConvertError;
pub use pb::fleet::agent::v1;
