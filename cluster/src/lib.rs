//! IndexLife Cluster Model
//!
//! Immutable, point-in-time snapshots of cluster state: index metadata and
//! shard routing tables. Lifecycle readiness predicates evaluate against
//! these snapshots without blocking, locking, or mutation.

pub mod metadata;
pub mod routing;
pub mod state;

pub use metadata::*;
pub use routing::*;
pub use state::*;
