//! IndexLife Lifecycle Steps
//!
//! Step identities and readiness gates for index lifecycle management. A
//! gate is a pure predicate over a cluster state snapshot; the surrounding
//! pipeline decides when to poll it and what to do when it reports ready.

pub mod shard_readiness;
pub mod step;

pub use shard_readiness::*;
pub use step::*;
