//! Error types for IndexLife operations.

use crate::IndexId;
use thiserror::Error;

/// Main error type for IndexLife operations.
#[derive(Error, Debug)]
pub enum IndexLifeError {
    /// Index is not present in the cluster state.
    ///
    /// Readiness predicates fold a missing index into "not met"; this error
    /// exists for callers that need to distinguish a vanished index from one
    /// that has not yet converged, by checking before evaluating a gate.
    #[error("Index not found: {0}")]
    IndexNotFound(IndexId),

    /// Index metadata was built with an impossible shard count.
    #[error("Invalid shard count: {count} (an index must have at least one primary shard)")]
    InvalidShardCount { count: u32 },
}

/// Result type alias for IndexLife operations.
pub type Result<T> = std::result::Result<T, IndexLifeError>;
