//! Cluster state snapshots.

use crate::{IndexMetadata, Metadata, RoutingTable};
use indexlife_common::{IndexId, IndexLifeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the cluster a state snapshot belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterName(String);

impl ClusterName {
    /// Create a cluster name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClusterName {
    fn default() -> Self {
        Self::new("indexlife")
    }
}

impl fmt::Display for ClusterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A self-consistent, point-in-time view of cluster metadata and routing.
///
/// Snapshots are plain owned values: evaluating predicates against a shared
/// reference from any number of threads needs no synchronization, and a
/// snapshot never changes after it is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterState {
    name: ClusterName,
    metadata: Metadata,
    routing_table: RoutingTable,
}

impl ClusterState {
    /// Start building a cluster state snapshot.
    pub fn builder(name: ClusterName) -> ClusterStateBuilder {
        ClusterStateBuilder {
            name,
            metadata: Metadata::default(),
            routing_table: RoutingTable::default(),
        }
    }

    /// Get the cluster name.
    pub fn name(&self) -> &ClusterName {
        &self.name
    }

    /// Get the index metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Get the routing table.
    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    /// Check whether the index exists in the cluster metadata.
    pub fn has_index(&self, index: &IndexId) -> bool {
        self.metadata.has_index(index)
    }

    /// Look up metadata for an index.
    pub fn index_metadata(&self, index: &IndexId) -> Option<&IndexMetadata> {
        self.metadata.index(index)
    }

    /// Look up metadata for an index, erroring if it is absent.
    ///
    /// Readiness predicates fold a missing index into "not met"; callers that
    /// need to tell a vanished index apart from one that has not converged
    /// check with this before evaluating.
    pub fn require_index(&self, index: &IndexId) -> Result<&IndexMetadata> {
        self.metadata
            .index(index)
            .ok_or_else(|| IndexLifeError::IndexNotFound(index.clone()))
    }
}

/// Builder for [`ClusterState`].
#[derive(Debug)]
pub struct ClusterStateBuilder {
    name: ClusterName,
    metadata: Metadata,
    routing_table: RoutingTable,
}

impl ClusterStateBuilder {
    /// Set the cluster metadata.
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set the routing table.
    pub fn routing_table(mut self, routing_table: RoutingTable) -> Self {
        self.routing_table = routing_table;
        self
    }

    /// Finish building the snapshot.
    pub fn build(self) -> ClusterState {
        ClusterState {
            name: self.name,
            metadata: self.metadata,
            routing_table: self.routing_table,
        }
    }
}
