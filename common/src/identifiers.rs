//! Identifier types for cluster and index entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an index under lifecycle management.
///
/// An index identity is the pair of its name and the UUID assigned at
/// creation. Two indices created under the same name at different times have
/// different UUIDs and are distinct identities; lookups against cluster state
/// match on both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexId {
    name: String,
    uuid: Uuid,
}

impl IndexId {
    /// Create a new index identity with a freshly assigned UUID.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: Uuid::new_v4(),
        }
    }

    /// Reconstruct an identity from an existing name and UUID.
    pub fn from_parts(name: impl Into<String>, uuid: Uuid) -> Self {
        Self {
            name: name.into(),
            uuid,
        }
    }

    /// Get the index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the creation UUID.
    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}]", self.name, self.uuid)
    }
}

/// Identifier for a single shard of an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardId {
    /// The index this shard belongs to.
    index: IndexId,
    /// Shard number within the index, starting at 0.
    id: u32,
}

impl ShardId {
    /// Create a new shard identifier.
    pub fn new(index: IndexId, id: u32) -> Self {
        Self { index, id }
    }

    /// Get the owning index identity.
    pub fn index(&self) -> &IndexId {
        &self.index
    }

    /// Get the shard number.
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}]", self.index.name(), self.id)
    }
}

/// Unique identifier for a cluster node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new node ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
