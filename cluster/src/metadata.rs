//! Index metadata held in cluster state.

use indexlife_common::{IndexId, IndexLifeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Settings of one index as recorded in cluster state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    index: IndexId,
    number_of_shards: u32,
    number_of_replicas: u32,
}

impl IndexMetadata {
    /// Start building metadata for a new index with the given name.
    ///
    /// The builder assigns a fresh UUID; read the resulting identity back via
    /// [`IndexMetadata::index`].
    pub fn builder(name: impl Into<String>) -> IndexMetadataBuilder {
        IndexMetadataBuilder {
            index: IndexId::new(name),
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }

    /// Get the index identity.
    pub fn index(&self) -> &IndexId {
        &self.index
    }

    /// Declared number of primary shards.
    pub fn number_of_shards(&self) -> u32 {
        self.number_of_shards
    }

    /// Declared number of replica copies per shard.
    pub fn number_of_replicas(&self) -> u32 {
        self.number_of_replicas
    }
}

/// Builder for [`IndexMetadata`].
#[derive(Debug)]
pub struct IndexMetadataBuilder {
    index: IndexId,
    number_of_shards: u32,
    number_of_replicas: u32,
}

impl IndexMetadataBuilder {
    /// Set the number of primary shards.
    pub fn number_of_shards(mut self, count: u32) -> Self {
        self.number_of_shards = count;
        self
    }

    /// Set the number of replica copies per shard.
    pub fn number_of_replicas(mut self, count: u32) -> Self {
        self.number_of_replicas = count;
        self
    }

    /// Finish building, validating the shard count.
    pub fn build(self) -> Result<IndexMetadata> {
        if self.number_of_shards == 0 {
            return Err(IndexLifeError::InvalidShardCount {
                count: self.number_of_shards,
            });
        }
        Ok(IndexMetadata {
            index: self.index,
            number_of_shards: self.number_of_shards,
            number_of_replicas: self.number_of_replicas,
        })
    }
}

/// Metadata for every index known to the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    indices: HashMap<IndexId, IndexMetadata>,
}

impl Metadata {
    /// Start building cluster metadata.
    pub fn builder() -> MetadataBuilder {
        MetadataBuilder {
            indices: HashMap::new(),
        }
    }

    /// Look up metadata for an index by its full identity.
    pub fn index(&self, index: &IndexId) -> Option<&IndexMetadata> {
        self.indices.get(index)
    }

    /// Check whether the index exists in the metadata.
    pub fn has_index(&self, index: &IndexId) -> bool {
        self.indices.contains_key(index)
    }

    /// Iterate over all index metadata.
    pub fn indices(&self) -> impl Iterator<Item = &IndexMetadata> {
        self.indices.values()
    }
}

/// Builder for [`Metadata`].
#[derive(Debug, Default)]
pub struct MetadataBuilder {
    indices: HashMap<IndexId, IndexMetadata>,
}

impl MetadataBuilder {
    /// Add an index.
    pub fn put(mut self, metadata: IndexMetadata) -> Self {
        self.indices.insert(metadata.index().clone(), metadata);
        self
    }

    /// Finish building the metadata.
    pub fn build(self) -> Metadata {
        Metadata {
            indices: self.indices,
        }
    }
}
