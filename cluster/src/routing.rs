//! Shard routing entries and routing tables.
//!
//! A routing table is a point-in-time view of where every shard copy of an
//! index is placed and what state that copy is in. Routing values are
//! immutable; transitions produce new values so that a snapshot handed to a
//! reader never changes underneath it.

use indexlife_common::{IndexId, NodeId, ShardId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Placement state of a single shard copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShardRoutingState {
    /// Not allocated to any node.
    Unassigned,
    /// Allocated to a node and recovering.
    Initializing,
    /// Recovered and serving its data.
    Started,
    /// Moving from its current node to another node.
    Relocating,
}

impl ShardRoutingState {
    /// Check if the copy is fully started.
    pub fn is_started(&self) -> bool {
        matches!(self, ShardRoutingState::Started)
    }

    /// Check if the copy is allocated to a node.
    pub fn is_assigned(&self) -> bool {
        !matches!(self, ShardRoutingState::Unassigned)
    }

    /// Get valid next states from the current state.
    ///
    /// Any assigned copy can drop back to `Unassigned` when its node leaves
    /// the cluster.
    pub fn valid_transitions(&self) -> &[ShardRoutingState] {
        match self {
            ShardRoutingState::Unassigned => &[ShardRoutingState::Initializing],
            ShardRoutingState::Initializing => {
                &[ShardRoutingState::Started, ShardRoutingState::Unassigned]
            }
            ShardRoutingState::Started => {
                &[ShardRoutingState::Relocating, ShardRoutingState::Unassigned]
            }
            ShardRoutingState::Relocating => {
                &[ShardRoutingState::Started, ShardRoutingState::Unassigned]
            }
        }
    }

    /// Check if a transition to the given state is valid.
    pub fn can_transition_to(&self, next: ShardRoutingState) -> bool {
        self.valid_transitions().contains(&next)
    }
}

/// Error when attempting an invalid shard routing transition.
#[derive(Debug, Clone)]
pub struct InvalidShardTransition {
    pub from: ShardRoutingState,
    pub to: ShardRoutingState,
}

impl fmt::Display for InvalidShardTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid shard routing transition from {:?} to {:?}",
            self.from, self.to
        )
    }
}

impl std::error::Error for InvalidShardTransition {}

/// Placement of one copy of one shard.
///
/// The constructors keep node assignment consistent with the routing state:
/// an unassigned copy has no node, a relocating copy always has both a
/// current and a target node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardRouting {
    shard: ShardId,
    primary: bool,
    state: ShardRoutingState,
    current_node: Option<NodeId>,
    relocating_node: Option<NodeId>,
}

impl ShardRouting {
    /// Create an unassigned copy.
    pub fn unassigned(shard: ShardId, primary: bool) -> Self {
        Self {
            shard,
            primary,
            state: ShardRoutingState::Unassigned,
            current_node: None,
            relocating_node: None,
        }
    }

    /// Create a copy that is initializing on the given node.
    pub fn initializing(shard: ShardId, primary: bool, node: NodeId) -> Self {
        Self {
            shard,
            primary,
            state: ShardRoutingState::Initializing,
            current_node: Some(node),
            relocating_node: None,
        }
    }

    /// Create a copy that is started on the given node.
    pub fn started(shard: ShardId, primary: bool, node: NodeId) -> Self {
        Self {
            shard,
            primary,
            state: ShardRoutingState::Started,
            current_node: Some(node),
            relocating_node: None,
        }
    }

    /// Create a copy that is relocating from `node` to `target`.
    pub fn relocating(shard: ShardId, primary: bool, node: NodeId, target: NodeId) -> Self {
        Self {
            shard,
            primary,
            state: ShardRoutingState::Relocating,
            current_node: Some(node),
            relocating_node: Some(target),
        }
    }

    /// Get the shard identifier.
    pub fn shard(&self) -> &ShardId {
        &self.shard
    }

    /// Check if this is the primary copy.
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// Get the routing state.
    pub fn state(&self) -> ShardRoutingState {
        self.state
    }

    /// Get the node currently holding this copy, if assigned.
    pub fn current_node(&self) -> Option<&NodeId> {
        self.current_node.as_ref()
    }

    /// Get the relocation target node, if relocating.
    pub fn relocating_node(&self) -> Option<&NodeId> {
        self.relocating_node.as_ref()
    }

    /// Check if the copy is fully started.
    pub fn is_started(&self) -> bool {
        self.state.is_started()
    }

    /// Check if the copy has usable data on its current node.
    ///
    /// A relocating copy is active in this sense, but not started.
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            ShardRoutingState::Started | ShardRoutingState::Relocating
        )
    }

    /// Allocate an unassigned copy to a node, producing an initializing copy.
    pub fn initialize(&self, node: NodeId) -> Result<Self, InvalidShardTransition> {
        match self.state {
            ShardRoutingState::Unassigned => Ok(Self {
                shard: self.shard.clone(),
                primary: self.primary,
                state: ShardRoutingState::Initializing,
                current_node: Some(node),
                relocating_node: None,
            }),
            from => Err(InvalidShardTransition {
                from,
                to: ShardRoutingState::Initializing,
            }),
        }
    }

    /// Complete recovery, producing a started copy on the same node.
    pub fn move_to_started(&self) -> Result<Self, InvalidShardTransition> {
        match self.state {
            ShardRoutingState::Initializing => Ok(Self {
                shard: self.shard.clone(),
                primary: self.primary,
                state: ShardRoutingState::Started,
                current_node: self.current_node.clone(),
                relocating_node: None,
            }),
            from => Err(InvalidShardTransition {
                from,
                to: ShardRoutingState::Started,
            }),
        }
    }

    /// Begin relocating a started copy to the given target node.
    pub fn relocate(&self, target: NodeId) -> Result<Self, InvalidShardTransition> {
        match self.state {
            ShardRoutingState::Started => Ok(Self {
                shard: self.shard.clone(),
                primary: self.primary,
                state: ShardRoutingState::Relocating,
                current_node: self.current_node.clone(),
                relocating_node: Some(target),
            }),
            from => Err(InvalidShardTransition {
                from,
                to: ShardRoutingState::Relocating,
            }),
        }
    }

    /// Complete relocation, producing a started copy on the target node.
    pub fn finish_relocation(&self) -> Result<Self, InvalidShardTransition> {
        match (self.state, &self.relocating_node) {
            (ShardRoutingState::Relocating, Some(target)) => Ok(Self {
                shard: self.shard.clone(),
                primary: self.primary,
                state: ShardRoutingState::Started,
                current_node: Some(target.clone()),
                relocating_node: None,
            }),
            (from, _) => Err(InvalidShardTransition {
                from,
                to: ShardRoutingState::Started,
            }),
        }
    }
}

/// Routing entries for every shard copy of one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRoutingTable {
    index: IndexId,
    /// Copies grouped by shard number, in shard order.
    shards: BTreeMap<u32, Vec<ShardRouting>>,
}

impl IndexRoutingTable {
    /// Start building a routing table for the given index.
    pub fn builder(index: IndexId) -> IndexRoutingTableBuilder {
        IndexRoutingTableBuilder {
            index,
            shards: BTreeMap::new(),
        }
    }

    /// Get the index this table describes.
    pub fn index(&self) -> &IndexId {
        &self.index
    }

    /// Number of distinct shards with at least one routing entry.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Iterate over every routing entry, in shard order.
    pub fn shards(&self) -> impl Iterator<Item = &ShardRouting> {
        self.shards.values().flatten()
    }

    /// Get the routing entries for one shard number.
    pub fn shard(&self, id: u32) -> Option<&[ShardRouting]> {
        self.shards.get(&id).map(Vec::as_slice)
    }

    /// Iterate over primary routing entries only.
    pub fn primary_shards(&self) -> impl Iterator<Item = &ShardRouting> {
        self.shards().filter(|routing| routing.is_primary())
    }

    /// Number of primary routing entries.
    pub fn primary_count(&self) -> usize {
        self.primary_shards().count()
    }

    /// Number of primary routing entries in the started state.
    pub fn started_primary_count(&self) -> usize {
        self.primary_shards()
            .filter(|routing| routing.is_started())
            .count()
    }
}

/// Builder for [`IndexRoutingTable`].
#[derive(Debug)]
pub struct IndexRoutingTableBuilder {
    index: IndexId,
    shards: BTreeMap<u32, Vec<ShardRouting>>,
}

impl IndexRoutingTableBuilder {
    /// Add a routing entry. The entry must belong to the table's index.
    pub fn add_shard(mut self, routing: ShardRouting) -> Self {
        debug_assert_eq!(
            routing.shard().index(),
            &self.index,
            "routing entry belongs to a different index"
        );
        self.shards
            .entry(routing.shard().id())
            .or_default()
            .push(routing);
        self
    }

    /// Finish building the table.
    pub fn build(self) -> IndexRoutingTable {
        IndexRoutingTable {
            index: self.index,
            shards: self.shards,
        }
    }
}

/// Routing tables for every routable index in the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTable {
    indices: HashMap<IndexId, IndexRoutingTable>,
}

impl RoutingTable {
    /// Start building a routing table.
    pub fn builder() -> RoutingTableBuilder {
        RoutingTableBuilder {
            indices: HashMap::new(),
        }
    }

    /// Look up the routing table for an index.
    ///
    /// Matches the full name+UUID identity: a re-created index under the same
    /// name does not resolve for a stale identity.
    pub fn index(&self, index: &IndexId) -> Option<&IndexRoutingTable> {
        self.indices.get(index)
    }

    /// Check whether the index has any routing entries.
    pub fn has_index(&self, index: &IndexId) -> bool {
        self.indices.contains_key(index)
    }

    /// Iterate over all per-index routing tables.
    pub fn indices(&self) -> impl Iterator<Item = &IndexRoutingTable> {
        self.indices.values()
    }
}

/// Builder for [`RoutingTable`].
#[derive(Debug, Default)]
pub struct RoutingTableBuilder {
    indices: HashMap<IndexId, IndexRoutingTable>,
}

impl RoutingTableBuilder {
    /// Add a per-index routing table.
    pub fn add(mut self, table: IndexRoutingTable) -> Self {
        self.indices.insert(table.index().clone(), table);
        self
    }

    /// Finish building the table.
    pub fn build(self) -> RoutingTable {
        RoutingTable {
            indices: self.indices,
        }
    }
}
