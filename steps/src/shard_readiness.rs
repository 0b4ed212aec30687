//! Shard readiness gate.

use crate::{StepKey, WaitStep};
use indexlife_cluster::ClusterState;
use indexlife_common::IndexId;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Gate that holds a lifecycle pipeline until an index has exactly the
/// required number of started primary shards.
///
/// Destructive lifecycle actions (shrink, force-merge, delete) must not run
/// against an under-replicated or still-initializing index, so the gate is
/// strict: a primary that is initializing, relocating, or unassigned does not
/// count, and a started-primary count above the required count is treated as
/// a mid-transition cluster state rather than success. Replica copies are
/// never consulted; the gate answers "are the primaries up", not "is the
/// index fully replicated".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardReadinessGate {
    key: Option<StepKey>,
    next_key: Option<StepKey>,
    required_shard_count: u32,
}

impl ShardReadinessGate {
    /// Create a gate bound to the given step identities.
    ///
    /// Both keys may be `None` for standalone evaluation outside a pipeline;
    /// a pipeline binds them when it compiles a policy into steps.
    pub fn new(key: Option<StepKey>, next_key: Option<StepKey>, required_shard_count: u32) -> Self {
        Self {
            key,
            next_key,
            required_shard_count,
        }
    }

    /// Create an unbound gate for standalone evaluation.
    pub fn standalone(required_shard_count: u32) -> Self {
        Self::new(None, None, required_shard_count)
    }

    /// This step's identity, if bound.
    pub fn key(&self) -> Option<&StepKey> {
        self.key.as_ref()
    }

    /// The successor step's identity, if bound.
    pub fn next_step_key(&self) -> Option<&StepKey> {
        self.next_key.as_ref()
    }

    /// Number of started primary shards required for the condition to hold.
    pub fn number_of_shards(&self) -> u32 {
        self.required_shard_count
    }

    /// Evaluate the gate against a cluster state snapshot.
    ///
    /// Returns true iff the number of started primary routing entries of the
    /// index equals the required shard count exactly. A missing index or a
    /// missing routing table degrades to "not met" rather than an error: to
    /// a polling pipeline both are indistinguishable from "still converging".
    pub fn is_condition_met(&self, index: &IndexId, cluster_state: &ClusterState) -> bool {
        if !cluster_state.has_index(index) {
            debug!(index = %index, "index missing from cluster metadata, condition not met");
            return false;
        }
        let routing = match cluster_state.routing_table().index(index) {
            Some(routing) => routing,
            None => {
                debug!(index = %index, "index is not routable yet, condition not met");
                return false;
            }
        };

        let started = routing.started_primary_count();
        let required = self.required_shard_count as usize;
        let met = started == required;
        trace!(
            index = %index,
            started,
            required,
            met,
            "evaluated shard readiness"
        );
        met
    }
}

impl WaitStep for ShardReadinessGate {
    fn key(&self) -> Option<&StepKey> {
        ShardReadinessGate::key(self)
    }

    fn next_step_key(&self) -> Option<&StepKey> {
        ShardReadinessGate::next_step_key(self)
    }

    fn is_condition_met(&self, index: &IndexId, cluster_state: &ClusterState) -> bool {
        ShardReadinessGate::is_condition_met(self, index, cluster_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexlife_cluster::{
        ClusterName, IndexMetadata, IndexRoutingTable, Metadata, RoutingTable, ShardRouting,
        ShardRoutingState,
    };
    use indexlife_common::{NodeId, ShardId};

    /// Build an index with the given number of primary shards, all in
    /// `state`, plus metadata declaring that shard count.
    fn indexed_state(shards: u32, state: ShardRoutingState) -> (IndexId, ClusterState) {
        let metadata = IndexMetadata::builder("test-index")
            .number_of_shards(shards)
            .number_of_replicas(0)
            .build()
            .unwrap();
        let index = metadata.index().clone();
        let node = NodeId::from("node-1");

        let mut builder = IndexRoutingTable::builder(index.clone());
        for i in 0..shards {
            let shard = ShardId::new(index.clone(), i);
            let routing = match state {
                ShardRoutingState::Unassigned => ShardRouting::unassigned(shard, true),
                ShardRoutingState::Initializing => {
                    ShardRouting::initializing(shard, true, node.clone())
                }
                ShardRoutingState::Started => ShardRouting::started(shard, true, node.clone()),
                ShardRoutingState::Relocating => {
                    ShardRouting::relocating(shard, true, node.clone(), NodeId::from("node-2"))
                }
            };
            builder = builder.add_shard(routing);
        }

        let cluster_state = ClusterState::builder(ClusterName::default())
            .metadata(Metadata::builder().put(metadata).build())
            .routing_table(RoutingTable::builder().add(builder.build()).build())
            .build();
        (index, cluster_state)
    }

    #[test]
    fn test_condition_met() {
        // Three shards, all primaries started, gate requires three.
        let (index, cluster_state) = indexed_state(3, ShardRoutingState::Started);
        let gate = ShardReadinessGate::standalone(3);
        assert!(gate.is_condition_met(&index, &cluster_state));
    }

    #[test]
    fn test_condition_not_met_while_initializing() {
        // One shard, its primary still initializing.
        let (index, cluster_state) = indexed_state(1, ShardRoutingState::Initializing);
        let gate = ShardReadinessGate::standalone(1);
        assert!(!gate.is_condition_met(&index, &cluster_state));
    }

    #[test]
    fn test_condition_not_met_on_shard_count_mismatch() {
        // Five initializing primaries and a gate requiring one: the count
        // mismatch alone keeps the condition unmet.
        let (index, cluster_state) = indexed_state(5, ShardRoutingState::Initializing);
        let gate = ShardReadinessGate::standalone(1);
        assert!(!gate.is_condition_met(&index, &cluster_state));
    }

    #[test]
    fn test_over_count_is_not_met() {
        // More started primaries than required signals a mid-transition
        // state, e.g. a shrink target count not yet applied.
        let (index, cluster_state) = indexed_state(4, ShardRoutingState::Started);
        let gate = ShardReadinessGate::standalone(2);
        assert!(!gate.is_condition_met(&index, &cluster_state));
    }

    #[test]
    fn test_relocating_does_not_count_as_started() {
        let (index, cluster_state) = indexed_state(2, ShardRoutingState::Relocating);
        let gate = ShardReadinessGate::standalone(2);
        assert!(!gate.is_condition_met(&index, &cluster_state));
    }

    #[test]
    fn test_unassigned_does_not_count_as_started() {
        let (index, cluster_state) = indexed_state(2, ShardRoutingState::Unassigned);
        let gate = ShardReadinessGate::standalone(2);
        assert!(!gate.is_condition_met(&index, &cluster_state));
    }

    #[test]
    fn test_missing_index_is_not_met() {
        let cluster_state = ClusterState::builder(ClusterName::default()).build();
        let gate = ShardReadinessGate::standalone(1);
        assert!(!gate.is_condition_met(&IndexId::new("absent"), &cluster_state));
    }

    #[test]
    fn test_index_without_routing_table_is_not_met() {
        // Metadata exists but the index is not routable yet, as right after
        // creation.
        let metadata = IndexMetadata::builder("fresh")
            .number_of_shards(1)
            .number_of_replicas(0)
            .build()
            .unwrap();
        let index = metadata.index().clone();
        let cluster_state = ClusterState::builder(ClusterName::default())
            .metadata(Metadata::builder().put(metadata).build())
            .build();

        let gate = ShardReadinessGate::standalone(1);
        assert!(!gate.is_condition_met(&index, &cluster_state));
    }

    #[test]
    fn test_stale_identity_is_not_met() {
        // A re-created index keeps the name but not the UUID; a gate polled
        // with the old identity must not read the new index's shards.
        let (_, cluster_state) = indexed_state(1, ShardRoutingState::Started);
        let gate = ShardReadinessGate::standalone(1);
        assert!(!gate.is_condition_met(&IndexId::new("test-index"), &cluster_state));
    }

    #[test]
    fn test_replicas_are_ignored() {
        let metadata = IndexMetadata::builder("test-index")
            .number_of_shards(1)
            .number_of_replicas(2)
            .build()
            .unwrap();
        let index = metadata.index().clone();
        let shard = ShardId::new(index.clone(), 0);

        // Primary started, both replicas still initializing.
        let table = IndexRoutingTable::builder(index.clone())
            .add_shard(ShardRouting::started(
                shard.clone(),
                true,
                NodeId::from("node-1"),
            ))
            .add_shard(ShardRouting::initializing(
                shard.clone(),
                false,
                NodeId::from("node-2"),
            ))
            .add_shard(ShardRouting::initializing(
                shard,
                false,
                NodeId::from("node-3"),
            ))
            .build();
        let cluster_state = ClusterState::builder(ClusterName::default())
            .metadata(Metadata::builder().put(metadata).build())
            .routing_table(RoutingTable::builder().add(table).build())
            .build();

        let gate = ShardReadinessGate::standalone(1);
        assert!(gate.is_condition_met(&index, &cluster_state));
    }

    #[test]
    fn test_zero_required_with_no_started_primaries() {
        // required == 0 applies the equality rule literally: true exactly
        // when zero primaries are started, even though shards exist.
        let (index, cluster_state) = indexed_state(2, ShardRoutingState::Initializing);
        let gate = ShardReadinessGate::standalone(0);
        assert!(gate.is_condition_met(&index, &cluster_state));

        let (index, cluster_state) = indexed_state(2, ShardRoutingState::Started);
        let gate = ShardReadinessGate::standalone(0);
        assert!(!gate.is_condition_met(&index, &cluster_state));
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        // Same snapshot, same answer, and the snapshot is not consumed.
        let (index, cluster_state) = indexed_state(3, ShardRoutingState::Started);
        let gate = ShardReadinessGate::standalone(3);
        assert!(gate.is_condition_met(&index, &cluster_state));
        assert!(gate.is_condition_met(&index, &cluster_state));
    }

    #[test]
    fn test_gate_as_wait_step() {
        let key = StepKey::new("warm", "shrink", "enough-shards");
        let next = StepKey::new("warm", "shrink", "shrunk");
        let gate = ShardReadinessGate::new(Some(key.clone()), Some(next.clone()), 3);

        let step: Box<dyn WaitStep> = Box::new(gate);
        assert_eq!(step.key(), Some(&key));
        assert_eq!(step.next_step_key(), Some(&next));

        let (index, cluster_state) = indexed_state(3, ShardRoutingState::Started);
        assert!(step.is_condition_met(&index, &cluster_state));
    }

    #[test]
    fn test_accessors() {
        let key = StepKey::new("warm", "shrink", "enough-shards");
        let next = StepKey::new("warm", "shrink", "shrunk");
        let gate = ShardReadinessGate::new(Some(key.clone()), Some(next.clone()), 5);

        assert_eq!(gate.key(), Some(&key));
        assert_eq!(gate.next_step_key(), Some(&next));
        assert_eq!(gate.number_of_shards(), 5);

        let unbound = ShardReadinessGate::standalone(1);
        assert_eq!(unbound.key(), None);
        assert_eq!(unbound.next_step_key(), None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_step_key() -> impl Strategy<Value = StepKey> {
            ("[a-z]{3,10}", "[a-z]{3,10}", "[a-z]{3,10}")
                .prop_map(|(phase, action, name)| StepKey::new(phase, action, name))
        }

        fn arb_gate() -> impl Strategy<Value = ShardReadinessGate> {
            (
                prop::option::of(arb_step_key()),
                prop::option::of(arb_step_key()),
                0u32..10,
            )
                .prop_map(|(key, next_key, count)| ShardReadinessGate::new(key, next_key, count))
        }

        /// Derive a key differing from the given one, as the mutation arm of
        /// the equality contract.
        fn mutated_key(key: Option<&StepKey>, suffix: &str) -> Option<StepKey> {
            Some(match key {
                Some(key) => StepKey::new(
                    key.phase(),
                    key.action(),
                    format!("{}{}", key.name(), suffix),
                ),
                None => StepKey::new("phase", "action", suffix),
            })
        }

        proptest! {
            #[test]
            fn prop_copy_is_equal_but_distinct(gate in arb_gate()) {
                let copy = gate.clone();
                prop_assert_eq!(&copy, &gate);
                prop_assert!(!std::ptr::eq(&copy, &gate));
            }

            #[test]
            fn prop_mutating_one_field_breaks_equality(
                gate in arb_gate(),
                field in 0usize..3,
                suffix in "[a-z]{5}",
            ) {
                let mutated = match field {
                    0 => ShardReadinessGate::new(
                        mutated_key(gate.key(), &suffix),
                        gate.next_step_key().cloned(),
                        gate.number_of_shards(),
                    ),
                    1 => ShardReadinessGate::new(
                        gate.key().cloned(),
                        mutated_key(gate.next_step_key(), &suffix),
                        gate.number_of_shards(),
                    ),
                    _ => ShardReadinessGate::new(
                        gate.key().cloned(),
                        gate.next_step_key().cloned(),
                        gate.number_of_shards() + 1,
                    ),
                };
                prop_assert_ne!(mutated, gate);
            }

            #[test]
            fn prop_met_iff_started_equals_required(
                started in 0u32..8,
                pending in 0u32..4,
                required in 0u32..8,
            ) {
                // An index with `started` started primaries and `pending`
                // still-initializing primaries meets the gate iff the started
                // count equals the required count exactly.
                let total = started + pending;
                prop_assume!(total > 0);

                let metadata = IndexMetadata::builder("prop-index")
                    .number_of_shards(total)
                    .number_of_replicas(0)
                    .build()
                    .unwrap();
                let index = metadata.index().clone();
                let node = NodeId::from("node-1");

                let mut builder = IndexRoutingTable::builder(index.clone());
                for i in 0..total {
                    let shard = ShardId::new(index.clone(), i);
                    let routing = if i < started {
                        ShardRouting::started(shard, true, node.clone())
                    } else {
                        ShardRouting::initializing(shard, true, node.clone())
                    };
                    builder = builder.add_shard(routing);
                }
                let cluster_state = ClusterState::builder(ClusterName::default())
                    .metadata(Metadata::builder().put(metadata).build())
                    .routing_table(RoutingTable::builder().add(builder.build()).build())
                    .build();

                let gate = ShardReadinessGate::standalone(required);
                prop_assert_eq!(
                    gate.is_condition_met(&index, &cluster_state),
                    started == required
                );
            }
        }
    }
}
