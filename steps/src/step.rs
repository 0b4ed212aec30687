//! Step identities and the wait-step capability.

use indexlife_cluster::ClusterState;
use indexlife_common::IndexId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a position in a lifecycle pipeline.
///
/// A step key is the immutable triple of the phase, the action within the
/// phase, and the step name within the action. Gates treat it as opaque:
/// the pipeline owns its meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepKey {
    phase: String,
    action: String,
    name: String,
}

impl StepKey {
    /// Create a new step key.
    pub fn new(
        phase: impl Into<String>,
        action: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            phase: phase.into(),
            action: action.into(),
            name: name.into(),
        }
    }

    /// Get the phase.
    pub fn phase(&self) -> &str {
        &self.phase
    }

    /// Get the action.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Get the step name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.phase, self.action, self.name)
    }
}

/// A lifecycle step that blocks pipeline progress until a cluster-state
/// condition holds.
///
/// The pipeline holds a sequence of `Box<dyn WaitStep>` and re-evaluates
/// each gate against fresh snapshots until it reports the condition met;
/// scheduling and retry live in the pipeline, not here. Implementations must
/// be pure reads over the supplied snapshot: no blocking, no mutation, safe
/// to call concurrently and repeatedly.
pub trait WaitStep {
    /// This step's identity, if bound into a pipeline.
    fn key(&self) -> Option<&StepKey>;

    /// The successor step's identity, if bound into a pipeline.
    fn next_step_key(&self) -> Option<&StepKey>;

    /// Evaluate the readiness condition for the given index against a
    /// cluster state snapshot.
    fn is_condition_met(&self, index: &IndexId, cluster_state: &ClusterState) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_key_equality() {
        let key = StepKey::new("warm", "shrink", "enough-shards");
        assert_eq!(key, StepKey::new("warm", "shrink", "enough-shards"));
        assert_ne!(key, StepKey::new("hot", "shrink", "enough-shards"));
        assert_ne!(key, StepKey::new("warm", "rollover", "enough-shards"));
        assert_ne!(key, StepKey::new("warm", "shrink", "shrunk"));
    }

    #[test]
    fn test_step_key_display() {
        let key = StepKey::new("warm", "shrink", "enough-shards");
        assert_eq!(key.to_string(), "warm/shrink/enough-shards");
    }
}
