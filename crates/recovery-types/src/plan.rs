//! Synthesized recovery plans

use crate::action::ActionCandidate;
use crate::error::PlanShapeError;
use crate::ids::{ActionId, PlanId, ScenarioId, TenantId};
use crate::policy::RecoveryWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Execution layering a plan was synthesized with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTopology {
    /// Action ids per layer; layer k depends only on layers < k
    pub layers: Vec<Vec<ActionId>>,
    /// Whether the last layer is a cyclic remainder
    pub has_cycle: bool,
    /// Actions with neither dependencies nor dependents
    pub isolated_count: usize,
    /// Sum of per-layer slowest durations (sum of all durations when cyclic)
    pub critical_path_minutes: u32,
}

impl PlanTopology {
    /// Size of the widest layer
    #[inline]
    #[must_use]
    pub fn widest_layer(&self) -> usize {
        self.layers.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Layer index of every action
    #[must_use]
    pub fn layer_index(&self) -> HashMap<&ActionId, usize> {
        self.layers
            .iter()
            .enumerate()
            .flat_map(|(i, layer)| layer.iter().map(move |id| (id, i)))
            .collect()
    }
}

/// The synthesized artifact; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryActionPlan {
    /// Plan identifier
    pub plan_id: PlanId,
    /// Scenario the plan answers
    pub scenario_id: ScenarioId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Ordered actions, consistent with `topology`
    pub sequence: Vec<ActionCandidate>,
    /// Critical-path completion estimate
    pub estimated_completion_minutes: u32,
    /// Confidence in [0, 1], decreasing with plan length
    pub aggregate_confidence: f64,
    /// One-line human-readable summary
    pub rationale: String,
    /// Scheduling envelope
    pub window: RecoveryWindow,
    /// Recovery time objective copied from policy at synthesis
    #[serde(default)]
    pub target_rto_minutes: Option<u32>,
    /// Layering used to order `sequence`
    pub topology: PlanTopology,
    /// Synthesis time
    pub created_at_utc: DateTime<Utc>,
}

impl RecoveryActionPlan {
    /// Look up an action by id
    #[must_use]
    pub fn action(&self, action_id: &ActionId) -> Option<&ActionCandidate> {
        self.sequence.iter().find(|c| &c.action_id == action_id)
    }

    /// Ids in sequence order
    pub fn action_ids(&self) -> impl Iterator<Item = &ActionId> + '_ {
        self.sequence.iter().map(|c| &c.action_id)
    }

    /// RTO budget: explicit target, else the window length
    #[inline]
    #[must_use]
    pub fn rto_budget_minutes(&self) -> i64 {
        self.target_rto_minutes
            .map_or_else(|| self.window.duration_minutes(), i64::from)
    }

    /// Basic shape validation
    ///
    /// # Errors
    /// Returns the first structural problem found.
    pub fn check_shape(&self) -> Result<(), PlanShapeError> {
        if self.sequence.is_empty() {
            return Err(PlanShapeError::EmptySequence);
        }

        let mut ids = HashSet::with_capacity(self.sequence.len());
        for candidate in &self.sequence {
            if !ids.insert(&candidate.action_id) {
                return Err(PlanShapeError::DuplicateAction(candidate.action_id.clone()));
            }
        }

        for candidate in &self.sequence {
            if let Some(missing) = candidate
                .dependency
                .depends_on
                .iter()
                .find(|dep| !ids.contains(dep))
            {
                return Err(PlanShapeError::DanglingDependency {
                    action: candidate.action_id.clone(),
                    missing: missing.clone(),
                });
            }
        }

        let mut covered = HashSet::with_capacity(ids.len());
        for id in self.topology.layers.iter().flatten() {
            if !ids.contains(id) {
                return Err(PlanShapeError::TopologyMismatch(format!(
                    "layer references {id} which is not in the sequence"
                )));
            }
            if !covered.insert(id) {
                return Err(PlanShapeError::TopologyMismatch(format!(
                    "{id} appears in more than one layer slot"
                )));
            }
        }
        if covered.len() != ids.len() {
            return Err(PlanShapeError::TopologyMismatch(format!(
                "{} of {} actions are layered",
                covered.len(),
                ids.len()
            )));
        }

        // the cyclic remainder is the last layer and may depend on itself
        let layer_of = self.topology.layer_index();
        let remainder = self
            .topology
            .has_cycle
            .then_some(self.topology.layers.len().saturating_sub(1));
        for candidate in &self.sequence {
            let Some(&layer) = layer_of.get(&candidate.action_id) else {
                continue;
            };
            for dep in &candidate.dependency.depends_on {
                let Some(&dep_layer) = layer_of.get(dep) else {
                    continue;
                };
                if dep_layer > layer || (dep_layer == layer && remainder != Some(layer)) {
                    return Err(PlanShapeError::LayerOrder {
                        action: candidate.action_id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        if !(0.0..=1.0).contains(&self.aggregate_confidence) {
            return Err(PlanShapeError::ConfidenceOutOfRange(self.aggregate_confidence));
        }

        Ok(())
    }
}
