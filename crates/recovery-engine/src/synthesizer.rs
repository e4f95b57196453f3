//! Plan synthesis
//!
//! Turns signals and candidate actions into an ordered, windowed plan:
//! 1. Drop candidates whose required signal was not observed
//! 2. Layer the rest with the dependency graph
//! 3. Order by layer, shortest action first within a layer
//! 4. Estimate completion from the critical path and derive confidence

use crate::clock::{Clock, SystemClock};
use crate::config::SynthesisConfig;
use indexmap::IndexSet;
use recovery_graph::{DependencyGraph, GraphError, Layering};
use recovery_signals::peak_severity;
use recovery_types::{
    clamp_unit, ActionCandidate, ActionId, PlanId, PolicyConstraint, RecoveryActionPlan,
    RecoveryWindow, ScenarioId, Signal,
};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Synthesis failures; all are structural
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// No candidate survived filtering
    #[error("no candidate actions to synthesize a plan from")]
    EmptyCandidateSet,

    /// Candidate graph is malformed
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Builds recovery plans
#[derive(Debug, Clone)]
pub struct PlanSynthesizer {
    config: SynthesisConfig,
    clock: Arc<dyn Clock>,
}

impl Default for PlanSynthesizer {
    fn default() -> Self {
        Self::new(SynthesisConfig::default())
    }
}

impl PlanSynthesizer {
    /// Synthesizer stamping plans with the system clock
    #[must_use]
    pub fn new(config: SynthesisConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// With clock
    #[inline]
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Synthesize a plan
    ///
    /// # Errors
    /// Returns [`SynthesisError::EmptyCandidateSet`] when nothing is left to plan,
    /// or [`SynthesisError::Graph`] for duplicate ids and dangling dependencies.
    pub fn synthesize(
        &self,
        scenario_id: &ScenarioId,
        signals: &[Signal],
        candidates: &[ActionCandidate],
        policy: &PolicyConstraint,
        window: &RecoveryWindow,
    ) -> Result<RecoveryActionPlan, SynthesisError> {
        let triggered = triggered_candidates(signals, candidates);
        if triggered.is_empty() {
            return Err(SynthesisError::EmptyCandidateSet);
        }

        let graph = DependencyGraph::build(&triggered)?;
        let layering = graph.layer();
        if layering.has_cycle {
            warn!(%scenario_id, "synthesizing plan over a cyclic candidate graph");
        }

        let sequence = order_by_layer(&triggered, &layering);
        let action_ids: Vec<&ActionId> = sequence.iter().map(|c| &c.action_id).collect();
        let plan_id = plan_id(scenario_id, window, &action_ids);
        let rationale = self.rationale(signals, &sequence, layering.depth());
        let aggregate_confidence = self.confidence(sequence.len());

        let plan = RecoveryActionPlan {
            plan_id,
            scenario_id: scenario_id.clone(),
            tenant_id: policy.tenant_id.clone(),
            estimated_completion_minutes: layering.critical_path_minutes,
            aggregate_confidence,
            rationale,
            window: window.clone(),
            target_rto_minutes: policy.target_rto_minutes,
            topology: layering.into_topology(),
            sequence,
            created_at_utc: self.clock.now(),
        };

        info!(
            plan_id = %plan.plan_id,
            actions = plan.sequence.len(),
            layers = plan.topology.layers.len(),
            estimate = plan.estimated_completion_minutes,
            "plan synthesized"
        );
        Ok(plan)
    }

    #[allow(clippy::cast_precision_loss)]
    fn confidence(&self, actions: usize) -> f64 {
        clamp_unit(self.config.confidence_base - self.config.confidence_decay * actions as f64)
    }

    fn rationale(&self, signals: &[Signal], sequence: &[ActionCandidate], layers: usize) -> String {
        let peak = peak_severity(signals).map_or("none", |s| s.as_str());
        let sources: IndexSet<&str> = signals
            .iter()
            .map(|s| s.fingerprint.source.as_str())
            .collect();

        let limit = self.config.rationale_source_limit;
        let mut listed = if sources.is_empty() {
            "none".to_string()
        } else {
            sources
                .iter()
                .take(limit)
                .copied()
                .collect::<Vec<_>>()
                .join(", ")
        };
        if sources.len() > limit {
            listed.push_str(&format!(" (+{} more)", sources.len() - limit));
        }

        format!(
            "{} signal(s), peak {peak}, {} action(s) in {layers} layer(s); sources: {listed}",
            signals.len(),
            sequence.len()
        )
    }
}

/// Candidates without a required signal, or whose required signal was observed
fn triggered_candidates(signals: &[Signal], candidates: &[ActionCandidate]) -> Vec<ActionCandidate> {
    let observed: HashSet<_> = signals.iter().map(|s| &s.signal_id).collect();
    candidates
        .iter()
        .filter(|candidate| match &candidate.dependency.required_signal_id {
            Some(required) if !observed.contains(required) => {
                debug!(action = %candidate.action_id, signal = %required, "candidate not triggered");
                false
            }
            _ => true,
        })
        .cloned()
        .collect()
}

/// Layer order, shortest first within a layer, input order on ties
fn order_by_layer(candidates: &[ActionCandidate], layering: &Layering) -> Vec<ActionCandidate> {
    let by_id: HashMap<&ActionId, &ActionCandidate> =
        candidates.iter().map(|c| (&c.action_id, c)).collect();

    layering
        .layers
        .iter()
        .flat_map(|layer| {
            let mut members: Vec<&ActionCandidate> =
                layer.iter().filter_map(|id| by_id.get(id).copied()).collect();
            members.sort_by_key(|c| c.estimated_minutes);
            members.into_iter().cloned()
        })
        .collect()
}

/// `plan-` followed by 16 hex chars of SHA-256 over scenario, window and actions
fn plan_id(scenario_id: &ScenarioId, window: &RecoveryWindow, actions: &[&ActionId]) -> PlanId {
    let mut hasher = Sha256::new();
    hasher.update(scenario_id.as_str().as_bytes());
    hasher.update([0x1f]);
    hasher.update(window.window_id.as_str().as_bytes());
    for action in actions {
        hasher.update([0x1f]);
        hasher.update(action.as_str().as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    PlanId::new(format!("plan-{}", &digest[..16]))
}
