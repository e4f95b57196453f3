//! Simulated plan execution
//!
//! Walks the plan layer by layer. Within a layer, actions start together in
//! waves bounded by the policy concurrency cap; a wave takes as long as its
//! slowest member and a layer as long as its waves combined. Faults can be
//! injected per action, and incidents can also be drawn from a seeded RNG so
//! that runs stay reproducible.
//!
//! A failing step never aborts the run. Steps whose dependencies did not
//! complete are never started and stay queued.

use crate::config::SimulationConfig;
use crate::dispatch::{DispatchSchedule, ExecutionEnvelope, RetryDecision};
use chrono::Duration;
use rand::{rngs::StdRng, Rng, SeedableRng};
use recovery_types::{
    clamp_unit, ActionId, PlanShapeError, PolicyConstraint, RecoveryActionPlan, SimulationResult,
    StepOutcome, StepState, WindowState,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

/// Simulation failures; the plan could not be simulated at all
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    /// The plan is structurally malformed
    #[error("plan shape: {0}")]
    Shape(#[from] PlanShapeError),

    /// Random incident rate outside [0, 1]
    #[error("random incident rate must be in [0, 1], got {0}")]
    InvalidIncidentRate(f64),
}

/// Faults injected into a simulation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultPlan {
    /// Actions that fail every attempt
    pub failures: BTreeSet<ActionId>,
    /// Actions that start and never finish
    pub stalls: BTreeSet<ActionId>,
    /// Actions that raise an incident when started
    pub incidents: BTreeSet<ActionId>,
    /// Actions that fail the given number of attempts, then succeed
    pub transient: BTreeMap<ActionId, u32>,
    /// Probability that any started action raises an incident
    pub random_incident_rate: f64,
    /// Seed for random incidents
    pub seed: u64,
}

impl FaultPlan {
    /// Fail `action` on every attempt
    #[must_use]
    pub fn fail(mut self, action: impl Into<ActionId>) -> Self {
        self.failures.insert(action.into());
        self
    }

    /// Stall `action`
    #[must_use]
    pub fn stall(mut self, action: impl Into<ActionId>) -> Self {
        self.stalls.insert(action.into());
        self
    }

    /// Raise an incident when `action` starts
    #[must_use]
    pub fn incident(mut self, action: impl Into<ActionId>) -> Self {
        self.incidents.insert(action.into());
        self
    }

    /// Fail `action` for its first `attempts` attempts
    #[must_use]
    pub fn transient(mut self, action: impl Into<ActionId>, attempts: u32) -> Self {
        self.transient.insert(action.into(), attempts);
        self
    }

    /// Draw incidents at `rate` from an RNG seeded with `seed`
    #[must_use]
    pub fn with_random_incidents(mut self, rate: f64, seed: u64) -> Self {
        self.random_incident_rate = rate;
        self.seed = seed;
        self
    }

    fn failing_attempts(&self, action: &ActionId) -> u32 {
        if self.failures.contains(action) {
            u32::MAX
        } else {
            self.transient.get(action).copied().unwrap_or(0)
        }
    }
}

/// Per-run simulation options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOptions {
    /// Injected faults
    pub faults: FaultPlan,
    /// Cancel once this layer finishes; later layers never start
    pub cancel_after_layer: Option<usize>,
}

impl SimulationOptions {
    /// With faults
    #[inline]
    #[must_use]
    pub fn with_faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }

    /// With cancellation after `layer`
    #[inline]
    #[must_use]
    pub fn cancel_after(mut self, layer: usize) -> Self {
        self.cancel_after_layer = Some(layer);
        self
    }
}

impl From<FaultPlan> for SimulationOptions {
    fn from(faults: FaultPlan) -> Self {
        SimulationOptions::default().with_faults(faults)
    }
}

/// Simulates plans
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    config: SimulationConfig,
}

impl Simulator {
    /// Create a simulator
    #[inline]
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Simulate without faults
    ///
    /// # Errors
    /// Returns [`SimulationError::Shape`] when the plan is structurally malformed.
    pub fn simulate(
        &self,
        plan: &RecoveryActionPlan,
        policy: &PolicyConstraint,
    ) -> Result<SimulationResult, SimulationError> {
        self.simulate_with(plan, policy, &SimulationOptions::default())
    }

    /// Simulate with injected faults and optional cancellation
    ///
    /// # Errors
    /// Returns [`SimulationError::Shape`] for malformed plans and
    /// [`SimulationError::InvalidIncidentRate`] for a bad random incident rate.
    pub fn simulate_with(
        &self,
        plan: &RecoveryActionPlan,
        policy: &PolicyConstraint,
        options: &SimulationOptions,
    ) -> Result<SimulationResult, SimulationError> {
        plan.check_shape()?;
        let faults = &options.faults;
        let rate = faults.random_incident_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(SimulationError::InvalidIncidentRate(rate));
        }

        let mut rng = StdRng::seed_from_u64(faults.seed);
        let envelope = ExecutionEnvelope::from_policy(policy).capped_at(policy.max_concurrency);
        let wave_limit = envelope.concurrency_limit;
        let schedule = DispatchSchedule::build(plan, &envelope);
        let layer_index = plan.topology.layer_index();

        let position: HashMap<&ActionId, usize> = plan
            .sequence
            .iter()
            .enumerate()
            .map(|(i, c)| (&c.action_id, i))
            .collect();
        let mut steps: Vec<StepOutcome> = plan
            .sequence
            .iter()
            .map(|c| StepOutcome {
                action_id: c.action_id.clone(),
                layer: layer_index.get(&c.action_id).copied().unwrap_or_default(),
                state: StepState::Queued,
                attempts: 0,
                started_at: None,
                completed_at: None,
            })
            .collect();

        let mut notes = Vec::new();
        let mut incidents = 0usize;
        let mut elapsed = 0u32;
        let mut canceled = false;
        let layer_count = plan.topology.layers.len();

        for layer in 0..layer_count {
            let waves: Vec<_> = schedule.waves_in(layer).collect();
            if waves.len() > 1 {
                notes.push(format!(
                    "layer {layer} ran in {} waves of at most {wave_limit}",
                    waves.len()
                ));
            }

            let mut layer_minutes = 0u32;
            for wave in waves {
                let wave_start = elapsed.saturating_add(layer_minutes);
                let mut wave_minutes = 0u32;

                for action_id in &wave.actions {
                    let Some(&pos) = position.get(action_id) else {
                        continue;
                    };
                    let candidate = &plan.sequence[pos];

                    let blocked = candidate.dependency.depends_on.iter().find(|dep| {
                        position
                            .get(dep)
                            .map_or(true, |&p| steps[p].state != StepState::Completed)
                    });
                    if let Some(dep) = blocked {
                        notes.push(format!(
                            "{action_id} not started: dependency {dep} did not complete"
                        ));
                        continue;
                    }

                    let (state, attempts) = run_step(action_id, faults, &envelope);
                    match (state, attempts) {
                        (StepState::Failed, n) => {
                            notes.push(format!("{action_id} failed after {n} attempt(s)"));
                        }
                        (StepState::Stalled, _) => notes.push(format!("{action_id} stalled")),
                        (StepState::Completed, n) if n > 1 => {
                            notes.push(format!("{action_id} completed after {n} attempts"));
                        }
                        _ => {}
                    }

                    let raised = faults.incidents.contains(action_id)
                        || (rate > 0.0 && rng.gen_bool(rate));
                    if raised {
                        incidents += 1;
                        notes.push(format!("incident detected during {action_id}"));
                    }

                    let minutes = candidate.estimated_minutes.saturating_mul(attempts);
                    let started_at = plan.window.start_utc + Duration::minutes(i64::from(wave_start));
                    let step = &mut steps[pos];
                    step.state = state;
                    step.attempts = attempts;
                    step.started_at = Some(started_at);
                    step.completed_at = (state == StepState::Completed)
                        .then(|| started_at + Duration::minutes(i64::from(minutes)));

                    debug!(action = %action_id, layer, state = %state, attempts, "step simulated");
                    wave_minutes = wave_minutes.max(minutes);
                }

                layer_minutes = layer_minutes.saturating_add(wave_minutes);
            }

            elapsed = elapsed.saturating_add(layer_minutes);

            if options.cancel_after_layer == Some(layer) && layer + 1 < layer_count {
                canceled = true;
                notes.push(format!("canceled after layer {layer}"));
                break;
            }
        }

        let run_state = run_state(&steps);
        let final_risk_score = self.risk(&steps, incidents);
        let window_state = match run_state {
            StepState::Completed => WindowState::Completed,
            _ if canceled => WindowState::Canceled,
            StepState::Failed => WindowState::Draft,
            _ => WindowState::Executing,
        };

        let completed = steps
            .iter()
            .filter(|s| s.state == StepState::Completed)
            .count();
        notes.push(format!(
            "{completed}/{} steps completed in {elapsed}m, {incidents} incident(s), risk {final_risk_score}",
            steps.len()
        ));

        info!(
            plan_id = %plan.plan_id,
            run_state = %run_state,
            window_state = %window_state,
            risk = final_risk_score,
            elapsed,
            "plan simulated"
        );

        Ok(SimulationResult {
            scenario_id: plan.scenario_id.clone(),
            tenant_id: plan.tenant_id.clone(),
            action_plan: plan.clone(),
            final_risk_score,
            window_state,
            run_state,
            steps,
            elapsed_minutes: elapsed,
            notes,
        })
    }

    /// `incidents / total + (1 - completed / total) * weight`, rounded and clamped
    #[allow(clippy::cast_precision_loss)]
    fn risk(&self, steps: &[StepOutcome], incidents: usize) -> f64 {
        let total = steps.len().max(1) as f64;
        let completed = steps
            .iter()
            .filter(|s| s.state == StepState::Completed)
            .count() as f64;

        let incident_pressure = incidents as f64 / total;
        let completion_ratio = clamp_unit(completed / total);
        let raw = incident_pressure + (1.0 - completion_ratio) * self.config.incomplete_weight;

        let scale = 10f64.powi(i32::try_from(self.config.risk_precision).unwrap_or(3));
        clamp_unit((raw * scale).round() / scale)
    }
}

/// Outcome of a step after retries: completes on the attempt after its last
/// injected failure if the budget allows, otherwise fails on the final attempt
fn run_step(
    action_id: &ActionId,
    faults: &FaultPlan,
    envelope: &ExecutionEnvelope,
) -> (StepState, u32) {
    if faults.stalls.contains(action_id) {
        return (StepState::Stalled, 1);
    }

    let failing = faults.failing_attempts(action_id);
    if RetryDecision::evaluate(failing, true, envelope).should_retry() {
        (StepState::Completed, failing + 1)
    } else {
        (StepState::Failed, envelope.max_attempts())
    }
}

/// Run state from step states: completed iff all completed, failed if any failed,
/// otherwise the furthest state observed
fn run_state(steps: &[StepOutcome]) -> StepState {
    let any = |state: StepState| steps.iter().any(|s| s.state == state);
    if steps.iter().all(|s| s.state == StepState::Completed) {
        StepState::Completed
    } else if any(StepState::Failed) {
        StepState::Failed
    } else if any(StepState::Stalled) {
        StepState::Stalled
    } else if any(StepState::Completed) {
        StepState::Executing
    } else {
        StepState::Queued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use recovery_test_utils::{
        candidate, payments_candidates, payments_policy, plan_with_layers, window,
    };
    use recovery_types::ActionCategory;

    fn payments_plan() -> RecoveryActionPlan {
        plan_with_layers(payments_candidates(), &[&["rollback"], &["scale"]])
    }

    fn simulate(
        plan: &RecoveryActionPlan,
        policy: &PolicyConstraint,
        options: &SimulationOptions,
    ) -> SimulationResult {
        Simulator::default().simulate_with(plan, policy, options).unwrap()
    }

    #[test]
    fn clean_run_completes_with_zero_risk() {
        let result = Simulator::default()
            .simulate(&payments_plan(), &payments_policy())
            .unwrap();

        assert_eq!(result.run_state, StepState::Completed);
        assert_eq!(result.window_state, WindowState::Completed);
        assert_eq!(result.final_risk_score, 0.0);
        assert_eq!(result.elapsed_minutes, 25);
        assert_eq!(
            result.steps[1].started_at,
            Some(window().start_utc + Duration::minutes(10))
        );
    }

    #[test]
    fn failed_dependency_leaves_dependent_queued() {
        let options = SimulationOptions::default().with_faults(FaultPlan::default().fail("rollback"));
        let result = simulate(&payments_plan(), &payments_policy(), &options);

        assert_eq!(result.run_state, StepState::Failed);
        assert_eq!(result.window_state, WindowState::Draft);
        assert_eq!(result.steps[1].state, StepState::Queued);
        assert_eq!(result.steps[1].attempts, 0);
        // nothing completed: (1 - 0) * 0.6
        assert_eq!(result.final_risk_score, 0.6);
        assert!(result
            .notes
            .contains(&"scale not started: dependency rollback did not complete".to_string()));
    }

    #[test]
    fn transient_failure_retries_within_budget() {
        let options =
            SimulationOptions::default().with_faults(FaultPlan::default().transient("rollback", 1));

        let no_retries = simulate(&payments_plan(), &payments_policy(), &options);
        assert_eq!(no_retries.steps[0].state, StepState::Failed);

        let policy = payments_policy().with_max_retries(1);
        let retried = simulate(&payments_plan(), &policy, &options);
        assert_eq!(retried.run_state, StepState::Completed);
        assert_eq!(retried.steps[0].attempts, 2);
        assert_eq!(retried.elapsed_minutes, 35);
    }

    #[test]
    fn incident_raises_risk() {
        let options = SimulationOptions::default().with_faults(FaultPlan::default().incident("scale"));
        let result = simulate(&payments_plan(), &payments_policy(), &options);
        assert_eq!(result.run_state, StepState::Completed);
        assert_eq!(result.final_risk_score, 0.5);
    }

    #[test]
    fn stall_keeps_window_executing() {
        let options = SimulationOptions::default().with_faults(FaultPlan::default().stall("rollback"));
        let result = simulate(&payments_plan(), &payments_policy(), &options);
        assert_eq!(result.run_state, StepState::Stalled);
        assert_eq!(result.window_state, WindowState::Executing);
    }

    #[test]
    fn wide_layer_runs_in_waves() {
        let plan = plan_with_layers(
            vec![
                candidate("a", ActionCategory::Scale, 10, &[]),
                candidate("b", ActionCategory::Scale, 5, &[]),
                candidate("c", ActionCategory::Scale, 7, &[]),
            ],
            &[&["a", "b", "c"]],
        );
        let result = simulate(&plan, &payments_policy(), &SimulationOptions::default());
        assert_eq!(result.elapsed_minutes, 17);
        assert_eq!(result.notes[0], "layer 0 ran in 2 waves of at most 2");
    }

    fn independent(count: usize, minutes: u32) -> RecoveryActionPlan {
        let ids: Vec<String> = (0..count).map(|i| format!("a{i}")).collect();
        let layer: Vec<&str> = ids.iter().map(String::as_str).collect();
        plan_with_layers(
            ids.iter()
                .map(|id| candidate(id, ActionCategory::Scale, minutes, &[]))
                .collect(),
            &[layer.as_slice()],
        )
    }

    #[test]
    fn serial_policy_runs_layer_one_step_at_a_time() {
        let policy = payments_policy().with_parallelism(false, None);
        let result = simulate(&independent(2, 10), &policy, &SimulationOptions::default());
        assert_eq!(result.elapsed_minutes, 20);
        assert_eq!(result.notes[0], "layer 0 ran in 2 waves of at most 1");
        assert_eq!(
            result.steps[1].started_at,
            Some(window().start_utc + Duration::minutes(10))
        );
    }

    #[test]
    fn wall_clock_budget_narrows_waves() {
        let mut policy = payments_policy().with_parallelism(true, Some(10));
        policy.max_concurrency = 6;
        let result = simulate(&independent(6, 10), &policy, &SimulationOptions::default());
        // floor(10 / 5) = 2 at a time
        assert_eq!(result.elapsed_minutes, 30);
    }

    #[test]
    fn unbounded_retry_budget_fails_without_spinning() {
        let policy = payments_policy().with_max_retries(u32::MAX);
        let options =
            SimulationOptions::default().with_faults(FaultPlan::default().fail("rollback"));
        let result = simulate(&payments_plan(), &policy, &options);
        assert_eq!(result.steps[0].state, StepState::Failed);
        assert_eq!(result.steps[0].attempts, u32::MAX);
        assert_eq!(result.elapsed_minutes, u32::MAX);
    }

    #[test]
    fn transient_failures_past_budget_use_every_attempt() {
        let policy = payments_policy().with_max_retries(2);
        let options =
            SimulationOptions::default().with_faults(FaultPlan::default().transient("rollback", 5));
        let result = simulate(&payments_plan(), &policy, &options);
        assert_eq!(result.steps[0].state, StepState::Failed);
        assert_eq!(result.steps[0].attempts, 3);
        assert_eq!(result.elapsed_minutes, 30);
    }

    #[test]
    fn cancellation_stops_later_layers() {
        let options = SimulationOptions::default().cancel_after(0);
        let result = simulate(&payments_plan(), &payments_policy(), &options);
        assert_eq!(result.window_state, WindowState::Canceled);
        assert_eq!(result.run_state, StepState::Executing);
        assert_eq!(result.steps[1].state, StepState::Queued);
        assert_eq!(result.elapsed_minutes, 10);
    }

    #[test]
    fn random_incidents_are_reproducible() {
        let options = SimulationOptions::default()
            .with_faults(FaultPlan::default().with_random_incidents(0.5, 7));
        let first = simulate(&payments_plan(), &payments_policy(), &options);
        let second = simulate(&payments_plan(), &payments_policy(), &options);
        assert_eq!(first, second);
    }

    #[test]
    fn bad_incident_rate_is_rejected() {
        let options = SimulationOptions::default()
            .with_faults(FaultPlan::default().with_random_incidents(1.5, 7));
        let err = Simulator::default()
            .simulate_with(&payments_plan(), &payments_policy(), &options)
            .unwrap_err();
        assert_eq!(err, SimulationError::InvalidIncidentRate(1.5));
    }

    #[test]
    fn risk_is_capped_at_one() {
        let options = SimulationOptions::default().with_faults(
            FaultPlan::default()
                .incident("rollback")
                .fail("rollback"),
        );
        let result = simulate(&payments_plan(), &payments_policy(), &options);
        // 1/2 incident pressure + 0.6 incomplete = 1.1 before clamping
        assert_eq!(result.final_risk_score, 1.0);
    }
}
