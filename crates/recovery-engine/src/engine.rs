//! Recovery engine facade
//!
//! Wires aggregation, synthesis, validation and simulation together behind one
//! value. The engine holds no mutable state, so a shared reference can serve
//! concurrent calls for different scenarios.

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, EngineConfig};
use crate::simulator::{SimulationError, SimulationOptions, Simulator};
use crate::synthesizer::{PlanSynthesizer, SynthesisError};
use rayon::prelude::*;
use recovery_constraints::{ConstraintValidator, ValidationContext, ValidationError, ValidationResult};
use recovery_signals::{build_clusters, summarize, Cluster, SignalSummary};
use recovery_types::{
    ActionCandidate, LifecycleError, PolicyConstraint, RecoveryActionPlan, RecoveryWindow,
    ScenarioId, Signal, SimulationResult, WindowState,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Errors surfaced by the engine facade
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Plan could not be synthesized
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// Plan could not be validated
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Plan could not be simulated
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// Window lifecycle violated
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Result alias for the engine
pub type Result<T> = std::result::Result<T, EngineError>;

/// Everything needed to assess one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario identifier
    pub scenario_id: ScenarioId,
    /// Observed signals
    #[serde(default)]
    pub signals: Vec<Signal>,
    /// Candidate actions
    pub candidates: Vec<ActionCandidate>,
    /// Policy in force
    pub policy: PolicyConstraint,
    /// Scheduling window
    pub window: RecoveryWindow,
    /// Validation context; the engine clock is used when absent
    #[serde(default)]
    pub context: Option<ValidationContext>,
    /// Simulation options
    #[serde(default)]
    pub simulation: SimulationOptions,
}

/// Full assessment of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Signal summary
    pub summary: SignalSummary,
    /// Signal clusters
    pub clusters: Vec<Cluster>,
    /// Synthesized plan
    pub plan: RecoveryActionPlan,
    /// Simulated run
    pub simulation: SimulationResult,
    /// Validation including the simulated completion time
    pub validation: ValidationResult,
    /// Window states passed through, starting at `Draft`
    pub lifecycle: Vec<WindowState>,
}

impl Assessment {
    /// Final window state
    #[must_use]
    pub fn window_state(&self) -> WindowState {
        self.lifecycle.last().copied().unwrap_or(WindowState::Draft)
    }
}

/// Recovery planning engine
#[derive(Debug)]
pub struct RecoveryEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    synthesizer: PlanSynthesizer,
    validator: ConstraintValidator,
    simulator: Simulator,
}

impl RecoveryEngine {
    /// Create an engine using the system clock
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] or [`EngineError::Validation`] when the
    /// configuration is out of range.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Ok(Self {
            synthesizer: PlanSynthesizer::new(config.synthesis.clone()).with_clock(clock.clone()),
            validator: ConstraintValidator::new(config.validation)?,
            simulator: Simulator::new(config.simulation.clone()),
            clock,
            config,
        })
    }

    /// With clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.synthesizer = self.synthesizer.with_clock(clock.clone());
        self.clock = clock;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Summarize signals
    #[must_use]
    pub fn aggregate_signals(&self, signals: &[Signal]) -> SignalSummary {
        summarize(signals)
    }

    /// Group signals by entity and code
    #[must_use]
    pub fn cluster_signals(&self, signals: &[Signal]) -> Vec<Cluster> {
        build_clusters(signals)
    }

    /// Synthesize a plan
    ///
    /// # Errors
    /// Returns [`EngineError::Synthesis`] for empty or malformed candidate sets.
    #[instrument(skip_all, fields(scenario = %scenario_id, candidates = candidates.len()))]
    pub fn synthesize_plan(
        &self,
        scenario_id: &ScenarioId,
        signals: &[Signal],
        candidates: &[ActionCandidate],
        policy: &PolicyConstraint,
        window: &RecoveryWindow,
    ) -> Result<RecoveryActionPlan> {
        Ok(self
            .synthesizer
            .synthesize(scenario_id, signals, candidates, policy, window)?)
    }

    /// Validate a plan
    ///
    /// # Errors
    /// Returns [`EngineError::Validation`] when the plan is structurally malformed.
    #[instrument(skip_all, fields(plan = %plan.plan_id))]
    pub fn validate_plan(
        &self,
        plan: &RecoveryActionPlan,
        policy: &PolicyConstraint,
        context: &ValidationContext,
    ) -> Result<ValidationResult> {
        Ok(self.validator.evaluate(plan, policy, context)?)
    }

    /// Simulate a plan without faults
    ///
    /// # Errors
    /// Returns [`EngineError::Simulation`] when the plan is structurally malformed.
    pub fn simulate_plan(
        &self,
        plan: &RecoveryActionPlan,
        policy: &PolicyConstraint,
    ) -> Result<SimulationResult> {
        self.simulate_plan_with(plan, policy, &SimulationOptions::default())
    }

    /// Simulate a plan with options
    ///
    /// # Errors
    /// Returns [`EngineError::Simulation`] for malformed plans or bad options.
    #[instrument(skip_all, fields(plan = %plan.plan_id))]
    pub fn simulate_plan_with(
        &self,
        plan: &RecoveryActionPlan,
        policy: &PolicyConstraint,
        options: &SimulationOptions,
    ) -> Result<SimulationResult> {
        Ok(self.simulator.simulate_with(plan, policy, options)?)
    }

    /// Simulate many independent plans in parallel; results keep input order
    pub fn simulate_batch(
        &self,
        runs: &[(RecoveryActionPlan, PolicyConstraint)],
    ) -> Vec<Result<SimulationResult>> {
        runs.par_iter()
            .map(|(plan, policy)| self.simulate_plan(plan, policy))
            .collect()
    }

    /// Summarize, synthesize, simulate and validate one scenario
    ///
    /// Validation sees the simulated completion time, so the RTO buffer is
    /// checked against the simulated run rather than the estimate.
    ///
    /// # Errors
    /// Returns the first structural error encountered.
    #[instrument(skip_all, fields(scenario = %scenario.scenario_id))]
    pub fn assess(&self, scenario: &Scenario) -> Result<Assessment> {
        let summary = self.aggregate_signals(&scenario.signals);
        let clusters = self.cluster_signals(&scenario.signals);
        let plan = self.synthesize_plan(
            &scenario.scenario_id,
            &scenario.signals,
            &scenario.candidates,
            &scenario.policy,
            &scenario.window,
        )?;

        let mut lifecycle = vec![WindowState::Draft];
        let mut state = advance(&mut lifecycle, WindowState::Draft, WindowState::Simulating)?;

        let simulation = self.simulate_plan_with(&plan, &scenario.policy, &scenario.simulation)?;
        let context = scenario
            .context
            .clone()
            .unwrap_or_else(|| ValidationContext::new(self.clock.now()))
            .with_simulated_completion(simulation.elapsed_minutes);
        let validation = self.validate_plan(&plan, &scenario.policy, &context)?;

        let next = match simulation.window_state {
            WindowState::Canceled => WindowState::Canceled,
            WindowState::Draft => WindowState::Draft,
            _ => validation.window_state,
        };
        state = advance(&mut lifecycle, state, next)?;

        info!(
            plan_id = %plan.plan_id,
            allowed = validation.allowed,
            risk = simulation.final_risk_score,
            state = %state,
            "scenario assessed"
        );

        Ok(Assessment {
            summary,
            clusters,
            plan,
            simulation,
            validation,
            lifecycle,
        })
    }
}

fn advance(
    trail: &mut Vec<WindowState>,
    from: WindowState,
    to: WindowState,
) -> std::result::Result<WindowState, LifecycleError> {
    let state = from.transition(to)?;
    trail.push(state);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::simulator::FaultPlan;
    use pretty_assertions::assert_eq;
    use recovery_test_utils::{
        epoch, payments_candidates, payments_policy, payments_signals, window,
    };

    fn engine() -> RecoveryEngine {
        RecoveryEngine::new(EngineConfig::default())
            .unwrap()
            .with_clock(Arc::new(FixedClock(epoch())))
    }

    fn payments_scenario() -> Scenario {
        Scenario {
            scenario_id: ScenarioId::new("payments-outage"),
            signals: payments_signals(),
            candidates: payments_candidates(),
            policy: payments_policy(),
            window: window(),
            context: None,
            simulation: SimulationOptions::default(),
        }
    }

    #[test]
    fn clean_scenario_is_approved() {
        let assessment = engine().assess(&payments_scenario()).unwrap();
        assert!(assessment.validation.allowed);
        assert_eq!(
            assessment.lifecycle,
            vec![WindowState::Draft, WindowState::Simulating, WindowState::Approved]
        );
        assert_eq!(assessment.plan.created_at_utc, epoch());
    }

    #[test]
    fn failed_simulation_rejects_to_draft() {
        let mut scenario = payments_scenario();
        scenario.simulation = FaultPlan::default().fail("scale").into();
        let assessment = engine().assess(&scenario).unwrap();
        assert_eq!(assessment.window_state(), WindowState::Draft);
    }

    #[test]
    fn batch_keeps_input_order() {
        let engine = engine();
        let plan = engine
            .synthesize_plan(
                &ScenarioId::new("payments-outage"),
                &payments_signals(),
                &payments_candidates(),
                &payments_policy(),
                &window(),
            )
            .unwrap();
        let mut broken = plan.clone();
        broken.sequence.clear();

        let results = engine.simulate_batch(&[
            (plan.clone(), payments_policy()),
            (broken, payments_policy()),
            (plan, payments_policy()),
        ]);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(EngineError::Simulation(_))));
        assert!(results[2].is_ok());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.validation.quorum_ratio = 2.0;
        assert!(matches!(
            RecoveryEngine::new(config),
            Err(EngineError::Config(_))
        ));
    }
}
