//! Simulation results

use crate::ids::{ActionId, ScenarioId, TenantId};
use crate::lifecycle::WindowState;
use crate::plan::RecoveryActionPlan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of one simulated step, also used for the run as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    /// Not started
    Queued,
    /// Started, not finished
    Executing,
    /// Finished successfully
    Completed,
    /// Finished unsuccessfully
    Failed,
    /// Started and never finished
    Stalled,
}

impl StepState {
    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StepState::Queued => "queued",
            StepState::Executing => "executing",
            StepState::Completed => "completed",
            StepState::Failed => "failed",
            StepState::Stalled => "stalled",
        }
    }
}

impl std::fmt::Display for StepState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Simulated outcome of one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Simulated action
    pub action_id: ActionId,
    /// Layer the action ran in
    pub layer: usize,
    /// Final state
    pub state: StepState,
    /// Attempts made, including retries
    pub attempts: u32,
    /// Start time, if the step started
    pub started_at: Option<DateTime<Utc>>,
    /// Finish time, if the step finished
    pub completed_at: Option<DateTime<Utc>>,
}

/// Result of one simulation call; never mutated afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Scenario simulated
    pub scenario_id: ScenarioId,
    /// Tenant simulated for
    pub tenant_id: TenantId,
    /// The plan simulated
    pub action_plan: RecoveryActionPlan,
    /// Residual risk in [0, 1]; lower is safer
    pub final_risk_score: f64,
    /// Window state after the run
    pub window_state: WindowState,
    /// Aggregate run state
    pub run_state: StepState,
    /// Per-step outcomes in execution order
    pub steps: Vec<StepOutcome>,
    /// Simulated wall-clock minutes
    pub elapsed_minutes: u32,
    /// Ordered diagnostics
    pub notes: Vec<String>,
}

impl SimulationResult {
    /// Steps that reached `state`
    #[must_use]
    pub fn count_in(&self, state: StepState) -> usize {
        self.steps.iter().filter(|s| s.state == state).count()
    }

    /// Whether every step completed
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.run_state == StepState::Completed
    }
}
