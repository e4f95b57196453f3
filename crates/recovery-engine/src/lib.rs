//! Recovery Engine
//!
//! Synthesizes executable recovery plans from signals and candidate actions,
//! then forecasts their execution:
//! - [`PlanSynthesizer`] orders candidates by dependency layer and duration
//! - [`Simulator`] walks the plan layer by layer and scores residual risk
//! - [`ExecutionEnvelope`] and [`DispatchSchedule`] describe how an external
//!   executor should run the plan
//! - [`RecoveryEngine`] wires these together with validation
//!
//! The engine is synchronous and pure: the clock, approvals and configuration
//! are all inputs.
//!
//! # Example
//!
//! ```rust,ignore
//! let plan = recovery_engine::synthesize_plan(&signals, &candidates, &policy, &window)?;
//! let result = recovery_engine::simulate_plan(&plan, &policy)?;
//! println!("risk {}", result.final_risk_score);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod simulator;
pub mod synthesizer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, EngineConfig, SimulationConfig, SynthesisConfig};
pub use dispatch::{DispatchSchedule, DispatchWave, ExecutionEnvelope, RetryDecision};
pub use engine::{Assessment, EngineError, RecoveryEngine, Scenario};
pub use simulator::{FaultPlan, SimulationError, SimulationOptions, Simulator};
pub use synthesizer::{PlanSynthesizer, SynthesisError};

use recovery_constraints::{ValidationContext, ValidationError, ValidationResult};
use recovery_signals::SignalSummary;
use recovery_types::{
    ActionCandidate, PolicyConstraint, RecoveryActionPlan, RecoveryWindow, ScenarioId, Signal,
    SimulationResult,
};

/// Summarize signals
#[must_use]
pub fn aggregate_signals(signals: &[Signal]) -> SignalSummary {
    recovery_signals::summarize(signals)
}

/// Synthesize a plan with default settings; the scenario is named after the window
///
/// # Errors
/// Returns [`SynthesisError`] for empty or malformed candidate sets.
pub fn synthesize_plan(
    signals: &[Signal],
    candidates: &[ActionCandidate],
    policy: &PolicyConstraint,
    window: &RecoveryWindow,
) -> Result<RecoveryActionPlan, SynthesisError> {
    let scenario_id = ScenarioId::new(window.window_id.as_str());
    PlanSynthesizer::default().synthesize(&scenario_id, signals, candidates, policy, window)
}

/// Validate a plan with default settings
///
/// # Errors
/// Returns [`ValidationError`] when the plan is structurally malformed.
pub fn validate_plan(
    plan: &RecoveryActionPlan,
    policy: &PolicyConstraint,
    context: &ValidationContext,
) -> Result<ValidationResult, ValidationError> {
    recovery_constraints::validate_plan(plan, policy, context)
}

/// Simulate a plan with default settings and no faults
///
/// # Errors
/// Returns [`SimulationError`] when the plan is structurally malformed.
pub fn simulate_plan(
    plan: &RecoveryActionPlan,
    policy: &PolicyConstraint,
) -> Result<SimulationResult, SimulationError> {
    Simulator::default().simulate(plan, policy)
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
