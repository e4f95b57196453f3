//! Recovery Types
//!
//! Plain data contracts shared by every component of the recovery planner:
//! - Observed [`Signal`]s and their [`Severity`]
//! - Remediation [`ActionCandidate`]s with dependency descriptors
//! - [`PolicyConstraint`]s, blackout windows and approval quorums
//! - Synthesized [`RecoveryActionPlan`]s and [`SimulationResult`]s
//!
//! Values are validated at the edges and never mutated by the engine;
//! re-synthesis or re-simulation produces a new value.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod action;
pub mod error;
pub mod ids;
pub mod lifecycle;
pub mod plan;
pub mod policy;
pub mod signal;
pub mod simulation;

pub use action::{ActionCandidate, ActionCategory, ActionDependency};
pub use error::{LifecycleError, PlanShapeError};
pub use ids::{ActionId, ApproverId, PlanId, ScenarioId, SignalId, TenantId, WindowId};
pub use lifecycle::WindowState;
pub use plan::{PlanTopology, RecoveryActionPlan};
pub use policy::{ApprovalPolicy, BlackoutWindow, PolicyConstraint, RecoveryWindow};
pub use signal::{clamp_unit, Fingerprint, Severity, Signal};
pub use simulation::{SimulationResult, StepOutcome, StepState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
