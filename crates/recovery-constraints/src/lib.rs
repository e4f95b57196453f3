//! # Recovery Constraints
//!
//! Validates a synthesized recovery plan against operational policy:
//! concurrency caps, category whitelists, SLA and RTO budgets, blackout
//! windows and approval quorums.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod checks;
pub mod context;
pub mod error;
pub mod overlap;
pub mod validator;
pub mod violation;

pub use checks::{
    AllowedCategoriesCheck, BlackoutWindowsCheck, CheckInput, DependencyCycleCheck,
    InvalidRtoCheck, MaxConcurrencyCheck, MissingApprovalsCheck, PlanCheck, SlaMinutesCheck,
};
pub use context::ValidationContext;
pub use error::{Result, ValidationError};
pub use overlap::overlapping_windows;
pub use validator::{validate_plan, ConstraintValidator, ValidatorConfig, DEFAULT_QUORUM_RATIO};
pub use violation::{ConstraintKind, ValidationResult, Violation, ViolationSeverity};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
