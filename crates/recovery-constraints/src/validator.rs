//! Constraint validator
//!
//! Runs every check in a fixed order and never stops at the first failure, so
//! an operator sees the complete list of violations in one pass.

use crate::checks::{
    AllowedCategoriesCheck, BlackoutWindowsCheck, CheckInput, DependencyCycleCheck,
    InvalidRtoCheck, MaxConcurrencyCheck, MissingApprovalsCheck, PlanCheck, SlaMinutesCheck,
};
use crate::context::ValidationContext;
use crate::error::{Result, ValidationError};
use crate::overlap::overlapping_windows;
use crate::violation::ValidationResult;
use recovery_types::{PolicyConstraint, RecoveryActionPlan};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Share of linked playbooks that must be approved
pub const DEFAULT_QUORUM_RATIO: f64 = 0.6;

/// Validator tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Quorum ratio applied to `playbook_count`
    pub quorum_ratio: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            quorum_ratio: DEFAULT_QUORUM_RATIO,
        }
    }
}

/// Evaluates plans against policy
#[derive(Debug)]
pub struct ConstraintValidator {
    checks: Vec<Box<dyn PlanCheck>>,
}

impl ConstraintValidator {
    /// Validator running the standard checks
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidQuorumRatio`] when the ratio is outside (0, 1].
    pub fn new(config: ValidatorConfig) -> Result<Self> {
        let ratio = config.quorum_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ValidationError::InvalidQuorumRatio(ratio));
        }

        Ok(Self {
            checks: vec![
                Box::new(MaxConcurrencyCheck),
                Box::new(AllowedCategoriesCheck),
                Box::new(SlaMinutesCheck),
                Box::new(BlackoutWindowsCheck),
                Box::new(MissingApprovalsCheck::new(ratio)),
                Box::new(InvalidRtoCheck),
                Box::new(DependencyCycleCheck),
            ],
        })
    }

    /// Append a custom check; it runs after the standard ones
    #[must_use]
    pub fn with_check(mut self, check: Box<dyn PlanCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Number of registered checks
    #[must_use]
    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    /// Evaluate a plan
    ///
    /// # Errors
    /// Returns [`ValidationError::Shape`] when the plan is structurally malformed.
    pub fn evaluate(
        &self,
        plan: &RecoveryActionPlan,
        policy: &PolicyConstraint,
        context: &ValidationContext,
    ) -> Result<ValidationResult> {
        plan.check_shape()?;

        let input = CheckInput {
            plan,
            policy,
            context,
        };

        let mut violations = Vec::new();
        for check in &self.checks {
            let found = check.evaluate(&input);
            if !found.is_empty() {
                debug!(constraint = %check.kind(), count = found.len(), "check reported violations");
            }
            violations.extend(found);
        }

        let mut windows = Vec::with_capacity(context.scheduled_windows.len() + 1);
        windows.push(plan.window.clone());
        windows.extend(context.scheduled_windows.iter().cloned());
        violations.extend(overlapping_windows(&windows));

        let result = ValidationResult::from_violations(violations);
        info!(
            plan_id = %plan.plan_id,
            allowed = result.allowed,
            errors = result.errors().count(),
            warnings = result.warnings().count(),
            "plan validated"
        );
        Ok(result)
    }
}

/// Validate with the default configuration
///
/// # Errors
/// Returns [`ValidationError::Shape`] when the plan is structurally malformed.
pub fn validate_plan(
    plan: &RecoveryActionPlan,
    policy: &PolicyConstraint,
    context: &ValidationContext,
) -> Result<ValidationResult> {
    ConstraintValidator::new(ValidatorConfig::default())?.evaluate(plan, policy, context)
}
