//! Individual policy checks
//!
//! Each check inspects a plan against the policy and context and reports zero or
//! more violations. Checks never short-circuit each other; the validator runs all
//! of them and concatenates the results.

use crate::context::ValidationContext;
use crate::violation::{ConstraintKind, Violation};
use recovery_types::{ActionCategory, PolicyConstraint, RecoveryActionPlan};
use std::collections::BTreeSet;

/// Everything a check may look at
#[derive(Debug, Clone, Copy)]
pub struct CheckInput<'a> {
    /// Plan under validation
    pub plan: &'a RecoveryActionPlan,
    /// Policy in force
    pub policy: &'a PolicyConstraint,
    /// Caller-supplied context
    pub context: &'a ValidationContext,
}

/// A single constraint evaluated against a plan
pub trait PlanCheck: Send + Sync + std::fmt::Debug {
    /// Constraint this check reports under
    fn kind(&self) -> ConstraintKind;

    /// Evaluate the check
    fn evaluate(&self, input: &CheckInput<'_>) -> Vec<Violation>;
}

/// Widest execution layer must fit the concurrency cap
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxConcurrencyCheck;

impl PlanCheck for MaxConcurrencyCheck {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::MaxConcurrency
    }

    fn evaluate(&self, input: &CheckInput<'_>) -> Vec<Violation> {
        let limit = input.policy.max_concurrency;
        input
            .plan
            .topology
            .layers
            .iter()
            .enumerate()
            .filter(|(_, layer)| layer.len() > limit)
            .map(|(index, layer)| {
                Violation::error(
                    self.kind(),
                    format!(
                        "layer {index} runs {} actions concurrently, limit is {limit}",
                        layer.len()
                    ),
                )
            })
            .collect()
    }
}

/// Every action category must be whitelisted
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowedCategoriesCheck;

impl PlanCheck for AllowedCategoriesCheck {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::AllowedCategories
    }

    fn evaluate(&self, input: &CheckInput<'_>) -> Vec<Violation> {
        let offending: BTreeSet<ActionCategory> = input
            .plan
            .sequence
            .iter()
            .map(|c| c.category)
            .filter(|category| !input.policy.allows(*category))
            .collect();

        if offending.is_empty() {
            return Vec::new();
        }

        let listed = offending
            .iter()
            .copied()
            .map(ActionCategory::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        vec![Violation::error(
            self.kind(),
            format!("categories not allowed by policy: {listed}"),
        )]
    }
}

/// Estimated completion should fit the SLA; a miss is a warning
#[derive(Debug, Clone, Copy, Default)]
pub struct SlaMinutesCheck;

impl PlanCheck for SlaMinutesCheck {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::SlaMinutes
    }

    fn evaluate(&self, input: &CheckInput<'_>) -> Vec<Violation> {
        let estimate = input.plan.estimated_completion_minutes;
        let sla = input.policy.sla_minutes;
        if estimate > sla {
            vec![Violation::warning(
                self.kind(),
                format!("estimated completion {estimate}m exceeds SLA of {sla}m"),
            )]
        } else {
            Vec::new()
        }
    }
}

/// No run may start inside a blackout
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackoutWindowsCheck;

impl PlanCheck for BlackoutWindowsCheck {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::BlackoutWindows
    }

    fn evaluate(&self, input: &CheckInput<'_>) -> Vec<Violation> {
        let now = input.context.now_utc;
        input
            .policy
            .blackout_windows
            .iter()
            .filter(|blackout| blackout.contains(now))
            .map(|blackout| {
                let reason = blackout
                    .reason
                    .as_deref()
                    .map(|r| format!(" ({r})"))
                    .unwrap_or_default();
                Violation::error(
                    self.kind(),
                    format!(
                        "{} falls inside blackout {} .. {}{reason}",
                        now.to_rfc3339(),
                        blackout.start_utc.to_rfc3339(),
                        blackout.end_utc.to_rfc3339()
                    ),
                )
            })
            .collect()
    }
}

/// Approval quorum: `max(minimum_approvals, ceil(playbook_count * ratio))`
#[derive(Debug, Clone, Copy)]
pub struct MissingApprovalsCheck {
    quorum_ratio: f64,
}

impl MissingApprovalsCheck {
    /// Check with the given playbook quorum ratio
    #[inline]
    #[must_use]
    pub fn new(quorum_ratio: f64) -> Self {
        Self { quorum_ratio }
    }

    /// Approvals required for the given policy and context
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn required(&self, policy: &PolicyConstraint, context: &ValidationContext) -> usize {
        let from_playbooks = (context.playbook_count as f64 * self.quorum_ratio).ceil() as usize;
        policy.approval.minimum_approvals.max(from_playbooks)
    }
}

impl Default for MissingApprovalsCheck {
    fn default() -> Self {
        Self::new(crate::validator::DEFAULT_QUORUM_RATIO)
    }
}

impl PlanCheck for MissingApprovalsCheck {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::MissingApprovals
    }

    fn evaluate(&self, input: &CheckInput<'_>) -> Vec<Violation> {
        let required = self.required(input.policy, input.context);
        let active = input.context.distinct_approvals();
        if active < required {
            vec![Violation::error(
                self.kind(),
                format!("{active} of {required} required approvals present"),
            )]
        } else {
            Vec::new()
        }
    }
}

/// The SLA buffer must survive inside the RTO budget after simulation
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidRtoCheck;

impl PlanCheck for InvalidRtoCheck {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::InvalidRto
    }

    fn evaluate(&self, input: &CheckInput<'_>) -> Vec<Violation> {
        let budget = input.plan.rto_budget_minutes();
        let completion = input
            .context
            .simulated_completion_minutes
            .unwrap_or(input.plan.estimated_completion_minutes);
        let buffer = input.policy.sla_buffer_minutes;
        let remaining = budget - i64::from(completion);

        if remaining < i64::from(buffer) {
            vec![Violation::error(
                self.kind(),
                format!(
                    "RTO budget {budget}m leaves {remaining}m after {completion}m completion, buffer requires {buffer}m"
                ),
            )]
        } else {
            Vec::new()
        }
    }
}

/// Layering is unreliable when the dependency graph is cyclic
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyCycleCheck;

impl PlanCheck for DependencyCycleCheck {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::DependencyCycle
    }

    fn evaluate(&self, input: &CheckInput<'_>) -> Vec<Violation> {
        let topology = &input.plan.topology;
        if !topology.has_cycle {
            return Vec::new();
        }
        let remainder = topology
            .layers
            .last()
            .map(|layer| {
                layer
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        vec![Violation::error(
            self.kind(),
            format!("dependency cycle among: {remainder}"),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recovery_test_utils::{
        at_minute, candidate, epoch, payments_candidates, payments_policy, plan_with_layers,
    };
    use recovery_types::BlackoutWindow;

    fn run(
        check: &dyn PlanCheck,
        plan: &RecoveryActionPlan,
        policy: &PolicyConstraint,
        ctx: &ValidationContext,
    ) -> Vec<Violation> {
        check.evaluate(&CheckInput {
            plan,
            policy,
            context: ctx,
        })
    }

    fn payments_plan() -> RecoveryActionPlan {
        plan_with_layers(payments_candidates(), &[&["rollback"], &["scale"]])
    }

    #[test]
    fn concurrency_reports_each_wide_layer() {
        let plan = plan_with_layers(
            vec![
                candidate("a", ActionCategory::Rollback, 5, &[]),
                candidate("b", ActionCategory::Rollback, 5, &[]),
                candidate("c", ActionCategory::Rollback, 5, &[]),
            ],
            &[&["a", "b", "c"]],
        );
        let violations = run(
            &MaxConcurrencyCheck,
            &plan,
            &payments_policy(),
            &ValidationContext::new(epoch()),
        );
        assert_eq!(violations.len(), 1);
        assert!(violations[0].is_error());
        assert!(violations[0].detail.contains("limit is 2"));
    }

    #[test]
    fn categories_are_enumerated_once() {
        let plan = plan_with_layers(
            vec![
                candidate("p1", ActionCategory::Patch, 5, &[]),
                candidate("p2", ActionCategory::Patch, 5, &["p1"]),
                candidate("e", ActionCategory::Evacuate, 5, &["p2"]),
            ],
            &[&["p1"], &["p2"], &["e"]],
        );
        let violations = run(
            &AllowedCategoriesCheck,
            &plan,
            &payments_policy(),
            &ValidationContext::new(epoch()),
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].detail,
            "categories not allowed by policy: evacuate, patch"
        );
    }

    #[test]
    fn sla_miss_is_a_warning() {
        let mut policy = payments_policy();
        policy.sla_minutes = 20;
        let violations = run(
            &SlaMinutesCheck,
            &payments_plan(),
            &policy,
            &ValidationContext::new(epoch()),
        );
        assert_eq!(violations.len(), 1);
        assert!(!violations[0].is_error());
    }

    #[test]
    fn blackout_bounds_are_inclusive() {
        let policy = payments_policy()
            .with_blackout(BlackoutWindow::new(at_minute(-30), epoch()).with_reason("freeze"));
        let inside = run(
            &BlackoutWindowsCheck,
            &payments_plan(),
            &policy,
            &ValidationContext::new(epoch()),
        );
        assert_eq!(inside.len(), 1);
        assert!(inside[0].detail.ends_with("(freeze)"));

        let after = run(
            &BlackoutWindowsCheck,
            &payments_plan(),
            &policy,
            &ValidationContext::new(at_minute(1)),
        );
        assert!(after.is_empty());
    }

    #[test]
    fn quorum_uses_playbook_ratio() {
        let check = MissingApprovalsCheck::new(0.6);
        let policy = payments_policy().with_minimum_approvals(1);
        // ceil(4 * 0.6) = 3
        let ctx = ValidationContext::new(epoch())
            .with_playbooks(4)
            .with_approval("alice")
            .with_approval("bob");
        assert_eq!(check.required(&policy, &ctx), 3);
        assert_eq!(run(&check, &payments_plan(), &policy, &ctx).len(), 1);

        let ctx = ctx.with_approval("carol");
        assert!(run(&check, &payments_plan(), &policy, &ctx).is_empty());
    }

    #[test]
    fn rto_buffer_uses_simulated_completion() {
        let policy = payments_policy().with_rto(40, 10);
        let mut plan = payments_plan();
        plan.target_rto_minutes = policy.target_rto_minutes;

        let ctx = ValidationContext::new(epoch());
        assert!(run(&InvalidRtoCheck, &plan, &policy, &ctx).is_empty());

        let ctx = ctx.with_simulated_completion(35);
        let violations = run(&InvalidRtoCheck, &plan, &policy, &ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].constraint, ConstraintKind::InvalidRto);
    }

    #[test]
    fn rto_falls_back_to_window_length() {
        // 120 minute window, 25 minute estimate
        let policy = payments_policy().with_rto(0, 100);
        let mut plan = payments_plan();
        plan.target_rto_minutes = None;
        let ctx = ValidationContext::new(epoch());
        assert_eq!(run(&InvalidRtoCheck, &plan, &policy, &ctx).len(), 1);
    }

    #[test]
    fn cycle_lists_remainder_layer() {
        let mut plan = plan_with_layers(
            vec![
                candidate("a", ActionCategory::Rollback, 5, &["b"]),
                candidate("b", ActionCategory::Rollback, 5, &["a"]),
            ],
            &[&["a", "b"]],
        );
        plan.topology.has_cycle = true;
        let violations = run(
            &DependencyCycleCheck,
            &plan,
            &payments_policy(),
            &ValidationContext::new(epoch()),
        );
        assert_eq!(violations[0].detail, "dependency cycle among: a, b");
    }
}
