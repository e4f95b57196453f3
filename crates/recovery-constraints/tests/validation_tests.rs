//! Validator behaviour across all checks

use pretty_assertions::assert_eq;
use recovery_constraints::{
    validate_plan, ConstraintKind, ValidationContext, ViolationSeverity,
};
use recovery_test_utils::{
    at_minute, candidate, epoch, payments_candidates, payments_policy, plan_with_layers,
    window_between,
};
use recovery_types::{ActionCategory, BlackoutWindow, RecoveryActionPlan, WindowState};

fn payments_plan() -> RecoveryActionPlan {
    plan_with_layers(payments_candidates(), &[&["rollback"], &["scale"]])
}

#[test]
fn payments_plan_is_allowed() {
    let result = validate_plan(
        &payments_plan(),
        &payments_policy(),
        &ValidationContext::new(epoch()),
    )
    .unwrap();

    assert!(result.allowed);
    assert!(result.violations.is_empty());
    assert_eq!(result.window_state, WindowState::Approved);
}

#[test]
fn three_wide_layer_breaks_concurrency() {
    let plan = plan_with_layers(
        vec![
            candidate("a", ActionCategory::Rollback, 5, &[]),
            candidate("b", ActionCategory::Scale, 5, &[]),
            candidate("c", ActionCategory::Scale, 5, &[]),
        ],
        &[&["a", "b", "c"]],
    );

    let result = validate_plan(&plan, &payments_policy(), &ValidationContext::new(epoch())).unwrap();

    assert!(!result.allowed);
    let concurrency: Vec<_> = result
        .violations
        .iter()
        .filter(|v| v.constraint == ConstraintKind::MaxConcurrency)
        .collect();
    assert_eq!(concurrency.len(), 1);
    assert_eq!(concurrency[0].severity, ViolationSeverity::Error);
}

#[test]
fn blackout_blocks_an_otherwise_clean_plan() {
    let policy = payments_policy().with_blackout(BlackoutWindow::new(at_minute(-5), at_minute(5)));

    let result = validate_plan(&payments_plan(), &policy, &ValidationContext::new(epoch())).unwrap();

    assert!(!result.allowed);
    assert_eq!(result.window_state, WindowState::Draft);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].constraint, ConstraintKind::BlackoutWindows);
}

#[test]
fn all_violations_surface_in_check_order() {
    let mut plan = plan_with_layers(
        vec![
            candidate("p1", ActionCategory::Patch, 40, &[]),
            candidate("p2", ActionCategory::Patch, 40, &[]),
            candidate("p3", ActionCategory::Patch, 40, &[]),
        ],
        &[&["p1", "p2", "p3"]],
    );
    let policy = payments_policy()
        .with_blackout(BlackoutWindow::new(at_minute(-5), at_minute(5)))
        .with_minimum_approvals(2)
        .with_rto(45, 10);
    plan.target_rto_minutes = policy.target_rto_minutes;
    let ctx = ValidationContext::new(epoch()).with_approval("alice");

    let result = validate_plan(&plan, &policy, &ctx).unwrap();

    let kinds: Vec<_> = result.violations.iter().map(|v| v.constraint).collect();
    assert_eq!(
        kinds,
        vec![
            ConstraintKind::MaxConcurrency,
            ConstraintKind::AllowedCategories,
            ConstraintKind::SlaMinutes,
            ConstraintKind::BlackoutWindows,
            ConstraintKind::MissingApprovals,
            ConstraintKind::InvalidRto,
        ]
    );
    assert_eq!(result.warnings().count(), 1);
}

#[test]
fn scheduled_window_overlap_is_only_a_warning() {
    let ctx = ValidationContext::new(epoch())
        .with_scheduled_window(window_between("maintenance", 60, 180))
        .with_scheduled_window(window_between("maintenance", 60, 180));

    let result = validate_plan(&payments_plan(), &payments_policy(), &ctx).unwrap();

    assert!(result.allowed);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].constraint, ConstraintKind::WindowOverlap);
}

#[test]
fn cyclic_topology_is_rejected() {
    let mut plan = plan_with_layers(
        vec![
            candidate("a", ActionCategory::Rollback, 5, &["b"]),
            candidate("b", ActionCategory::Rollback, 5, &["a"]),
        ],
        &[&["a", "b"]],
    );
    plan.topology.has_cycle = true;

    let result = validate_plan(&plan, &payments_policy(), &ValidationContext::new(epoch())).unwrap();

    assert!(!result.allowed);
    assert!(result.has(ConstraintKind::DependencyCycle));
}
