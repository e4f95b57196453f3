//! Testing utilities for the recovery planner workspace
//!
//! Shared fixtures for signals, candidates, policies, windows and plans.

#![allow(missing_docs)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use recovery_types::{
    ActionCandidate, ActionCategory, ActionId, Fingerprint, PlanId, PlanTopology,
    PolicyConstraint, RecoveryActionPlan, RecoveryWindow, ScenarioId, Severity, Signal,
    SignalId, TenantId,
};

pub const TENANT: &str = "acme";

/// Fixed instant used as the origin of every fixture
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// `epoch()` shifted by `minutes`
pub fn at_minute(minutes: i64) -> DateTime<Utc> {
    epoch() + Duration::minutes(minutes)
}

pub fn signal(id: &str, entity: &str, severity: Severity, confidence: f64) -> Signal {
    signal_with_code(id, entity, "anomaly", severity, confidence)
}

pub fn signal_with_code(
    id: &str,
    entity: &str,
    code: &str,
    severity: Severity,
    confidence: f64,
) -> Signal {
    signal_from_source(id, entity, "apm", code, severity, confidence)
}

pub fn signal_from_source(
    id: &str,
    entity: &str,
    source: &str,
    code: &str,
    severity: Severity,
    confidence: f64,
) -> Signal {
    Signal::new(
        SignalId::new(id),
        TenantId::new(TENANT),
        entity,
        epoch(),
        severity,
        confidence,
        Fingerprint::new(source, code),
    )
}

pub fn candidate(id: &str, category: ActionCategory, minutes: u32, deps: &[&str]) -> ActionCandidate {
    deps.iter().fold(
        ActionCandidate::new(id, "payments", category, minutes),
        |c, dep| c.depends_on(*dep),
    )
}

/// Two-hour window starting at `epoch()`
pub fn window() -> RecoveryWindow {
    RecoveryWindow::new("window-1", epoch(), at_minute(120), "eu-west-1", "sre")
}

pub fn window_between(id: &str, start_minute: i64, end_minute: i64) -> RecoveryWindow {
    RecoveryWindow::new(id, at_minute(start_minute), at_minute(end_minute), "eu-west-1", "sre")
}

/// The payments scenario policy: concurrency 2, rollback + scale, 30 minute SLA
pub fn payments_policy() -> PolicyConstraint {
    PolicyConstraint::new(
        TENANT,
        2,
        [ActionCategory::Rollback, ActionCategory::Scale],
        30,
    )
}

pub fn payments_signals() -> Vec<Signal> {
    vec![signal("sig-1", "payments", Severity::Critical, 0.9)]
}

/// `rollback` (10m) followed by `scale` (15m)
pub fn payments_candidates() -> Vec<ActionCandidate> {
    vec![
        candidate("rollback", ActionCategory::Rollback, 10, &[]),
        candidate("scale", ActionCategory::Scale, 15, &["rollback"]),
    ]
}

/// Hand-built plan over `sequence` with the given layering
pub fn plan_with_layers(sequence: Vec<ActionCandidate>, layers: &[&[&str]]) -> RecoveryActionPlan {
    let layers: Vec<Vec<ActionId>> = layers
        .iter()
        .map(|layer| layer.iter().map(|id| ActionId::new(*id)).collect())
        .collect();
    let critical_path_minutes = layers
        .iter()
        .map(|layer| {
            layer
                .iter()
                .filter_map(|id| sequence.iter().find(|c| &c.action_id == id))
                .map(|c| c.estimated_minutes)
                .max()
                .unwrap_or(0)
        })
        .sum();

    RecoveryActionPlan {
        plan_id: PlanId::new("plan-fixture"),
        scenario_id: ScenarioId::new("scenario-fixture"),
        tenant_id: TenantId::new(TENANT),
        estimated_completion_minutes: critical_path_minutes,
        aggregate_confidence: 0.9,
        rationale: "fixture".to_string(),
        window: window(),
        target_rto_minutes: None,
        topology: PlanTopology {
            layers,
            has_cycle: false,
            isolated_count: 0,
            critical_path_minutes,
        },
        sequence,
        created_at_utc: epoch(),
    }
}
