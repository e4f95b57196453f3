//! Output formatting

use recovery_constraints::{ValidationResult, Violation};
use recovery_engine::Assessment;
use recovery_types::{RecoveryActionPlan, SimulationResult, StepOutcome};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

/// Render a serializable value in a machine format
pub(crate) fn render_data<T: Serialize>(
    value: &T,
    format: OutputFormat,
) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json | OutputFormat::Table => serde_json::to_string_pretty(value)?,
    })
}

#[derive(Tabled)]
struct ViolationRow {
    #[tabled(rename = "Constraint")]
    constraint: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&Violation> for ViolationRow {
    fn from(v: &Violation) -> Self {
        Self {
            constraint: v.constraint.to_string(),
            severity: v.severity.to_string(),
            detail: v.detail.clone(),
        }
    }
}

#[derive(Tabled)]
struct ActionRow {
    #[tabled(rename = "#")]
    order: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Layer")]
    layer: usize,
    #[tabled(rename = "Minutes")]
    minutes: u32,
    #[tabled(rename = "Depends On")]
    depends_on: String,
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Layer")]
    layer: usize,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Attempts")]
    attempts: u32,
    #[tabled(rename = "Started")]
    started: String,
    #[tabled(rename = "Completed")]
    completed: String,
}

impl From<&StepOutcome> for StepRow {
    fn from(step: &StepOutcome) -> Self {
        let time = |t: Option<chrono::DateTime<chrono::Utc>>| {
            t.map_or_else(|| "-".to_string(), |t| t.format("%H:%M").to_string())
        };
        Self {
            action: step.action_id.to_string(),
            layer: step.layer,
            state: step.state.to_string(),
            attempts: step.attempts,
            started: time(step.started_at),
            completed: time(step.completed_at),
        }
    }
}

/// Violations as a table; warnings are never dropped
pub(crate) fn violation_table(result: &ValidationResult) -> String {
    if result.violations.is_empty() {
        return "No violations".to_string();
    }
    Table::new(result.violations.iter().map(ViolationRow::from)).to_string()
}

/// Plan header and ordered actions
pub(crate) fn plan_table(plan: &RecoveryActionPlan) -> String {
    let layers = plan.topology.layer_index();
    let rows = plan.sequence.iter().enumerate().map(|(i, c)| ActionRow {
        order: i + 1,
        action: c.action_id.to_string(),
        category: c.category.to_string(),
        layer: layers.get(&c.action_id).copied().unwrap_or_default(),
        minutes: c.estimated_minutes,
        depends_on: c
            .dependency
            .depends_on
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    });

    let mut out = format!(
        "Plan {} ({})\n{}\nEstimate: {}m, confidence {:.2}{}\n",
        plan.plan_id,
        plan.scenario_id,
        plan.rationale,
        plan.estimated_completion_minutes,
        plan.aggregate_confidence,
        if plan.topology.has_cycle {
            ", ordering unreliable: dependency cycle"
        } else {
            ""
        }
    );
    out.push_str(&Table::new(rows).to_string());
    out
}

/// Simulation summary, steps and notes
pub(crate) fn simulation_table(result: &SimulationResult) -> String {
    let mut out = format!(
        "Run {} in {}m, window {}, risk {}\n",
        result.run_state, result.elapsed_minutes, result.window_state, result.final_risk_score
    );
    out.push_str(&Table::new(result.steps.iter().map(StepRow::from)).to_string());
    for note in &result.notes {
        out.push_str("\n  - ");
        out.push_str(note);
    }
    out
}

/// Everything produced for one scenario
pub(crate) fn assessment_table(assessment: &Assessment) -> String {
    let lifecycle = assessment
        .lifecycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ");
    format!(
        "{}\n\n{}\n\n{}\n\nLifecycle: {lifecycle}",
        plan_table(&assessment.plan),
        simulation_table(&assessment.simulation),
        violation_table(&assessment.validation),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use recovery_constraints::{ConstraintKind, Violation};
    use recovery_test_utils::{payments_candidates, plan_with_layers};

    #[test]
    fn violation_table_keeps_warnings() {
        let result = ValidationResult::from_violations(vec![
            Violation::error(ConstraintKind::BlackoutWindows, "inside freeze"),
            Violation::warning(ConstraintKind::SlaMinutes, "late"),
        ]);
        let table = violation_table(&result);
        assert!(table.contains("blackoutWindows"));
        assert!(table.contains("warning"));
        assert!(table.contains("late"));
    }

    #[test]
    fn empty_violations_say_so() {
        let result = ValidationResult::from_violations(Vec::new());
        assert_eq!(violation_table(&result), "No violations");
    }

    #[test]
    fn plan_table_lists_dependencies() {
        let plan = plan_with_layers(payments_candidates(), &[&["rollback"], &["scale"]]);
        let table = plan_table(&plan);
        assert!(table.contains("Plan plan-fixture"));
        assert!(table.contains("Depends On"));
        assert!(table.contains("rollback"));
    }
}
