//! Command implementations

use crate::output::{self, OutputFormat};
use crate::scenario;
use anyhow::Result;
use recovery_constraints::ValidationContext;
use recovery_engine::{Clock, RecoveryEngine, Scenario, SystemClock};
use std::path::Path;
use std::process::ExitCode;
use tracing::info;

/// Exit code used when validation disallows the plan
pub(crate) const DISALLOWED: u8 = 2;

fn context_for(scenario: &Scenario) -> ValidationContext {
    scenario
        .context
        .clone()
        .unwrap_or_else(|| ValidationContext::new(SystemClock.now()))
}

fn emit(text: String) {
    println!("{text}");
}

/// Signal summary and clusters
pub(crate) fn summarize(
    engine: &RecoveryEngine,
    path: &Path,
    format: OutputFormat,
) -> Result<ExitCode> {
    let scenario = scenario::load(path)?;
    let summary = engine.aggregate_signals(&scenario.signals);
    let clusters = engine.cluster_signals(&scenario.signals);

    if format == OutputFormat::Table {
        let peak = summary.peak_severity.map_or("none", |s| s.as_str());
        emit(format!(
            "{} signal(s) across {} entit(ies), peak {peak}, average confidence {:.2}",
            summary.count, summary.unique_entities, summary.average_confidence
        ));
        for cluster in &clusters {
            emit(format!(
                "  {}/{}: {} signal(s), {}",
                cluster.entity,
                cluster.code,
                cluster.len(),
                cluster.dominant_severity
            ));
        }
    } else {
        emit(output::render_data(
            &serde_json::json!({ "summary": summary, "clusters": clusters }),
            format,
        )?);
    }
    Ok(ExitCode::SUCCESS)
}

/// Synthesized plan
pub(crate) fn plan(engine: &RecoveryEngine, path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let scenario = scenario::load(path)?;
    let plan = engine.synthesize_plan(
        &scenario.scenario_id,
        &scenario.signals,
        &scenario.candidates,
        &scenario.policy,
        &scenario.window,
    )?;

    if format == OutputFormat::Table {
        emit(output::plan_table(&plan));
    } else {
        emit(output::render_data(&plan, format)?);
    }
    Ok(ExitCode::SUCCESS)
}

/// Synthesize then validate
pub(crate) fn validate(
    engine: &RecoveryEngine,
    path: &Path,
    format: OutputFormat,
) -> Result<ExitCode> {
    let scenario = scenario::load(path)?;
    let plan = engine.synthesize_plan(
        &scenario.scenario_id,
        &scenario.signals,
        &scenario.candidates,
        &scenario.policy,
        &scenario.window,
    )?;
    let result = engine.validate_plan(&plan, &scenario.policy, &context_for(&scenario))?;

    if format == OutputFormat::Table {
        emit(output::violation_table(&result));
        emit(format!(
            "{} ({})",
            if result.allowed { "allowed" } else { "disallowed" },
            result.window_state
        ));
    } else {
        emit(output::render_data(&result, format)?);
    }
    Ok(exit_code(result.allowed))
}

/// Synthesize then simulate with the scenario's faults
pub(crate) fn simulate(
    engine: &RecoveryEngine,
    path: &Path,
    format: OutputFormat,
) -> Result<ExitCode> {
    let scenario = scenario::load(path)?;
    let plan = engine.synthesize_plan(
        &scenario.scenario_id,
        &scenario.signals,
        &scenario.candidates,
        &scenario.policy,
        &scenario.window,
    )?;
    let result = engine.simulate_plan_with(&plan, &scenario.policy, &scenario.simulation)?;

    if format == OutputFormat::Table {
        emit(output::simulation_table(&result));
    } else {
        emit(output::render_data(&result, format)?);
    }
    Ok(ExitCode::SUCCESS)
}

/// Full assessment
pub(crate) fn run(engine: &RecoveryEngine, path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let mut scenario = scenario::load(path)?;
    if scenario.context.is_none() {
        scenario.context = Some(context_for(&scenario));
    }
    let assessment = engine.assess(&scenario)?;
    info!(state = %assessment.window_state(), "assessment finished");

    if format == OutputFormat::Table {
        emit(output::assessment_table(&assessment));
    } else {
        emit(output::render_data(&assessment, format)?);
    }
    Ok(exit_code(assessment.validation.allowed))
}

fn exit_code(allowed: bool) -> ExitCode {
    if allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(DISALLOWED)
    }
}
