//! Scenario file loading

use anyhow::{Context, Result};
use recovery_engine::Scenario;
use std::path::Path;

/// Load a scenario from JSON, or YAML when the extension says so
pub(crate) fn load(path: &Path) -> Result<Scenario> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "yaml" | "yml"));

    let scenario = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML scenario {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON scenario {}", path.display()))?
    };
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const YAML: &str = r"
scenario_id: payments-outage
signals:
  - signal_id: sig-1
    tenant_id: acme
    entity: payments
    timestamp_utc: 2026-03-01T12:00:00Z
    severity: critical
    confidence: 0.9
    fingerprint: { source: apm, code: 5xx }
candidates:
  - { action_id: rollback, service: payments, category: rollback, estimated_minutes: 10 }
  - action_id: scale
    service: payments
    category: scale
    estimated_minutes: 15
    dependency: { depends_on: [rollback] }
policy:
  tenant_id: acme
  max_concurrency: 2
  allowed_categories: [rollback, scale]
  sla_minutes: 30
window:
  window_id: window-1
  start_utc: 2026-03-01T12:00:00Z
  end_utc: 2026-03-01T14:00:00Z
  region: eu-west-1
  owner_team: sre
";

    #[test]
    fn loads_yaml_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let scenario = load(file.path()).unwrap();
        assert_eq!(scenario.candidates.len(), 2);
        assert_eq!(scenario.signals[0].fingerprint.code, "5xx");
        assert!(scenario.context.is_none());
    }

    #[test]
    fn json_errors_name_the_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"{ not json").unwrap();

        let err = load(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("invalid JSON scenario"));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("absent.json")).is_err());
    }
}
