//! Engine configuration
//!
//! Loaded from TOML. Every field has a default, so a missing file or a partial
//! file is fine.

use recovery_constraints::ValidatorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong
        reason: String,
    },
}

/// Plan synthesis tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Confidence of an empty plan
    pub confidence_base: f64,
    /// Confidence lost per action
    pub confidence_decay: f64,
    /// Distinct signal sources named in the rationale
    pub rationale_source_limit: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            confidence_base: 0.99,
            confidence_decay: 0.03,
            rationale_source_limit: 3,
        }
    }
}

/// Simulation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Weight of the incomplete share in the risk score
    pub incomplete_weight: f64,
    /// Decimal places kept in the risk score
    pub risk_precision: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            incomplete_weight: 0.6,
            risk_precision: 3,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Synthesis settings
    pub synthesis: SynthesisConfig,
    /// Validation settings
    pub validation: ValidatorConfig,
    /// Simulation settings
    pub simulation: SimulationConfig,
}

impl EngineConfig {
    /// Load configuration from `path`, falling back to defaults when absent
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read, parsed or validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.synthesis.confidence_base) {
            return Err(invalid("synthesis.confidence_base", "must be within [0, 1]"));
        }
        if !unit.contains(&self.synthesis.confidence_decay) {
            return Err(invalid("synthesis.confidence_decay", "must be within [0, 1]"));
        }
        let ratio = self.validation.quorum_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(invalid("validation.quorum_ratio", "must be within (0, 1]"));
        }
        if !self.simulation.incomplete_weight.is_finite() || self.simulation.incomplete_weight < 0.0 {
            return Err(invalid("simulation.incomplete_weight", "must be non-negative"));
        }
        if self.simulation.risk_precision > 9 {
            return Err(invalid("simulation.risk_precision", "at most 9 decimal places"));
        }
        Ok(())
    }

    /// With synthesis settings
    #[inline]
    #[must_use]
    pub fn with_synthesis(mut self, synthesis: SynthesisConfig) -> Self {
        self.synthesis = synthesis;
        self
    }

    /// With validation settings
    #[inline]
    #[must_use]
    pub fn with_validation(mut self, validation: ValidatorConfig) -> Self {
        self.validation = validation;
        self
    }

    /// With simulation settings
    #[inline]
    #[must_use]
    pub fn with_simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = simulation;
        self
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(EngineConfig::load(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[synthesis]\nrationale_source_limit = 5\n\n[validation]\nquorum_ratio = 0.5").unwrap();

        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.synthesis.rationale_source_limit, 5);
        assert_eq!(config.synthesis.confidence_base, 0.99);
        assert_eq!(config.validation.quorum_ratio, 0.5);
        assert_eq!(config.simulation, SimulationConfig::default());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[validation]\nquorum_ratio = 0.0").unwrap();

        let err = EngineConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "validation.quorum_ratio",
                ..
            }
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[synthesis\nconfidence_base = ").unwrap();
        assert!(matches!(
            EngineConfig::load(Some(file.path())),
            Err(ConfigError::Parse { .. })
        ));
    }
}
