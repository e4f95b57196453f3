//! Observed anomaly signals
//!
//! Signals are produced by an external detector and consumed read-only.

use crate::ids::{SignalId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Signal severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational degradation
    Low,
    /// Noticeable degradation
    Medium,
    /// User-facing impact
    High,
    /// Outage
    Critical,
}

impl Severity {
    /// Weight used when ranking severities
    #[inline]
    #[must_use]
    pub fn weight(self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 5,
        }
    }

    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.weight().cmp(&other.weight())
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a signal came from and what it reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Emitting detector or system
    pub source: String,
    /// Detector-specific code
    pub code: String,
    /// Free-form attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Fingerprint {
    /// Create a fingerprint without attributes
    #[inline]
    #[must_use]
    pub fn new(source: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            code: code.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// With attribute
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// One observed anomaly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Signal identifier
    pub signal_id: SignalId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Affected service or resource
    pub entity: String,
    /// Observation time
    pub timestamp_utc: DateTime<Utc>,
    /// Severity
    pub severity: Severity,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
    /// Source fingerprint
    pub fingerprint: Fingerprint,
}

impl Signal {
    /// Create a new signal; confidence is clamped into [0, 1]
    #[must_use]
    pub fn new(
        signal_id: SignalId,
        tenant_id: TenantId,
        entity: impl Into<String>,
        timestamp_utc: DateTime<Utc>,
        severity: Severity,
        confidence: f64,
        fingerprint: Fingerprint,
    ) -> Self {
        Self {
            signal_id,
            tenant_id,
            entity: entity.into(),
            timestamp_utc,
            severity,
            confidence: clamp_unit(confidence),
            fingerprint,
        }
    }

    /// Confidence clamped into [0, 1], guarding deserialized input
    #[inline]
    #[must_use]
    pub fn bounded_confidence(&self) -> f64 {
        clamp_unit(self.confidence)
    }
}

/// Clamp a ratio into [0, 1], mapping NaN to 0
#[inline]
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
