//! Violations and validation results

use recovery_types::WindowState;
use serde::{Deserialize, Serialize};

/// Which constraint a violation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Widest layer exceeds the concurrency cap
    #[serde(rename = "maxConcurrency")]
    MaxConcurrency,
    /// Category outside the whitelist
    #[serde(rename = "allowedCategories")]
    AllowedCategories,
    /// Estimate exceeds the SLA
    #[serde(rename = "slaMinutes")]
    SlaMinutes,
    /// Validation time inside a blackout
    #[serde(rename = "blackoutWindows")]
    BlackoutWindows,
    /// Approval quorum not met
    #[serde(rename = "missingApprovals")]
    MissingApprovals,
    /// RTO safety buffer does not hold
    #[serde(rename = "invalid-rto")]
    InvalidRto,
    /// Two scheduled windows intersect
    #[serde(rename = "windowOverlap")]
    WindowOverlap,
    /// Plan topology contains a cycle
    #[serde(rename = "dependencyCycle")]
    DependencyCycle,
}

impl ConstraintKind {
    /// Stable code used in reports
    #[inline]
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            ConstraintKind::MaxConcurrency => "maxConcurrency",
            ConstraintKind::AllowedCategories => "allowedCategories",
            ConstraintKind::SlaMinutes => "slaMinutes",
            ConstraintKind::BlackoutWindows => "blackoutWindows",
            ConstraintKind::MissingApprovals => "missingApprovals",
            ConstraintKind::InvalidRto => "invalid-rto",
            ConstraintKind::WindowOverlap => "windowOverlap",
            ConstraintKind::DependencyCycle => "dependencyCycle",
        }
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Violation severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationSeverity {
    /// Reported, does not block approval
    Warning,
    /// Blocks approval
    Error,
}

impl std::fmt::Display for ViolationSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ViolationSeverity::Warning => "warning",
            ViolationSeverity::Error => "error",
        })
    }
}

/// One failed constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    /// Constraint violated
    pub constraint: ConstraintKind,
    /// Human-readable explanation
    pub detail: String,
    /// Severity
    pub severity: ViolationSeverity,
}

impl Violation {
    /// Create an error-severity violation
    #[inline]
    #[must_use]
    pub fn error(constraint: ConstraintKind, detail: impl Into<String>) -> Self {
        Self {
            constraint,
            detail: detail.into(),
            severity: ViolationSeverity::Error,
        }
    }

    /// Create a warning-severity violation
    #[inline]
    #[must_use]
    pub fn warning(constraint: ConstraintKind, detail: impl Into<String>) -> Self {
        Self {
            constraint,
            detail: detail.into(),
            severity: ViolationSeverity::Warning,
        }
    }

    /// Whether this violation blocks approval
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == ViolationSeverity::Error
    }
}

/// Outcome of validating a plan against a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff no violation is an error
    pub allowed: bool,
    /// All violations, in check order
    pub violations: Vec<Violation>,
    /// `Approved` when allowed, otherwise `Draft`
    pub window_state: WindowState,
}

impl ValidationResult {
    /// Derive `allowed` and `window_state` from the violations
    #[must_use]
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        let allowed = !violations.iter().any(Violation::is_error);
        Self {
            allowed,
            violations,
            window_state: if allowed {
                WindowState::Approved
            } else {
                WindowState::Draft
            },
        }
    }

    /// Error-severity violations
    pub fn errors(&self) -> impl Iterator<Item = &Violation> + '_ {
        self.violations.iter().filter(|v| v.is_error())
    }

    /// Warning-severity violations
    pub fn warnings(&self) -> impl Iterator<Item = &Violation> + '_ {
        self.violations.iter().filter(|v| !v.is_error())
    }

    /// Whether any violation refers to `constraint`
    #[must_use]
    pub fn has(&self, constraint: ConstraintKind) -> bool {
        self.violations.iter().any(|v| v.constraint == constraint)
    }
}
