//! Remediation action candidates

use crate::ids::{ActionId, SignalId};
use serde::{Deserialize, Serialize};

/// Category of remediation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    /// Revert to a previous release or config
    Rollback,
    /// Move traffic or workloads away
    Evacuate,
    /// Change capacity
    Scale,
    /// Apply a fix forward
    Patch,
    /// Verify health after remediation
    Validate,
}

impl ActionCategory {
    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActionCategory::Rollback => "rollback",
            ActionCategory::Evacuate => "evacuate",
            ActionCategory::Scale => "scale",
            ActionCategory::Patch => "patch",
            ActionCategory::Validate => "validate",
        }
    }
}

impl std::fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering and triggering requirements of an action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDependency {
    /// Actions that must complete first
    #[serde(default)]
    pub depends_on: Vec<ActionId>,
    /// Signal that must be present for this action to be triggered
    #[serde(default)]
    pub required_signal_id: Option<SignalId>,
}

/// One possible remediation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCandidate {
    /// Action identifier
    pub action_id: ActionId,
    /// Target service
    pub service: String,
    /// Remediation category
    pub category: ActionCategory,
    /// Expected execution time
    pub estimated_minutes: u32,
    /// Time needed to undo the action
    #[serde(default)]
    pub rollback_minutes: u32,
    /// Known side effects
    #[serde(default)]
    pub side_effects: Vec<String>,
    /// Free-form labels
    #[serde(default)]
    pub labels: Vec<String>,
    /// Dependencies
    #[serde(default)]
    pub dependency: ActionDependency,
}

impl ActionCandidate {
    /// Create a candidate with no dependencies
    #[inline]
    #[must_use]
    pub fn new(
        action_id: impl Into<ActionId>,
        service: impl Into<String>,
        category: ActionCategory,
        estimated_minutes: u32,
    ) -> Self {
        Self {
            action_id: action_id.into(),
            service: service.into(),
            category,
            estimated_minutes,
            rollback_minutes: 0,
            side_effects: Vec::new(),
            labels: Vec::new(),
            dependency: ActionDependency::default(),
        }
    }

    /// With dependency on another action
    #[inline]
    #[must_use]
    pub fn depends_on(mut self, action_id: impl Into<ActionId>) -> Self {
        self.dependency.depends_on.push(action_id.into());
        self
    }

    /// Only trigger when the given signal is present
    #[inline]
    #[must_use]
    pub fn requires_signal(mut self, signal_id: impl Into<SignalId>) -> Self {
        self.dependency.required_signal_id = Some(signal_id.into());
        self
    }

    /// With rollback time
    #[inline]
    #[must_use]
    pub fn with_rollback_minutes(mut self, minutes: u32) -> Self {
        self.rollback_minutes = minutes;
        self
    }

    /// With side effect
    #[inline]
    #[must_use]
    pub fn with_side_effect(mut self, effect: impl Into<String>) -> Self {
        self.side_effects.push(effect.into());
        self
    }

    /// With label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }
}
