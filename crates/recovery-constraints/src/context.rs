//! Caller-supplied validation context
//!
//! The clock and the approval source are inputs, never read from ambient state.

use chrono::{DateTime, Utc};
use recovery_types::{ApproverId, RecoveryWindow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Facts about the outside world needed to validate a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationContext {
    /// Validation time, checked against blackouts
    pub now_utc: DateTime<Utc>,
    /// Currently active approvers
    #[serde(default)]
    pub active_approvals: Vec<ApproverId>,
    /// Playbooks linked to the scenario, drives the approval quorum
    #[serde(default)]
    pub playbook_count: usize,
    /// Completion time observed in simulation, if one ran
    #[serde(default)]
    pub simulated_completion_minutes: Option<u32>,
    /// Other windows already scheduled
    #[serde(default)]
    pub scheduled_windows: Vec<RecoveryWindow>,
}

impl ValidationContext {
    /// Context at `now_utc` with no approvals
    #[inline]
    #[must_use]
    pub fn new(now_utc: DateTime<Utc>) -> Self {
        Self {
            now_utc,
            active_approvals: Vec::new(),
            playbook_count: 0,
            simulated_completion_minutes: None,
            scheduled_windows: Vec::new(),
        }
    }

    /// With approver
    #[inline]
    #[must_use]
    pub fn with_approval(mut self, approver: impl Into<ApproverId>) -> Self {
        self.active_approvals.push(approver.into());
        self
    }

    /// With linked playbook count
    #[inline]
    #[must_use]
    pub fn with_playbooks(mut self, count: usize) -> Self {
        self.playbook_count = count;
        self
    }

    /// With simulated completion time
    #[inline]
    #[must_use]
    pub fn with_simulated_completion(mut self, minutes: u32) -> Self {
        self.simulated_completion_minutes = Some(minutes);
        self
    }

    /// With an already scheduled window
    #[inline]
    #[must_use]
    pub fn with_scheduled_window(mut self, window: RecoveryWindow) -> Self {
        self.scheduled_windows.push(window);
        self
    }

    /// Number of distinct active approvers
    #[must_use]
    pub fn distinct_approvals(&self) -> usize {
        self.active_approvals.iter().collect::<BTreeSet<_>>().len()
    }
}
