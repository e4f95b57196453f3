//! Operational policy and scheduling windows

use crate::action::ActionCategory;
use crate::ids::{TenantId, WindowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Time range during which no run may start (inclusive bounds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackoutWindow {
    /// Start of the blackout
    pub start_utc: DateTime<Utc>,
    /// End of the blackout
    pub end_utc: DateTime<Utc>,
    /// Why the blackout exists
    #[serde(default)]
    pub reason: Option<String>,
}

impl BlackoutWindow {
    /// Create a blackout window
    #[inline]
    #[must_use]
    pub fn new(start_utc: DateTime<Utc>, end_utc: DateTime<Utc>) -> Self {
        Self {
            start_utc,
            end_utc,
            reason: None,
        }
    }

    /// With reason
    #[inline]
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Whether `now` falls inside the blackout
    #[inline]
    #[must_use]
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start_utc <= now && now <= self.end_utc
    }
}

/// Approval quorum requirements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    /// Minimum number of distinct approvers
    #[serde(default)]
    pub minimum_approvals: usize,
}

/// Constraints attached to a tenant or scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConstraint {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Maximum actions in one execution layer
    pub max_concurrency: usize,
    /// Category whitelist
    pub allowed_categories: BTreeSet<ActionCategory>,
    /// Windows during which no run may start
    #[serde(default)]
    pub blackout_windows: Vec<BlackoutWindow>,
    /// Ceiling on estimated completion time
    pub sla_minutes: u32,
    /// Approval quorum
    #[serde(default)]
    pub approval: ApprovalPolicy,
    /// Safety margin that must remain inside the RTO budget
    #[serde(default)]
    pub sla_buffer_minutes: u32,
    /// Recovery time objective; the window length is used when absent
    #[serde(default)]
    pub target_rto_minutes: Option<u32>,
    /// Retry budget per step for an executor
    #[serde(default)]
    pub max_retries_per_step: u32,
    /// Whether actions of one layer may run concurrently
    #[serde(default = "default_true")]
    pub allow_parallelism: bool,
    /// Wall-clock budget used to derive the executor concurrency limit
    #[serde(default)]
    pub max_wall_clock_minutes: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl PolicyConstraint {
    /// Create a policy with no blackouts, approvals or RTO target
    #[must_use]
    pub fn new(
        tenant_id: impl Into<TenantId>,
        max_concurrency: usize,
        allowed_categories: impl IntoIterator<Item = ActionCategory>,
        sla_minutes: u32,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            max_concurrency,
            allowed_categories: allowed_categories.into_iter().collect(),
            blackout_windows: Vec::new(),
            sla_minutes,
            approval: ApprovalPolicy::default(),
            sla_buffer_minutes: 0,
            target_rto_minutes: None,
            max_retries_per_step: 0,
            allow_parallelism: true,
            max_wall_clock_minutes: None,
        }
    }

    /// With blackout window
    #[inline]
    #[must_use]
    pub fn with_blackout(mut self, window: BlackoutWindow) -> Self {
        self.blackout_windows.push(window);
        self
    }

    /// With minimum approvals
    #[inline]
    #[must_use]
    pub fn with_minimum_approvals(mut self, minimum: usize) -> Self {
        self.approval.minimum_approvals = minimum;
        self
    }

    /// With RTO target and buffer
    #[inline]
    #[must_use]
    pub fn with_rto(mut self, target_minutes: u32, buffer_minutes: u32) -> Self {
        self.target_rto_minutes = Some(target_minutes);
        self.sla_buffer_minutes = buffer_minutes;
        self
    }

    /// With retry budget
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries_per_step = retries;
        self
    }

    /// With parallelism settings
    #[inline]
    #[must_use]
    pub fn with_parallelism(mut self, allowed: bool, max_wall_clock_minutes: Option<u32>) -> Self {
        self.allow_parallelism = allowed;
        self.max_wall_clock_minutes = max_wall_clock_minutes;
        self
    }

    /// Whether the category is whitelisted
    #[inline]
    #[must_use]
    pub fn allows(&self, category: ActionCategory) -> bool {
        self.allowed_categories.contains(&category)
    }
}

/// Scheduling envelope attached to a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryWindow {
    /// Window identifier
    pub window_id: WindowId,
    /// Window start
    pub start_utc: DateTime<Utc>,
    /// Window end
    pub end_utc: DateTime<Utc>,
    /// Region the window applies to
    pub region: String,
    /// Team owning the window
    pub owner_team: String,
}

impl RecoveryWindow {
    /// Create a window
    #[must_use]
    pub fn new(
        window_id: impl Into<WindowId>,
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
        region: impl Into<String>,
        owner_team: impl Into<String>,
    ) -> Self {
        Self {
            window_id: window_id.into(),
            start_utc,
            end_utc,
            region: region.into(),
            owner_team: owner_team.into(),
        }
    }

    /// Length of the window in whole minutes; inverted windows yield 0
    #[inline]
    #[must_use]
    pub fn duration_minutes(&self) -> i64 {
        (self.end_utc - self.start_utc).num_minutes().max(0)
    }

    /// Whether two windows share any instant
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &RecoveryWindow) -> bool {
        self.start_utc <= other.end_utc && other.start_utc <= self.end_utc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn blackout_bounds_are_inclusive() {
        let blackout = BlackoutWindow::new(at(1), at(2));
        assert!(blackout.contains(at(1)));
        assert!(blackout.contains(at(2)));
        assert!(!blackout.contains(at(2) + Duration::seconds(1)));
    }

    #[test]
    fn window_overlap_and_duration() {
        let a = RecoveryWindow::new("a", at(1), at(3), "eu-west-1", "sre");
        let b = RecoveryWindow::new("b", at(2), at(4), "eu-west-1", "sre");
        let c = RecoveryWindow::new("c", at(5), at(6), "eu-west-1", "sre");

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert_eq!(a.duration_minutes(), 120);
    }

    #[test]
    fn policy_defaults_from_json() {
        let json = r#"{
            "tenant_id": "acme",
            "max_concurrency": 2,
            "allowed_categories": ["rollback", "scale"],
            "sla_minutes": 30
        }"#;
        let policy: PolicyConstraint = serde_json::from_str(json).unwrap();
        assert!(policy.allow_parallelism);
        assert!(policy.allows(ActionCategory::Scale));
        assert!(!policy.allows(ActionCategory::Patch));
        assert_eq!(policy.approval.minimum_approvals, 0);
    }
}
