//! Dispatch envelope for an external executor
//!
//! Layers run strictly in sequence; actions inside a layer run concurrently,
//! split into waves of at most `concurrency_limit`.

use recovery_types::{ActionId, PolicyConstraint, RecoveryActionPlan};
use serde::{Deserialize, Serialize};

/// Hard ceiling on concurrency derived from a wall-clock budget
pub const MAX_DERIVED_CONCURRENCY: usize = 8;

/// Minutes of wall clock budget per concurrent slot
const MINUTES_PER_SLOT: u32 = 5;

/// Execution limits derived from policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionEnvelope {
    /// Actions allowed in flight at once
    pub concurrency_limit: usize,
    /// Retries allowed after the first attempt
    pub max_retries_per_step: u32,
}

impl ExecutionEnvelope {
    /// Derive the envelope from a policy
    ///
    /// With parallelism and a wall-clock budget the limit is
    /// `min(8, floor(minutes / 5))`; with parallelism alone it is the policy cap;
    /// without parallelism it is 1. The limit is never below 1.
    #[must_use]
    pub fn from_policy(policy: &PolicyConstraint) -> Self {
        let concurrency_limit = match (policy.allow_parallelism, policy.max_wall_clock_minutes) {
            (true, Some(minutes)) => {
                usize::try_from(minutes / MINUTES_PER_SLOT)
                    .unwrap_or(usize::MAX)
                    .min(MAX_DERIVED_CONCURRENCY)
            }
            (true, None) => policy.max_concurrency,
            (false, _) => 1,
        };

        Self {
            concurrency_limit: concurrency_limit.max(1),
            max_retries_per_step: policy.max_retries_per_step,
        }
    }

    /// Never allow more than `max_concurrency` in flight
    #[inline]
    #[must_use]
    pub fn capped_at(mut self, max_concurrency: usize) -> Self {
        self.concurrency_limit = self.concurrency_limit.min(max_concurrency.max(1));
        self
    }

    /// Total attempts allowed per step
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries_per_step.saturating_add(1)
    }
}

/// A batch of actions from one layer started together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchWave {
    /// Layer the wave belongs to
    pub layer: usize,
    /// Actions started together
    pub actions: Vec<ActionId>,
}

/// Ordered waves covering every action of a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSchedule {
    /// Waves in start order
    pub waves: Vec<DispatchWave>,
}

impl DispatchSchedule {
    /// Split each layer of the plan into waves within the envelope
    #[must_use]
    pub fn build(plan: &RecoveryActionPlan, envelope: &ExecutionEnvelope) -> Self {
        Self::with_limit(plan, envelope.concurrency_limit)
    }

    /// Split each layer of the plan into waves of at most `limit` actions
    #[must_use]
    pub fn with_limit(plan: &RecoveryActionPlan, limit: usize) -> Self {
        let limit = limit.max(1);
        let waves = plan
            .topology
            .layers
            .iter()
            .enumerate()
            .flat_map(|(layer, actions)| {
                actions.chunks(limit).map(move |chunk| DispatchWave {
                    layer,
                    actions: chunk.to_vec(),
                })
            })
            .collect();
        Self { waves }
    }

    /// Number of waves
    #[inline]
    #[must_use]
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    /// Waves belonging to `layer`
    pub fn waves_in(&self, layer: usize) -> impl Iterator<Item = &DispatchWave> + '_ {
        self.waves.iter().filter(move |w| w.layer == layer)
    }
}

/// Whether a failed step may be attempted again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryDecision {
    /// Attempt again
    Retry,
    /// A dependency did not complete; retrying cannot help
    DependencyFailed,
    /// Retry budget spent
    BudgetExhausted,
}

impl RetryDecision {
    /// Decide after `attempts_made` attempts
    #[must_use]
    pub fn evaluate(
        attempts_made: u32,
        dependencies_completed: bool,
        envelope: &ExecutionEnvelope,
    ) -> Self {
        if !dependencies_completed {
            RetryDecision::DependencyFailed
        } else if attempts_made >= envelope.max_attempts() {
            RetryDecision::BudgetExhausted
        } else {
            RetryDecision::Retry
        }
    }

    /// Whether another attempt is allowed
    #[inline]
    #[must_use]
    pub fn should_retry(self) -> bool {
        self == RetryDecision::Retry
    }
}
