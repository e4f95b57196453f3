//! Plan window lifecycle
//!
//! Transitions move forward only. The single backward edge is a rejection
//! back to `Draft` from `Simulating` or `Approved` when validation fails.

use crate::error::LifecycleError;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a plan window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    /// Synthesized, not yet approved
    Draft,
    /// Under simulation
    Simulating,
    /// Passed validation
    Approved,
    /// Handed to an executor
    Executing,
    /// Every step finished
    Completed,
    /// Stopped by an operator
    Canceled,
}

impl WindowState {
    /// States reachable in one step from `self`
    #[must_use]
    pub fn allowed_transitions(self) -> &'static [WindowState] {
        use WindowState::{Approved, Canceled, Completed, Draft, Executing, Simulating};
        match self {
            Draft => &[Simulating, Approved, Canceled],
            Simulating => &[Approved, Executing, Draft, Canceled],
            Approved => &[Executing, Draft, Canceled],
            Executing => &[Completed, Canceled],
            Completed | Canceled => &[],
        }
    }

    /// Whether no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, WindowState::Completed | WindowState::Canceled)
    }

    /// Validate and perform a transition
    ///
    /// # Errors
    /// Returns [`LifecycleError::IllegalTransition`] when `to` is not reachable
    /// from the current state.
    pub fn transition(self, to: WindowState) -> Result<WindowState, LifecycleError> {
        if self.allowed_transitions().contains(&to) {
            Ok(to)
        } else {
            Err(LifecycleError::IllegalTransition { from: self, to })
        }
    }

    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WindowState::Draft => "draft",
            WindowState::Simulating => "simulating",
            WindowState::Approved => "approved",
            WindowState::Executing => "executing",
            WindowState::Completed => "completed",
            WindowState::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for WindowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_path_is_legal() {
        let state = WindowState::Draft
            .transition(WindowState::Simulating)
            .and_then(|s| s.transition(WindowState::Approved))
            .and_then(|s| s.transition(WindowState::Executing))
            .and_then(|s| s.transition(WindowState::Completed))
            .unwrap();
        assert_eq!(state, WindowState::Completed);
        assert!(state.is_terminal());
    }

    #[test]
    fn rejection_back_to_draft_is_the_only_backward_edge() {
        assert!(WindowState::Approved.transition(WindowState::Draft).is_ok());
        assert!(WindowState::Simulating.transition(WindowState::Draft).is_ok());
        assert!(WindowState::Executing.transition(WindowState::Draft).is_err());
        assert!(WindowState::Executing.transition(WindowState::Approved).is_err());
        assert!(WindowState::Completed.transition(WindowState::Canceled).is_err());
    }
}
