//! Error types shared across the recovery planner

use crate::ids::ActionId;
use crate::lifecycle::WindowState;

/// Illegal window lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// Transition not permitted from the current state
    #[error("illegal window transition: {from} -> {to}")]
    IllegalTransition {
        /// Current state
        from: WindowState,
        /// Requested state
        to: WindowState,
    },
}

/// Structural problems with a plan; these are fatal
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanShapeError {
    /// Plan has no actions
    #[error("plan sequence is empty")]
    EmptySequence,

    /// The same action appears twice
    #[error("duplicate action in sequence: {0}")]
    DuplicateAction(ActionId),

    /// An action depends on something outside the plan
    #[error("action {action} depends on unknown action {missing}")]
    DanglingDependency {
        /// Dependent action
        action: ActionId,
        /// Unresolvable dependency
        missing: ActionId,
    },

    /// Topology layers do not cover the sequence exactly once
    #[error("topology does not match sequence: {0}")]
    TopologyMismatch(String),

    /// An action is layered no later than one of its dependencies
    #[error("action {action} is not layered after its dependency {dependency}")]
    LayerOrder {
        /// Dependent action
        action: ActionId,
        /// Dependency in the same or a later layer
        dependency: ActionId,
    },

    /// Confidence outside [0, 1]
    #[error("aggregate confidence out of range: {0}")]
    ConfidenceOutOfRange(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_error_display() {
        let err = PlanShapeError::DanglingDependency {
            action: ActionId::new("scale"),
            missing: ActionId::new("ghost"),
        };
        assert_eq!(err.to_string(), "action scale depends on unknown action ghost");
    }

    #[test]
    fn lifecycle_error_display() {
        let err = LifecycleError::IllegalTransition {
            from: WindowState::Completed,
            to: WindowState::Draft,
        };
        assert!(err.to_string().contains("completed -> draft"));
    }
}
