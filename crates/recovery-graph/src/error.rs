//! Graph construction errors

use recovery_types::ActionId;

/// Structural problems in a candidate set; these are fatal
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Two candidates share an id
    #[error("duplicate action id: {0}")]
    DuplicateAction(ActionId),

    /// A dependency names an action outside the candidate set
    #[error("action {action} depends on unknown action {missing}")]
    DanglingDependency {
        /// Dependent action
        action: ActionId,
        /// Unresolvable dependency
        missing: ActionId,
    },
}
