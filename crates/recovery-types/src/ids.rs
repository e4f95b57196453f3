//! Opaque identifiers
//!
//! Every id kind is its own string newtype so a `SignalId` can never be passed
//! where an `ActionId` is expected. Ids carry no behaviour beyond equality,
//! ordering and display.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier
            #[inline]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a fresh, sortable identifier
            #[inline]
            #[must_use]
            pub fn generate() -> Self {
                Self(Ulid::new().to_string())
            }

            /// Borrow the raw identifier
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identifier of an observed signal
    SignalId
);
define_id!(
    /// Identifier of the tenant that owns signals, policies and plans
    TenantId
);
define_id!(
    /// Identifier of a remediation action candidate
    ActionId
);
define_id!(
    /// Identifier of a synthesized recovery plan
    PlanId
);
define_id!(
    /// Identifier of the scenario a plan was synthesized for
    ScenarioId
);
define_id!(
    /// Identifier of a recovery window
    WindowId
);
define_id!(
    /// Identifier of an approver
    ApproverId
);
