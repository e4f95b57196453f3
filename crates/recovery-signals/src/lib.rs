//! Recovery Signals
//!
//! Aggregates raw failure signals before plan synthesis:
//! - [`summarize`]: counts, unique entities, mean confidence, peak severity and
//!   density maps by entity, fingerprint source and severity
//! - [`build_clusters`]: groups by `(entity, fingerprint.code)`, largest first
//!
//! Both functions are pure and deterministic.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod cluster;
mod summary;

pub use cluster::{build_clusters, Cluster};
pub use summary::{peak_severity, summarize, SignalDensity, SignalSummary};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
