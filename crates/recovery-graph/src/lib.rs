//! Recovery Graph
//!
//! Dependency layering over action candidates:
//! - [`DependencyGraph::build`] rejects duplicate ids and dangling references
//! - [`DependencyGraph::layer`] peels the graph into parallel layers, flags
//!   cycles and estimates the critical path
//! - [`DependencyGraph::critical_chain`] finds the longest chain of durations
//!
//! A detected cycle is data, not an error: callers check
//! [`Layering::has_cycle`] before trusting ordering or duration estimates.
//!
//! # Example
//!
//! ```rust,ignore
//! let layering = recovery_graph::layer(&candidates)?;
//! if layering.is_reliable() {
//!     println!("{} layers, {} minutes", layering.depth(), layering.critical_path_minutes);
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod graph;

pub use error::GraphError;
pub use graph::{layer, CriticalChain, DependencyGraph, Layering};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
