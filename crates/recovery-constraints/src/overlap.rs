//! Pairwise window overlap detection

use crate::violation::{ConstraintKind, Violation};
use recovery_types::RecoveryWindow;
use std::collections::HashSet;

/// Report every pair of distinct windows whose ranges intersect
///
/// Pairs sharing a window id are the same window and are skipped. Results are
/// deduplicated by `(constraint, detail)` and keep first-seen order.
#[must_use]
pub fn overlapping_windows(windows: &[RecoveryWindow]) -> Vec<Violation> {
    let mut seen = HashSet::new();
    let mut violations = Vec::new();

    for (i, a) in windows.iter().enumerate() {
        for b in &windows[i + 1..] {
            if a.window_id == b.window_id || !a.overlaps(b) {
                continue;
            }
            let violation = Violation::warning(
                ConstraintKind::WindowOverlap,
                format!(
                    "window {} ({} .. {}) overlaps window {} ({} .. {})",
                    a.window_id,
                    a.start_utc.to_rfc3339(),
                    a.end_utc.to_rfc3339(),
                    b.window_id,
                    b.start_utc.to_rfc3339(),
                    b.end_utc.to_rfc3339()
                ),
            );
            if seen.insert((violation.constraint, violation.detail.clone())) {
                violations.push(violation);
            }
        }
    }

    violations
}
