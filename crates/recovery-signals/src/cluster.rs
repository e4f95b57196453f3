//! Signal clustering by entity and fingerprint code

use crate::summary::peak_severity;
use indexmap::IndexMap;
use recovery_types::{Severity, Signal, SignalId};
use serde::{Deserialize, Serialize};

/// Signals sharing an `(entity, fingerprint.code)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Affected entity
    pub entity: String,
    /// Fingerprint code
    pub code: String,
    /// Highest severity among members
    pub dominant_severity: Severity,
    /// Mean member confidence
    pub average_confidence: f64,
    /// Member signal ids in input order
    pub members: Vec<SignalId>,
}

impl Cluster {
    /// Number of member signals
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the cluster has no members
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Group signals into clusters, largest first
///
/// Clusters of equal size keep the order in which their first member was seen.
#[must_use]
pub fn build_clusters(signals: &[Signal]) -> Vec<Cluster> {
    let mut groups: IndexMap<(&str, &str), Vec<&Signal>> = IndexMap::new();
    for signal in signals {
        groups
            .entry((signal.entity.as_str(), signal.fingerprint.code.as_str()))
            .or_default()
            .push(signal);
    }

    let mut clusters: Vec<Cluster> = groups
        .into_iter()
        .filter_map(|((entity, code), members)| {
            let dominant_severity = peak_severity(members.iter().copied())?;
            #[allow(clippy::cast_precision_loss)]
            let average_confidence = members.iter().map(|s| s.bounded_confidence()).sum::<f64>()
                / members.len() as f64;
            Some(Cluster {
                entity: entity.to_string(),
                code: code.to_string(),
                dominant_severity,
                average_confidence,
                members: members.iter().map(|s| s.signal_id.clone()).collect(),
            })
        })
        .collect();

    // stable: ties keep first-seen order
    clusters.sort_by(|a, b| b.len().cmp(&a.len()));
    clusters
}
