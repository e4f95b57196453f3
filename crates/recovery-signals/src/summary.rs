//! Signal summaries

use recovery_types::{Severity, Signal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Count maps partitioning a signal set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDensity {
    /// Signals per entity
    pub by_entity: BTreeMap<String, usize>,
    /// Signals per fingerprint source
    pub by_source: BTreeMap<String, usize>,
    /// Signals per severity
    pub by_severity: BTreeMap<Severity, usize>,
}

/// Aggregate view over a set of signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    /// Number of signals
    pub count: usize,
    /// Number of distinct entities
    pub unique_entities: usize,
    /// Mean confidence, 0 for an empty set
    pub average_confidence: f64,
    /// Highest-weight severity, first occurrence wins ties
    pub peak_severity: Option<Severity>,
    /// Count partitions
    pub density: SignalDensity,
}

impl SignalSummary {
    /// Summary of no signals
    #[must_use]
    pub fn empty() -> Self {
        Self {
            count: 0,
            unique_entities: 0,
            average_confidence: 0.0,
            peak_severity: None,
            density: SignalDensity::default(),
        }
    }
}

/// Summarize a set of signals
#[must_use]
pub fn summarize(signals: &[Signal]) -> SignalSummary {
    if signals.is_empty() {
        return SignalSummary::empty();
    }

    let mut density = SignalDensity::default();
    let mut entities = BTreeSet::new();
    let mut confidence_total = 0.0;

    for signal in signals {
        entities.insert(signal.entity.as_str());
        confidence_total += signal.bounded_confidence();
        *density.by_entity.entry(signal.entity.clone()).or_default() += 1;
        *density
            .by_source
            .entry(signal.fingerprint.source.clone())
            .or_default() += 1;
        *density.by_severity.entry(signal.severity).or_default() += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let average_confidence = (confidence_total / signals.len() as f64).clamp(0.0, 1.0);

    SignalSummary {
        count: signals.len(),
        unique_entities: entities.len(),
        average_confidence,
        peak_severity: peak_severity(signals),
        density,
    }
}

/// Severity with the highest weight; ties keep the first seen
#[must_use]
pub fn peak_severity<'a>(signals: impl IntoIterator<Item = &'a Signal>) -> Option<Severity> {
    signals.into_iter().fold(None, |peak, signal| match peak {
        Some(current) if current.weight() >= signal.severity.weight() => Some(current),
        _ => Some(signal.severity),
    })
}
