//! Layering properties over random dependency graphs

use proptest::prelude::*;
use recovery_graph::{layer, DependencyGraph};
use recovery_test_utils::candidate;
use recovery_types::{ActionCandidate, ActionCategory, ActionId};
use std::collections::HashMap;

/// Random DAG: every edge points from a lower to a higher index
fn acyclic_candidates() -> impl Strategy<Value = Vec<ActionCandidate>> {
    (1..24usize).prop_flat_map(|n| {
        (
            proptest::collection::vec(1..60u32, n),
            proptest::collection::vec((0..n, 0..n), 0..(n * 2)),
        )
            .prop_map(move |(durations, edges)| {
                let mut candidates: Vec<ActionCandidate> = durations
                    .iter()
                    .enumerate()
                    .map(|(i, &minutes)| {
                        candidate(&format!("a{i}"), ActionCategory::Patch, minutes, &[])
                    })
                    .collect();
                for (x, y) in edges {
                    let (from, to) = (x.min(y), x.max(y));
                    if from != to {
                        let dep = ActionId::new(format!("a{from}"));
                        if !candidates[to].dependency.depends_on.contains(&dep) {
                            candidates[to].dependency.depends_on.push(dep);
                        }
                    }
                }
                candidates
            })
    })
}

proptest! {
    #[test]
    fn prop_dependencies_resolve_in_earlier_layers(candidates in acyclic_candidates()) {
        let layering = layer(&candidates).unwrap();
        prop_assert!(!layering.has_cycle);

        let position: HashMap<&ActionId, usize> = layering
            .layers
            .iter()
            .enumerate()
            .flat_map(|(k, l)| l.iter().map(move |id| (id, k)))
            .collect();

        for c in &candidates {
            let k = position[&c.action_id];
            for dep in &c.dependency.depends_on {
                prop_assert!(position[dep] < k);
            }
        }
    }

    #[test]
    fn prop_every_candidate_layered_exactly_once(candidates in acyclic_candidates()) {
        let layering = layer(&candidates).unwrap();
        let total: usize = layering.layers.iter().map(Vec::len).sum();
        prop_assert_eq!(total, candidates.len());
    }

    #[test]
    fn prop_critical_path_bounded_by_sequential_sum(candidates in acyclic_candidates()) {
        let layering = layer(&candidates).unwrap();
        let sequential: u32 = candidates.iter().map(|c| c.estimated_minutes).sum();
        let slowest = candidates.iter().map(|c| c.estimated_minutes).max().unwrap_or(0);
        prop_assert!(layering.critical_path_minutes <= sequential);
        prop_assert!(layering.critical_path_minutes >= slowest);

        let chain = DependencyGraph::build(&candidates).unwrap().critical_chain().unwrap();
        prop_assert!(chain.total_minutes <= layering.critical_path_minutes);
    }
}

#[test]
fn cycle_a_b_c_reports_all_three_once() {
    let candidates = vec![
        candidate("A", ActionCategory::Rollback, 1, &["C"]),
        candidate("B", ActionCategory::Scale, 1, &["A"]),
        candidate("C", ActionCategory::Patch, 1, &["B"]),
    ];

    let layering = layer(&candidates).unwrap();
    assert!(layering.has_cycle);
    assert!(!layering.layers.is_empty());

    let mut seen: Vec<&str> = layering.layers.iter().flatten().map(ActionId::as_str).collect();
    seen.sort_unstable();
    assert_eq!(seen, vec!["A", "B", "C"]);
}

#[test]
fn empty_candidate_set_has_no_layers() {
    let layering = layer(&[]).unwrap();
    assert!(layering.layers.is_empty());
    assert!(!layering.has_cycle);
    assert_eq!(layering.critical_path_minutes, 0);
}
