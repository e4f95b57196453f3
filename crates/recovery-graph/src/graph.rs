//! Dependency graph over action candidates
//!
//! Layering uses iterative peeling: a candidate joins layer `k` once every
//! action it depends on was resolved in a layer `< k`. When a pass makes no
//! progress the unresolved remainder is emitted as one final layer and the
//! layering is flagged cyclic.

use crate::error::GraphError;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use recovery_types::{ActionCandidate, ActionId, PlanTopology};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of layering a candidate set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layering {
    /// Action ids per layer, input order within a layer
    pub layers: Vec<Vec<ActionId>>,
    /// Whether the last layer is an unordered cyclic remainder
    pub has_cycle: bool,
    /// Candidates with neither dependencies nor dependents
    pub isolated_count: usize,
    /// Sum of the slowest member per layer; sum of all durations when cyclic
    pub critical_path_minutes: u32,
}

impl Layering {
    /// Whether ordering and critical path can be trusted
    #[inline]
    #[must_use]
    pub fn is_reliable(&self) -> bool {
        !self.has_cycle
    }

    /// Number of layers
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Layer index of an action
    #[must_use]
    pub fn layer_of(&self, action_id: &ActionId) -> Option<usize> {
        self.layers
            .iter()
            .position(|layer| layer.contains(action_id))
    }

    /// Convert into the topology carried by a plan
    #[must_use]
    pub fn into_topology(self) -> PlanTopology {
        PlanTopology {
            layers: self.layers,
            has_cycle: self.has_cycle,
            isolated_count: self.isolated_count,
            critical_path_minutes: self.critical_path_minutes,
        }
    }
}

/// Longest dependency-respecting chain of durations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalChain {
    /// Actions along the chain, first to last
    pub actions: Vec<ActionId>,
    /// Sum of their estimated durations
    pub total_minutes: u32,
}

/// Validated dependency graph
///
/// Construction rejects duplicate ids and dangling references. Cycles are
/// not rejected; they are reported by [`DependencyGraph::layer`].
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    candidates: &'a [ActionCandidate],
    /// Dependency indices per candidate
    dependencies: Vec<Vec<usize>>,
    /// Edges run from dependency to dependent
    graph: DiGraphMap<usize, ()>,
}

impl<'a> DependencyGraph<'a> {
    /// Build and validate the graph
    ///
    /// # Errors
    /// - [`GraphError::DuplicateAction`] when two candidates share an id
    /// - [`GraphError::DanglingDependency`] when a dependency is not in the set
    pub fn build(candidates: &'a [ActionCandidate]) -> Result<Self, GraphError> {
        let mut index: HashMap<&ActionId, usize> = HashMap::with_capacity(candidates.len());
        for (i, candidate) in candidates.iter().enumerate() {
            if index.insert(&candidate.action_id, i).is_some() {
                return Err(GraphError::DuplicateAction(candidate.action_id.clone()));
            }
        }

        let mut graph = DiGraphMap::with_capacity(candidates.len(), candidates.len());
        let mut dependencies = Vec::with_capacity(candidates.len());
        for (i, candidate) in candidates.iter().enumerate() {
            graph.add_node(i);
            let mut deps = Vec::with_capacity(candidate.dependency.depends_on.len());
            for dep in &candidate.dependency.depends_on {
                let &d = index.get(dep).ok_or_else(|| GraphError::DanglingDependency {
                    action: candidate.action_id.clone(),
                    missing: dep.clone(),
                })?;
                graph.add_edge(d, i, ());
                deps.push(d);
            }
            dependencies.push(deps);
        }

        Ok(Self {
            candidates,
            dependencies,
            graph,
        })
    }

    /// Number of candidates
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.candidates.len()
    }

    /// Number of distinct dependency edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Candidates nothing depends on and that depend on nothing
    #[must_use]
    pub fn isolated_count(&self) -> usize {
        (0..self.candidates.len())
            .filter(|&i| self.dependencies[i].is_empty() && self.graph.neighbors(i).next().is_none())
            .count()
    }

    /// Peel the graph into execution layers
    #[must_use]
    pub fn layer(&self) -> Layering {
        let n = self.candidates.len();
        let mut resolved = vec![false; n];
        let mut unresolved = n;
        let mut layers: Vec<Vec<usize>> = Vec::new();

        while unresolved > 0 {
            let ready: Vec<usize> = (0..n)
                .filter(|&i| !resolved[i] && self.dependencies[i].iter().all(|&d| resolved[d]))
                .collect();
            if ready.is_empty() {
                break;
            }
            for &i in &ready {
                resolved[i] = true;
            }
            unresolved -= ready.len();
            layers.push(ready);
        }

        let has_cycle = unresolved > 0;
        let critical_path_minutes = if has_cycle {
            tracing::warn!(
                unresolved,
                "dependency cycle detected; falling back to sequential duration"
            );
            layers.push((0..n).filter(|&i| !resolved[i]).collect());
            self.candidates
                .iter()
                .fold(0u32, |acc, c| acc.saturating_add(c.estimated_minutes))
        } else {
            layers.iter().fold(0u32, |acc, layer| {
                let slowest = layer
                    .iter()
                    .map(|&i| self.candidates[i].estimated_minutes)
                    .max()
                    .unwrap_or(0);
                acc.saturating_add(slowest)
            })
        };

        Layering {
            layers: layers
                .into_iter()
                .map(|layer| {
                    layer
                        .into_iter()
                        .map(|i| self.candidates[i].action_id.clone())
                        .collect()
                })
                .collect(),
            has_cycle,
            isolated_count: self.isolated_count(),
            critical_path_minutes,
        }
    }

    /// Longest chain of durations through the graph; `None` when cyclic
    #[must_use]
    pub fn critical_chain(&self) -> Option<CriticalChain> {
        let order = toposort(&self.graph, None).ok()?;

        let mut best: Vec<u32> = vec![0; self.candidates.len()];
        let mut previous: Vec<Option<usize>> = vec![None; self.candidates.len()];
        for &node in &order {
            let (from, carried) = self.dependencies[node]
                .iter()
                .map(|&d| (Some(d), best[d]))
                .max_by_key(|&(_, minutes)| minutes)
                .unwrap_or((None, 0));
            best[node] = carried.saturating_add(self.candidates[node].estimated_minutes);
            previous[node] = from;
        }

        let (mut tail, &total_minutes) = best
            .iter()
            .enumerate()
            .max_by_key(|&(_, minutes)| *minutes)?;

        let mut chain = vec![tail];
        while let Some(prev) = previous[tail] {
            chain.push(prev);
            tail = prev;
        }
        chain.reverse();

        Some(CriticalChain {
            actions: chain
                .into_iter()
                .map(|i| self.candidates[i].action_id.clone())
                .collect(),
            total_minutes,
        })
    }
}

/// Build the graph and layer it in one call
///
/// # Errors
/// Propagates [`DependencyGraph::build`] failures.
pub fn layer(candidates: &[ActionCandidate]) -> Result<Layering, GraphError> {
    Ok(DependencyGraph::build(candidates)?.layer())
}
