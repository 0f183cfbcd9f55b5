//! `petgraph` implementation of [`GraphAlgorithms`].
//!
//! The Steiner approximation follows Kou, Markowsky and Berman:
//!
//! 1. metric closure over the terminals (Dijkstra from each terminal)
//! 2. minimum spanning forest of the closure
//! 3. expand every closure edge into its shortest path
//! 4. minimum spanning forest of the expanded subgraph
//! 5. prune non-terminal leaves until none remain
//!
//! The result is within `2 - 2/t` of the optimal tree for `t` terminals.

use super::{GraphAlgorithms, WeightedGraph};
use lvplan_core::PointId;
use petgraph::algo::{astar, dijkstra, min_spanning_tree};
use petgraph::data::Element;
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Graph algorithms backed by `petgraph`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PetgraphAlgorithms;

impl GraphAlgorithms for PetgraphAlgorithms {
    fn minimum_spanning_tree(&self, graph: &WeightedGraph) -> Vec<(PointId, PointId)> {
        let inner = graph.inner();
        let ids: Vec<PointId> = inner.node_indices().map(|i| inner[i]).collect();
        min_spanning_tree(inner)
            .filter_map(|element| match element {
                Element::Edge { source, target, .. } => Some((ids[source], ids[target])),
                Element::Node { .. } => None,
            })
            .collect()
    }

    fn shortest_path(
        &self,
        graph: &WeightedGraph,
        source: PointId,
        target: PointId,
    ) -> Option<Vec<PointId>> {
        let start = graph.index_of(source)?;
        let goal = graph.index_of(target)?;
        let inner = graph.inner();
        astar(inner, start, |n| n == goal, |e| *e.weight(), |_| 0.0)
            .map(|(_, path)| path.into_iter().map(|i| inner[i]).collect())
    }

    fn approximate_steiner_tree(
        &self,
        graph: &WeightedGraph,
        terminals: &[PointId],
    ) -> Vec<(PointId, PointId)> {
        let mut seen = HashSet::new();
        let terminals: Vec<PointId> = terminals
            .iter()
            .copied()
            .filter(|t| graph.contains(*t) && seen.insert(*t))
            .collect();
        if terminals.len() < 2 {
            return Vec::new();
        }

        let inner = graph.inner();

        // Metric closure restricted to terminals
        let mut closure = WeightedGraph::new();
        for t in &terminals {
            closure.add_node(*t);
        }
        for (i, t) in terminals.iter().enumerate() {
            let Some(start) = graph.index_of(*t) else {
                continue;
            };
            let dist = dijkstra(inner, start, None, |e| *e.weight());
            for u in &terminals[i + 1..] {
                if let Some(d) = graph.index_of(*u).and_then(|iu| dist.get(&iu)) {
                    closure.add_edge(*t, *u, *d);
                }
            }
        }
        let closure_tree = self.minimum_spanning_tree(&closure);
        if closure_tree.len() + 1 < terminals.len() {
            let parts = closure.connected_components().len();
            warn!(
                terminals = terminals.len(),
                parts, "terminals span disconnected components; building one subtree per component"
            );
        }

        // Expand closure edges into shortest paths of the routing graph
        let mut expanded = WeightedGraph::new();
        for (a, b) in closure_tree {
            let Some(path) = self.shortest_path(graph, a, b) else {
                continue;
            };
            for pair in path.windows(2) {
                if let Some(w) = graph.weight(pair[0], pair[1]) {
                    expanded.add_edge(pair[0], pair[1], w);
                }
            }
        }
        let tree = self.minimum_spanning_tree(&expanded);
        let pruned = prune_leaves(tree, &terminals);
        debug!(
            terminals = terminals.len(),
            edges = pruned.len(),
            "steiner tree built"
        );
        pruned
    }
}

/// Repeatedly drop edges hanging from non-terminal leaves.
fn prune_leaves(mut edges: Vec<(PointId, PointId)>, terminals: &[PointId]) -> Vec<(PointId, PointId)> {
    let terminal: HashSet<PointId> = terminals.iter().copied().collect();
    loop {
        let mut degree: HashMap<PointId, usize> = HashMap::new();
        for (a, b) in &edges {
            *degree.entry(*a).or_default() += 1;
            *degree.entry(*b).or_default() += 1;
        }
        let is_dangling = |id: &PointId| degree.get(id) == Some(&1) && !terminal.contains(id);
        let before = edges.len();
        edges.retain(|(a, b)| !is_dangling(a) && !is_dangling(b));
        if edges.len() == before {
            return edges;
        }
    }
}
