//! Weighted routing graphs and the graph-algorithm interface.
//!
//! Routing builds a [`WeightedGraph`] per bounding box and asks a
//! [`GraphAlgorithms`] implementation for spanning trees, shortest paths and
//! Steiner trees. The default backend, [`PetgraphAlgorithms`], runs on
//! `petgraph`; tests can swap in another implementation.
//!
//! ```ignore
//! use lvplan_algo::graph::{GraphAlgorithms, PetgraphAlgorithms, WeightedGraph};
//!
//! let mut graph = WeightedGraph::new();
//! graph.add_edge(a, b, 12.0);
//! graph.add_edge(b, c, 3.0);
//! let tree = PetgraphAlgorithms.approximate_steiner_tree(&graph, &[a, c]);
//! ```

mod backend;

pub use backend::PetgraphAlgorithms;

use lvplan_core::{PointId, PointMatrix};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Interchangeable graph algorithms used by the topology builders.
pub trait GraphAlgorithms {
    /// Minimum spanning forest, one tree per connected component.
    fn minimum_spanning_tree(&self, graph: &WeightedGraph) -> Vec<(PointId, PointId)>;

    /// Lowest-weight node sequence from `source` to `target`, both included.
    fn shortest_path(
        &self,
        graph: &WeightedGraph,
        source: PointId,
        target: PointId,
    ) -> Option<Vec<PointId>>;

    /// Low-weight tree spanning `terminals`.
    ///
    /// Terminals in different components yield one subtree per component.
    fn approximate_steiner_tree(
        &self,
        graph: &WeightedGraph,
        terminals: &[PointId],
    ) -> Vec<(PointId, PointId)>;
}

/// Undirected graph over point IDs with `f64` edge weights.
#[derive(Debug, Clone, Default)]
pub struct WeightedGraph {
    graph: UnGraph<PointId, f64>,
    nodes: HashMap<PointId, NodeIndex>,
}

impl WeightedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph over every row of a square matrix; strictly positive entries become edges.
    pub fn from_matrix(matrix: &PointMatrix) -> Self {
        let mut graph = WeightedGraph::new();
        for id in matrix.row_ids() {
            graph.add_node(*id);
        }
        for (a, b, w) in matrix.positive_pairs() {
            graph.add_edge(a, b, w);
        }
        graph
    }

    /// Build from an edge list.
    pub fn build_graph(edges: &[(PointId, PointId, f64)]) -> Self {
        let mut graph = WeightedGraph::new();
        for &(a, b, w) in edges {
            graph.add_edge(a, b, w);
        }
        graph
    }

    pub fn add_node(&mut self, id: PointId) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(id);
        self.nodes.insert(id, idx);
        idx
    }

    /// Add an edge, replacing the weight of an existing one.
    pub fn add_edge(&mut self, a: PointId, b: PointId, weight: f64) {
        if a == b {
            return;
        }
        let ia = self.add_node(a);
        let ib = self.add_node(b);
        self.graph.update_edge(ia, ib, weight);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn weight(&self, a: PointId, b: PointId) -> Option<f64> {
        let ia = *self.nodes.get(&a)?;
        let ib = *self.nodes.get(&b)?;
        self.graph.find_edge(ia, ib).map(|e| self.graph[e])
    }

    /// Node IDs in insertion order.
    pub fn node_ids(&self) -> Vec<PointId> {
        self.graph.node_indices().map(|i| self.graph[i]).collect()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> Vec<(PointId, PointId, f64)> {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()], self.graph[e.target()], *e.weight()))
            .collect()
    }

    /// Connected components, isolated nodes included, ordered by first node.
    pub fn connected_components(&self) -> Vec<Vec<PointId>> {
        let mut uf = UnionFind::<usize>::new(self.graph.node_count());
        for e in self.graph.edge_references() {
            uf.union(e.source().index(), e.target().index());
        }
        let mut groups: BTreeMap<usize, Vec<PointId>> = BTreeMap::new();
        let mut first: HashMap<usize, usize> = HashMap::new();
        for idx in self.graph.node_indices() {
            let root = uf.find(idx.index());
            let key = *first.entry(root).or_insert(idx.index());
            groups.entry(key).or_default().push(self.graph[idx]);
        }
        groups.into_values().collect()
    }

    pub fn is_connected(&self) -> bool {
        self.connected_components().len() <= 1
    }

    /// Copy keeping only the given nodes and the edges between them.
    pub fn retain_nodes(&self, keep: &HashSet<PointId>) -> WeightedGraph {
        let mut out = WeightedGraph::new();
        for id in self.node_ids() {
            if keep.contains(&id) {
                out.add_node(id);
            }
        }
        for (a, b, w) in self.edges() {
            if keep.contains(&a) && keep.contains(&b) {
                out.add_edge(a, b, w);
            }
        }
        out
    }

    pub(crate) fn inner(&self) -> &UnGraph<PointId, f64> {
        &self.graph
    }

    pub(crate) fn index_of(&self, id: PointId) -> Option<NodeIndex> {
        self.nodes.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(v: u64) -> PointId {
        PointId::new(v)
    }

    #[test]
    fn add_edge_overwrites_weight() {
        let mut g = WeightedGraph::new();
        g.add_edge(p(1), p(2), 5.0);
        g.add_edge(p(2), p(1), 0.5);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.weight(p(1), p(2)), Some(0.5));
    }

    #[test]
    fn components_include_isolated_nodes() {
        let mut g = WeightedGraph::new();
        g.add_edge(p(1), p(2), 1.0);
        g.add_node(p(3));
        g.add_edge(p(4), p(5), 1.0);
        let comps = g.connected_components();
        assert_eq!(comps, vec![vec![p(1), p(2)], vec![p(3)], vec![p(4), p(5)]]);
        assert!(!g.is_connected());
    }

    #[test]
    fn retain_drops_edges_to_removed_nodes() {
        let g = WeightedGraph::build_graph(&[(p(1), p(2), 1.0), (p(2), p(3), 1.0)]);
        let keep: HashSet<PointId> = [p(1), p(2)].into_iter().collect();
        let r = g.retain_nodes(&keep);
        assert_eq!(r.node_count(), 2);
        assert_eq!(r.edge_count(), 1);
        assert!(r.is_connected());
    }

    #[test]
    fn self_loops_are_ignored() {
        let mut g = WeightedGraph::new();
        g.add_edge(p(1), p(1), 1.0);
        assert_eq!(g.edge_count(), 0);
    }
}
