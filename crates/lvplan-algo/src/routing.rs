//! Shared routing context and bounding-box graph construction.

use crate::graph::{GraphAlgorithms, PetgraphAlgorithms, WeightedGraph};
use crate::roads::RoadGraph;
use lvplan_core::{
    bounding_box, cost_matrix, distance_matrix, Dims, Line, LvResult, Network, NetworkSummary,
    Point, PointId, PointMatrix, PointSet, RoutingConfig, FROZEN_EDGE_COST,
};
use std::collections::HashSet;
use tracing::debug;

static PETGRAPH: PetgraphAlgorithms = PetgraphAlgorithms;

/// Read-only inputs shared by every routing call of a pass.
#[derive(Clone, Copy)]
pub struct RoutingContext<'a> {
    /// Points a route may pass through.
    pub grid: &'a PointSet,
    /// Road geometry; `None` routes over the grid only.
    pub roads: Option<&'a RoadGraph>,
    /// Mesh spacing (m).
    pub resolution: f64,
    /// Line base cost (currency per km).
    pub line_base_cost: f64,
    pub algorithms: &'a (dyn GraphAlgorithms + Sync),
}

impl<'a> RoutingContext<'a> {
    pub fn new(grid: &'a PointSet, resolution: f64, line_base_cost: f64) -> Self {
        Self {
            grid,
            roads: None,
            resolution,
            line_base_cost,
            algorithms: &PETGRAPH,
        }
    }

    /// Context from the routing configuration; roads are used when enabled and supplied.
    pub fn from_config(
        grid: &'a PointSet,
        roads: Option<&'a RoadGraph>,
        config: &RoutingConfig,
    ) -> Self {
        let roads = if config.use_roads { roads } else { None };
        Self {
            roads,
            ..Self::new(grid, config.resolution, config.line_base_cost)
        }
    }

    pub fn with_roads(mut self, roads: Option<&'a RoadGraph>) -> Self {
        self.roads = roads;
        self
    }

    pub fn with_grid(mut self, grid: &'a PointSet) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_line_base_cost(mut self, line_base_cost: f64) -> Self {
        self.line_base_cost = line_base_cost;
        self
    }

    pub fn with_algorithms(mut self, algorithms: &'a (dyn GraphAlgorithms + Sync)) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// Planar length above which a direct edge is filtered out.
    pub fn length_limit(&self) -> f64 {
        (1.5 * self.resolution).ceil()
    }

    /// Planar distance above which the connector gives up.
    pub fn connection_limit(&self) -> f64 {
        50.0 * self.resolution
    }

    fn road_graph(&self) -> Option<&'a RoadGraph> {
        self.roads.filter(|r| !r.points.is_empty())
    }
}

/// A routed network with its truncated totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    pub network: Network,
    pub summary: NetworkSummary,
}

impl Route {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sentinel result of an unroutable connection.
    pub fn infeasible() -> Self {
        Self {
            network: Network::new(),
            summary: NetworkSummary::infeasible(),
        }
    }

    pub fn from_lines(lines: Vec<Line>) -> Self {
        let network = Network::from_lines(lines);
        let summary = network.summary();
        Self { network, summary }
    }

    pub fn is_infeasible(&self) -> bool {
        self.summary.is_infeasible()
    }
}

/// Edge pairs with special treatment while building a box graph.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EdgeBias<'p> {
    /// Existing lines to reuse: free in the line costs. With roads the
    /// routing weight stays the 3D distance.
    pub reuse: &'p [(PointId, PointId)],
    /// Committed lines: near-free both as line cost and routing weight.
    pub frozen: &'p [(PointId, PointId)],
}

/// The routing graph of one bounding box.
#[derive(Debug)]
pub(crate) struct BoxGraph {
    pub points: PointSet,
    /// Line costs used when converting a path into lines.
    pub costs: PointMatrix,
    pub graph: WeightedGraph,
}

/// Build the routing graph over the grid (and road) points inside the box of `reference`.
///
/// `anchors` are added to the box when missing so that route endpoints always exist.
pub(crate) fn build_box_graph(
    ctx: &RoutingContext<'_>,
    reference: &PointSet,
    anchors: &[&Point],
    bias: EdgeBias<'_>,
) -> LvResult<BoxGraph> {
    let mut points = bounding_box(reference, ctx.grid);
    for anchor in anchors {
        points.push((*anchor).clone());
    }
    let roads = ctx.road_graph();
    let mut road_ids: HashSet<PointId> = HashSet::new();
    if let Some(roads) = roads {
        let road_box = bounding_box(reference, &roads.points);
        for p in road_box.iter() {
            if points.push(p.clone()) {
                road_ids.insert(p.id);
            }
        }
    }

    let d2 = distance_matrix(&points, &points, Dims::Planar);
    let d3 = distance_matrix(&points, &points, Dims::Spatial);
    let mut costs = cost_matrix(&points, &d3, ctx.line_base_cost)?;
    let limit = ctx.length_limit();

    let graph = match roads {
        None => {
            filter_long_edges(&mut costs, &d2, limit);
            for &(a, b) in bias.reuse.iter().chain(bias.frozen) {
                costs.set_symmetric(a, b, FROZEN_EDGE_COST);
            }
            WeightedGraph::from_matrix(&costs)
        }
        Some(roads) => {
            let mut edges = costs.clone();
            for &(a, b) in bias.reuse {
                if let Some(d) = d3.get(a, b) {
                    costs.set_symmetric(a, b, FROZEN_EDGE_COST);
                    edges.set_symmetric(a, b, d);
                }
            }
            for &(a, b) in bias.frozen {
                costs.set_symmetric(a, b, FROZEN_EDGE_COST);
                edges.set_symmetric(a, b, FROZEN_EDGE_COST);
            }
            filter_long_edges(&mut edges, &d2, limit);
            // straight shortcuts between road vertices go through the segments instead
            edges.update(|a, b, v| {
                if road_ids.contains(&a) && road_ids.contains(&b) {
                    0.0
                } else {
                    v
                }
            });
            let mut graph = WeightedGraph::from_matrix(&edges);
            let frozen: HashSet<(PointId, PointId)> = bias
                .frozen
                .iter()
                .flat_map(|&(a, b)| [(a, b), (b, a)])
                .collect();
            for segment in roads.segments_within(&points) {
                let length_km = if frozen.contains(&(segment.id1, segment.id2)) {
                    FROZEN_EDGE_COST
                } else {
                    segment.length_km
                };
                graph.add_edge(segment.id1, segment.id2, length_km * ctx.line_base_cost);
            }
            graph
        }
    };

    debug!(
        points = points.len(),
        edges = graph.edge_count(),
        roads = road_ids.len(),
        "box graph built"
    );
    Ok(BoxGraph {
        points,
        costs,
        graph,
    })
}

/// Zero every entry whose planar length exceeds `limit`.
fn filter_long_edges(matrix: &mut PointMatrix, d2: &PointMatrix, limit: f64) {
    matrix.update(|a, b, v| match d2.get(a, b) {
        Some(d) if d > limit => 0.0,
        _ => v,
    });
}

/// Consecutive node pairs of a path.
pub(crate) fn path_pairs(path: &[PointId]) -> Vec<(PointId, PointId)> {
    path.windows(2).map(|w| (w[0], w[1])).collect()
}
