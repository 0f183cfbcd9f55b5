//! Shortest-path connections between two points.
//!
//! Used for cluster-to-substation and cluster-to-cluster links, Spider long
//! edge repair and full-electrification links. A connection is searched in
//! the bounding box of its two endpoints; unroutable connections return the
//! [`Route::infeasible`] sentinel instead of an error.

use crate::graph::WeightedGraph;
use crate::routing::{build_box_graph, path_pairs, EdgeBias, Route, RoutingContext};
use lvplan_core::{edges_to_lines, LvResult, Point, PointId, PointSet};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Route the cheapest line from `source` to `target`.
///
/// `reuse` pairs (existing cluster grid) are free to traverse and are not
/// exported again; `frozen` pairs (main branch) are near-free even as routing
/// weight.
pub fn dijkstra_connection(
    ctx: &RoutingContext<'_>,
    source: &Point,
    target: &Point,
    reuse: &[(PointId, PointId)],
    frozen: &[(PointId, PointId)],
) -> LvResult<Route> {
    let distance = source.distance_2d(target);
    if distance > ctx.connection_limit() {
        warn!(
            source = %source.id,
            target = %target.id,
            distance,
            "connection distance too long to route"
        );
        return Ok(Route::infeasible());
    }
    if source.id == target.id {
        return Ok(Route::empty());
    }

    let reference: PointSet = [source.clone(), target.clone()].into_iter().collect();
    let built = build_box_graph(
        ctx,
        &reference,
        &[source, target],
        EdgeBias { reuse, frozen },
    )?;
    if built.points.len() < 2 {
        return Ok(Route::empty());
    }

    let graph = match prune_to_endpoints(&built.graph, source.id, target.id) {
        Some(graph) => graph,
        None => {
            debug!(source = %source.id, target = %target.id, "endpoints not connected in box");
            return Ok(Route::infeasible());
        }
    };

    let Some(path) = ctx.algorithms.shortest_path(&graph, source.id, target.id) else {
        return Ok(Route::infeasible());
    };
    let existing: Vec<(PointId, PointId)> = reuse.iter().chain(frozen).copied().collect();
    let lines = edges_to_lines(&path_pairs(&path), &built.points, &built.costs, &existing)?;
    Ok(Route::from_lines(lines))
}

/// Drop every component that does not hold both endpoints.
///
/// Returns `None` when nothing is left.
fn prune_to_endpoints(
    graph: &WeightedGraph,
    source: PointId,
    target: PointId,
) -> Option<WeightedGraph> {
    if graph.is_connected() {
        return Some(graph.clone());
    }
    let keep: HashSet<PointId> = graph
        .connected_components()
        .into_iter()
        .filter(|c| c.contains(&source) && c.contains(&target))
        .flatten()
        .collect();
    if keep.is_empty() {
        return None;
    }
    let pruned = graph.retain_nodes(&keep);
    pruned.is_connected().then_some(pruned)
}
