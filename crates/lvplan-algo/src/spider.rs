//! Spider topology builder.
//!
//! A minimum spanning tree over the cluster points by 3D distance, followed
//! by repair of every line longer than `ceil(1.5 * resolution)`: long lines
//! are processed shortest first and replaced with a shortest-path detour
//! through the grid, reusing the lines accepted so far at no cost.

use crate::connector::dijkstra_connection;
use crate::graph::WeightedGraph;
use crate::routing::{Route, RoutingContext};
use lvplan_core::{
    cost_matrix, distance_matrix, edges_to_lines, Dims, Line, LvError, LvResult, PointId,
    PointSet, FROZEN_EDGE_COST,
};
use tracing::{debug, info, warn};
use web_time::Instant;

/// Build a Spider network over `points`, repairing long lines through `ctx.grid`.
///
/// `branch` pairs already carry a line: they are near-free and left out of
/// the returned network.
pub fn spider(
    ctx: &RoutingContext<'_>,
    points: &PointSet,
    branch: &[(PointId, PointId)],
) -> LvResult<Route> {
    let start = Instant::now();
    let d3 = distance_matrix(points, points, Dims::Spatial);
    let mut costs = cost_matrix(points, &d3, ctx.line_base_cost)?;
    for &(a, b) in branch {
        costs.set_symmetric(a, b, FROZEN_EDGE_COST);
    }

    let graph = WeightedGraph::from_matrix(&d3);
    let tree = ctx.algorithms.minimum_spanning_tree(&graph);
    let lines = edges_to_lines(&tree, points, &costs, branch)?;

    let limit = ctx.length_limit();
    let (mut long, mut short): (Vec<Line>, Vec<Line>) =
        lines.into_iter().partition(|l| l.length.trunc() > limit);
    debug!(long = long.len(), short = short.len(), "spanning tree split");

    long.sort_by(|a, b| a.length.total_cmp(&b.length));
    for line in long {
        let (Some(p1), Some(p2)) = (points.get(line.id1), points.get(line.id2)) else {
            return Err(LvError::Routing(format!(
                "line {}-{} lost its endpoints",
                line.id1, line.id2
            )));
        };
        let accepted: Vec<(PointId, PointId)> = short.iter().map(|l| (l.id1, l.id2)).collect();
        let detour = dijkstra_connection(ctx, p2, p1, &accepted, branch)?;
        if detour.is_infeasible() {
            warn!(
                id1 = %line.id1,
                id2 = %line.id2,
                length = line.length,
                "no detour for long line; keeping the direct line"
            );
            short.push(line);
        } else {
            short.extend(detour.network.lines);
        }
    }

    let route = Route::from_lines(short);
    info!(
        lines = route.network.len(),
        cost = route.summary.cost,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "spider network built"
    );
    Ok(route)
}
