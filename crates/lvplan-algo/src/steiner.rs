//! Steiner topology builder.
//!
//! Connects the terminal points with a low-cost tree using only the points
//! inside the terminals' bounding box. Direct edges longer than
//! `ceil(1.5 * resolution)` are removed first, so every line of the result is
//! either a short mesh edge or a road segment.

use crate::routing::{build_box_graph, EdgeBias, Route, RoutingContext};
use lvplan_core::{edges_to_lines, LvResult, PointId, PointSet};
use tracing::{info, warn};
use web_time::Instant;

/// Build a Steiner network spanning `terminals`.
///
/// `branch` lists point pairs already carrying a line; they are reused at
/// near-zero cost and left out of the returned network.
pub fn steiner(
    ctx: &RoutingContext<'_>,
    terminals: &PointSet,
    branch: &[(PointId, PointId)],
) -> LvResult<Route> {
    let start = Instant::now();
    let bias = if ctx.roads.is_some() {
        EdgeBias {
            reuse: branch,
            frozen: &[],
        }
    } else {
        EdgeBias {
            reuse: &[],
            frozen: branch,
        }
    };
    let built = build_box_graph(ctx, terminals, &[], bias)?;

    if built.graph.edge_count() == 0 {
        warn!(
            resolution = ctx.resolution,
            terminals = terminals.len(),
            "empty graph: check the resolution"
        );
        return Ok(Route::empty());
    }

    let terminal_ids: Vec<PointId> = terminals
        .iter()
        .map(|p| p.id)
        .filter(|id| built.points.contains(*id))
        .collect();
    let tree = ctx
        .algorithms
        .approximate_steiner_tree(&built.graph, &terminal_ids);
    let lines = edges_to_lines(&tree, &built.points, &built.costs, branch)?;
    let route = Route::from_lines(lines);

    info!(
        lines = route.network.len(),
        cost = route.summary.cost,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "steiner network built"
    );
    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lvplan_core::{Point, PointSet};

    /// `n x n` mesh with `spacing` meters between neighbours.
    fn mesh(n: u64, spacing: f64) -> PointSet {
        let mut points = Vec::new();
        for i in 0..n {
            for j in 0..n {
                points.push(
                    Point::new(i * n + j + 1, i as f64 * spacing, j as f64 * spacing)
                        .with_population(1.0),
                );
            }
        }
        points.into_iter().collect()
    }

    #[test]
    fn three_by_three_mesh_gives_eight_lines() {
        let grid = mesh(3, 1000.0);
        let ctx = RoutingContext::new(&grid, 1000.0, 1.0);
        let route = steiner(&ctx, &grid, &[]).unwrap();
        assert_eq!(route.network.len(), 8);
        assert_eq!(route.summary.length, 8000);
        assert_eq!(route.summary.cost, 8);
    }

    #[test]
    fn cost_scales_with_line_base_cost() {
        let grid = mesh(3, 1000.0);
        let ctx = RoutingContext::new(&grid, 1000.0, 1000.0);
        let route = steiner(&ctx, &grid, &[]).unwrap();
        assert_eq!(route.summary.cost, 8000);
    }

    #[test]
    fn no_line_exceeds_length_limit() {
        let grid = mesh(5, 100.0);
        let ctx = RoutingContext::new(&grid, 100.0, 1000.0);
        let terminals = grid.filter(|p| p.id.value() % 3 == 0);
        let route = steiner(&ctx, &terminals, &[]).unwrap();
        assert!(!route.network.is_empty());
        assert!(route
            .network
            .lines
            .iter()
            .all(|l| l.length <= ctx.length_limit()));
    }

    #[test]
    fn coarse_resolution_soft_degrades() {
        let grid = mesh(3, 1000.0);
        let ctx = RoutingContext::new(&grid, 100.0, 1.0);
        let route = steiner(&ctx, &grid, &[]).unwrap();
        assert!(route.network.is_empty());
        assert_eq!(route.summary.cost, 0);
        assert_eq!(route.summary.length, 0);
    }

    #[test]
    fn branch_edges_are_reused_not_exported() {
        let grid = mesh(3, 1000.0);
        let ctx = RoutingContext::new(&grid, 1000.0, 1000.0);
        let branch = [
            (PointId::new(1), PointId::new(2)),
            (PointId::new(2), PointId::new(3)),
        ];
        let route = steiner(&ctx, &grid, &branch).unwrap();
        assert_eq!(route.network.len(), 6);
        assert!(route
            .network
            .lines
            .iter()
            .all(|l| !branch.contains(&l.key())));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let grid = mesh(4, 500.0);
        let ctx = RoutingContext::new(&grid, 500.0, 1000.0);
        let terminals = grid.filter(|p| p.id.value() % 2 == 1);
        let a = steiner(&ctx, &terminals, &[]).unwrap();
        let b = steiner(&ctx, &terminals, &[]).unwrap();
        assert_eq!(a, b);
    }
}
