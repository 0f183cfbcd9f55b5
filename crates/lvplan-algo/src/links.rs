//! Full electrification: link populated points outside every cluster to the
//! nearest built network.

use crate::connector::dijkstra_connection;
use crate::routing::{Route, RoutingContext};
use lvplan_core::{LvResult, Network, Point, PointId, PointSet};
use tracing::{info, warn};

/// Connect every unclustered point with at least `population_threshold`
/// inhabitants to the closest point of `networks`.
///
/// Each point is routed to its nearest network point (planar distance),
/// reusing every existing line at no cost. Lines shared by several links are
/// kept once. Points that cannot be routed are skipped with a warning.
pub fn full_electrification(
    ctx: &RoutingContext<'_>,
    networks: &[&Network],
    population_threshold: f64,
) -> LvResult<Route> {
    let reuse: Vec<(PointId, PointId)> = networks.iter().flat_map(|n| n.pairs()).collect();
    let network_points = network_points(ctx, networks);
    if network_points.is_empty() {
        return Ok(Route::empty());
    }

    let targets = ctx
        .grid
        .filter(|p| p.cluster.is_none() && p.population >= population_threshold);
    info!(points = targets.len(), "connecting the people outside the clustered area");

    let mut links = Network::new();
    for target in targets.iter() {
        let Some(nearest) = network_points.nearest(target.x, target.y) else {
            continue;
        };
        let route = dijkstra_connection(ctx, target, nearest, &reuse, &[])?;
        if route.is_infeasible() {
            warn!(point = %target.id, "unclustered point cannot be linked");
            continue;
        }
        links.extend(route.network);
    }
    links.dedup_pairs();
    let summary = links.summary();
    Ok(Route {
        network: links,
        summary,
    })
}

/// Grid or road points touched by any of `networks`.
fn network_points(ctx: &RoutingContext<'_>, networks: &[&Network]) -> PointSet {
    let mut points = PointSet::new();
    for network in networks {
        for id in network.point_ids() {
            let found: Option<&Point> = ctx
                .grid
                .get(id)
                .or_else(|| ctx.roads.and_then(|r| r.points.get(id)));
            if let Some(p) = found {
                points.push(p.clone());
            }
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steiner::steiner;
    use lvplan_core::ClusterId;

    /// A clustered row 1..=4 followed by unclustered points 5..=7.
    fn grid() -> PointSet {
        (1..=7)
            .map(|i| {
                let p = Point::new(i, (i - 1) as f64 * 100.0, 0.0).with_population(1.0);
                if i <= 4 {
                    p.with_cluster(ClusterId::new(1))
                } else {
                    p
                }
            })
            .collect()
    }

    #[test]
    fn outside_points_are_linked_once() {
        let grid = grid();
        let ctx = RoutingContext::new(&grid, 100.0, 1000.0);
        let cluster = grid.cluster(ClusterId::new(1));
        let network = steiner(&ctx, &cluster, &[]).unwrap().network;
        assert_eq!(network.len(), 3);

        let links = full_electrification(&ctx, &[&network], 1.0).unwrap();
        // 4-5, 5-6 and 6-7, shared lines kept once
        assert_eq!(links.network.len(), 3);
        assert_eq!(links.summary.length, 300);
        assert_eq!(links.summary.cost, 300);
    }

    #[test]
    fn threshold_filters_targets() {
        let grid = grid();
        let ctx = RoutingContext::new(&grid, 100.0, 1000.0);
        let cluster = grid.cluster(ClusterId::new(1));
        let network = steiner(&ctx, &cluster, &[]).unwrap().network;
        let links = full_electrification(&ctx, &[&network], 2.0).unwrap();
        assert!(links.network.is_empty());
    }

    #[test]
    fn no_network_no_links() {
        let grid = grid();
        let ctx = RoutingContext::new(&grid, 100.0, 1000.0);
        let links = full_electrification(&ctx, &[], 1.0).unwrap();
        assert_eq!(links, Route::empty());
    }
}
