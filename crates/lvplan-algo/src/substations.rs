//! Substation assignment and connection of a cluster network.

use crate::connector::dijkstra_connection;
use crate::routing::{Route, RoutingContext};
use lvplan_core::{
    LvResult, Point, PointId, PointSet, Substation, SubstationId, SubstationKind,
};
use tracing::debug;

/// Number of nearest substations tried per cluster.
pub const CANDIDATE_SUBSTATIONS: usize = 3;

/// A previous candidate wins when within this cost (currency units) ...
const COST_TOLERANCE: f64 = 5000.0;
/// ... while offering at least this much more capacity (kW).
const CAPACITY_MARGIN_KW: f64 = 100.0;

/// A substation chosen for a cluster together with the grid point it reaches.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignedSubstation {
    pub substation: Substation,
    /// Grid point the substation is snapped to.
    pub snapped: Point,
    /// Closest network point (3D) to the snapped substation.
    pub connecting_point: Point,
    pub distance: f64,
}

/// Best connection of a cluster network to a substation.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstationConnection {
    pub substation: SubstationId,
    pub kind: SubstationKind,
    pub route: Route,
    /// Line cost plus the build cost of a new substation (currency units).
    pub cost: f64,
}

/// Pick the nearest substations able to supply `load_kw`.
///
/// Each substation is snapped to its nearest grid point; the
/// [`CANDIDATE_SUBSTATIONS`] closest to any of `network_points` are
/// returned, nearest first.
pub fn substation_assignment(
    grid: &PointSet,
    network_points: &PointSet,
    substations: &[Substation],
    load_kw: f64,
) -> Vec<AssignedSubstation> {
    if network_points.is_empty() {
        return Vec::new();
    }
    let mut assigned: Vec<AssignedSubstation> = substations
        .iter()
        .filter(|s| s.power_available_kw > load_kw)
        .filter_map(|s| {
            let snapped = grid.nearest(s.x, s.y)?.clone();
            let (connecting_point, distance) = network_points
                .iter()
                .map(|p| (p, p.distance_3d(&snapped)))
                .min_by(|a, b| a.1.total_cmp(&b.1))?;
            Some(AssignedSubstation {
                substation: s.clone(),
                connecting_point: connecting_point.clone(),
                snapped,
                distance,
            })
        })
        .collect();
    assigned.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    assigned.truncate(CANDIDATE_SUBSTATIONS);
    assigned
}

/// Route each assigned substation and keep the best one.
///
/// New substations add their build cost (k€ in the table). The cheapest
/// connection wins, except that an earlier candidate is kept when the new
/// minimum saves less than 5000 and the earlier one offers more than 100 kW
/// extra capacity. Returns `None` when nothing was assigned.
pub fn substation_connection(
    ctx: &RoutingContext<'_>,
    assigned: &[AssignedSubstation],
    reuse: &[(PointId, PointId)],
    cost_hv_keur: f64,
    cost_mv_keur: f64,
) -> LvResult<Option<SubstationConnection>> {
    let mut best: Option<SubstationConnection> = None;
    let mut best_cost = 0.0;
    let mut best_power = 0.0;
    let mut min_cost = f64::INFINITY;

    for candidate in assigned {
        let route = dijkstra_connection(
            ctx,
            &candidate.snapped,
            &candidate.connecting_point,
            reuse,
            &[],
        )?;
        let sub = &candidate.substation;
        let mut cost = route.summary.cost as f64;
        if !sub.exists {
            cost += 1000.0
                * match sub.kind {
                    SubstationKind::Hv => cost_hv_keur,
                    SubstationKind::Mv => cost_mv_keur,
                };
        }
        debug!(substation = %sub.id, cost, "substation candidate routed");
        min_cost = min_cost.min(cost);
        if cost != min_cost {
            continue;
        }
        if best_cost - cost < COST_TOLERANCE
            && best_power - sub.power_available_kw > CAPACITY_MARGIN_KW
        {
            continue;
        }
        best_cost = cost;
        best_power = sub.power_available_kw;
        best = Some(SubstationConnection {
            substation: sub.id,
            kind: sub.kind,
            route,
            cost,
        });
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lvplan_core::{Line, Network};

    fn row(n: u64, spacing: f64) -> PointSet {
        (0..n)
            .map(|i| Point::new(i + 1, i as f64 * spacing, 0.0))
            .collect()
    }

    fn sub(id: u64, x: f64, power: f64, exists: bool) -> Substation {
        Substation {
            id: SubstationId::new(id),
            x,
            y: 0.0,
            power_available_kw: power,
            kind: SubstationKind::Mv,
            cost_keur: 50.0,
            exists,
        }
    }

    fn network(grid: &PointSet, pairs: &[(u64, u64)]) -> Network {
        Network::from_lines(
            pairs
                .iter()
                .map(|&(a, b)| {
                    let pa = grid.get(PointId::new(a)).unwrap();
                    let pb = grid.get(PointId::new(b)).unwrap();
                    Line {
                        id1: pa.id,
                        id2: pb.id,
                        cost: 100.0,
                        length: pa.distance_2d(pb),
                        x1: pa.x,
                        y1: pa.y,
                        x2: pb.x,
                        y2: pb.y,
                        component: None,
                        power_kw: None,
                    }
                })
                .collect(),
        )
    }

    #[test]
    fn assignment_filters_by_capacity_and_distance() {
        let grid = row(10, 100.0);
        let net = network(&grid, &[(1, 2), (2, 3)]);
        let subs = vec![
            sub(1, 900.0, 500.0, true),
            sub(2, 500.0, 50.0, true),
            sub(3, 400.0, 500.0, true),
            sub(4, 600.0, 500.0, true),
            sub(5, 700.0, 500.0, true),
        ];
        let points = grid.select(&net.point_ids());
        let assigned = substation_assignment(&grid, &points, &subs, 100.0);
        let ids: Vec<u64> = assigned.iter().map(|a| a.substation.id.value()).collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert_eq!(assigned[0].connecting_point.id, PointId::new(3));
        assert_eq!(assigned[0].snapped.id, PointId::new(5));
    }

    #[test]
    fn new_substation_adds_build_cost() {
        let grid = row(6, 100.0);
        let net = network(&grid, &[(1, 2)]);
        let subs = vec![sub(7, 400.0, 500.0, false)];
        let points = grid.select(&net.point_ids());
        let assigned = substation_assignment(&grid, &points, &subs, 10.0);
        let ctx = RoutingContext::new(&grid, 100.0, 1000.0);
        let reuse = net.pairs();
        let best = substation_connection(&ctx, &assigned, &reuse, 25.0, 10.0)
            .unwrap()
            .unwrap();
        // 300 m at 1000 per km plus 10 k€
        assert_eq!(best.route.summary.cost, 300);
        assert_eq!(best.cost, 10_300.0);
        assert_eq!(best.substation, SubstationId::new(7));
    }

    #[test]
    fn larger_substation_kept_when_nearly_as_cheap() {
        let grid = row(8, 100.0);
        let net = network(&grid, &[(1, 2)]);
        let mut big = sub(1, 400.0, 1000.0, true);
        big.id = SubstationId::new(1);
        let small = sub(2, 300.0, 200.0, true);
        // routed in order: big (300 m) then small (200 m)
        let assigned = vec![
            AssignedSubstation {
                snapped: grid.get(PointId::new(5)).unwrap().clone(),
                connecting_point: grid.get(PointId::new(2)).unwrap().clone(),
                distance: 300.0,
                substation: big,
            },
            AssignedSubstation {
                snapped: grid.get(PointId::new(4)).unwrap().clone(),
                connecting_point: grid.get(PointId::new(2)).unwrap().clone(),
                distance: 200.0,
                substation: small,
            },
        ];
        let ctx = RoutingContext::new(&grid, 100.0, 1000.0);
        let best = substation_connection(&ctx, &assigned, &[], 25.0, 10.0)
            .unwrap()
            .unwrap();
        assert_eq!(best.substation, SubstationId::new(1));
    }

    #[test]
    fn nothing_assigned_means_no_connection() {
        let grid = row(2, 100.0);
        let ctx = RoutingContext::new(&grid, 100.0, 1000.0);
        assert!(substation_connection(&ctx, &[], &[], 25.0, 10.0)
            .unwrap()
            .is_none());
    }
}
