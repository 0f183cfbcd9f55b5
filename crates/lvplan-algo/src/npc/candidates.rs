//! Candidate link generation and link costing.

use super::{CandidateLink, NpcNode};
use crate::connector::dijkstra_connection;
use crate::planner::ClusterNetworks;
use crate::routing::{Route, RoutingContext};
use lvplan_core::{
    ClusterId, ClusterInfo, EconomicsConfig, LvResult, NetworkSummary, Point, PointId, PointSet,
    Substation,
};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Cost and length given to a feasible connection that needs no new line.
const EMPTY_LINK_COST: u64 = 1000;

/// Net present cost (k€) of a link costing `investment` currency units.
///
/// Investment plus the discounted yearly O&M (paid from year 0) minus the
/// discounted residual value at the end of the project.
pub fn link_npc(investment: f64, economics: &EconomicsConfig) -> f64 {
    let capex = investment / 1000.0;
    let rate = 1.0 + economics.discount_rate;
    let years = economics.project_years;
    let om: f64 = (0..years)
        .map(|t| capex * economics.grid_om / rate.powi(t as i32))
        .sum();
    let lifetime = economics.grid_lifetime as f64;
    let salvage = capex * (lifetime - years as f64) / lifetime / rate.powi(years as i32);
    capex + om - salvage
}

/// Route every cluster-cluster and cluster-substation pair.
///
/// Each pair is joined between its two closest endpoints (planar), reusing
/// the lines of both cluster networks. Unroutable pairs are left out.
pub fn candidate_links(
    ctx: &RoutingContext<'_>,
    networks: &BTreeMap<ClusterId, ClusterNetworks>,
    clusters: &[ClusterInfo],
    substations: &[Substation],
    economics: &EconomicsConfig,
) -> LvResult<Vec<CandidateLink>> {
    let nodes: Vec<NpcNode> = clusters
        .iter()
        .map(|c| NpcNode::Cluster(c.id))
        .chain(substations.iter().map(|s| NpcNode::Substation(s.id)))
        .collect();
    let endpoints: BTreeMap<NpcNode, Endpoints> = nodes
        .iter()
        .map(|&node| (node, endpoints(ctx, networks, substations, node)))
        .collect();

    let mut pairs = Vec::new();
    for (i, &a) in nodes.iter().enumerate() {
        for &b in &nodes[i + 1..] {
            if !(a.is_substation() && b.is_substation()) {
                pairs.push((a, b));
            }
        }
    }
    info!(pairs = pairs.len(), "routing candidate links");

    let links: Vec<Option<CandidateLink>> = pairs
        .par_iter()
        .map(|&(a, b)| {
            let (Some(ea), Some(eb)) = (endpoints.get(&a), endpoints.get(&b)) else {
                return Ok(None);
            };
            route_pair(ctx, ea, eb, economics).map(|route| {
                route.map(|(route, npc_keur)| CandidateLink {
                    from: a,
                    to: b,
                    route,
                    npc_keur,
                })
            })
        })
        .collect::<LvResult<_>>()?;
    Ok(links.into_iter().flatten().collect())
}

/// Points a node can be reached at, and the lines it already owns.
#[derive(Debug, Default)]
struct Endpoints {
    points: PointSet,
    lines: Vec<(PointId, PointId)>,
}

fn endpoints(
    ctx: &RoutingContext<'_>,
    networks: &BTreeMap<ClusterId, ClusterNetworks>,
    substations: &[Substation],
    node: NpcNode,
) -> Endpoints {
    match node {
        NpcNode::Cluster(id) => {
            let backbone = networks.get(&id).map(|n| n.backbone()).unwrap_or_default();
            if backbone.is_empty() {
                Endpoints {
                    points: ctx.grid.filter(|p| p.cluster == Some(id) && p.population > 0.0),
                    lines: Vec::new(),
                }
            } else {
                let points = backbone
                    .point_ids()
                    .into_iter()
                    .filter_map(|pid| {
                        ctx.grid
                            .get(pid)
                            .or_else(|| ctx.roads.and_then(|r| r.points.get(pid)))
                            .cloned()
                    })
                    .collect();
                Endpoints {
                    points,
                    lines: backbone.pairs(),
                }
            }
        }
        NpcNode::Substation(id) => {
            let points = substations
                .iter()
                .find(|s| s.id == id)
                .and_then(|s| ctx.grid.nearest(s.x, s.y))
                .cloned()
                .into_iter()
                .collect();
            Endpoints {
                points,
                lines: Vec::new(),
            }
        }
    }
}

fn route_pair(
    ctx: &RoutingContext<'_>,
    a: &Endpoints,
    b: &Endpoints,
    economics: &EconomicsConfig,
) -> LvResult<Option<(Route, f64)>> {
    let Some((p1, p2)) = closest_pair(&a.points, &b.points) else {
        return Ok(None);
    };
    let reuse: Vec<(PointId, PointId)> = a.lines.iter().chain(&b.lines).copied().collect();
    let mut route = dijkstra_connection(ctx, p1, p2, &reuse, &[])?;
    if route.is_infeasible() {
        debug!(from = %p1.id, to = %p2.id, "candidate link dropped");
        return Ok(None);
    }
    if route.network.is_empty() {
        route.summary = NetworkSummary {
            cost: EMPTY_LINK_COST,
            length: EMPTY_LINK_COST,
        };
    }
    let npc = link_npc(route.summary.cost as f64, economics);
    Ok(Some((route, npc)))
}

/// Closest pair by planar distance; ties keep the first pair found.
fn closest_pair<'p>(a: &'p PointSet, b: &'p PointSet) -> Option<(&'p Point, &'p Point)> {
    let mut best: Option<(&Point, &Point, f64)> = None;
    for p in a.iter() {
        for q in b.iter() {
            let d = p.distance_2d(q);
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((p, q, d));
            }
        }
    }
    best.map(|(p, q, _)| (p, q))
}
