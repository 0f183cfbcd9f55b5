//! Flat cluster routing: one Steiner or Spider network per cluster.
//!
//! Small clusters run both builders and keep the cheaper network (ties go to
//! Steiner) among those that join every terminal; clusters with `resolution / 5` or more terminals, or 500 or
//! more points, use Spider only.

use crate::routing::{Route, RoutingContext};
use crate::spider::spider;
use crate::steiner::steiner;
use lvplan_core::{connected_components, LvResult, PointSet};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Clusters with this many points or more never run Steiner.
pub const STEINER_MAX_CLUSTER_POINTS: usize = 500;

/// Which builder produced a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    Steiner,
    Spider,
}

impl Topology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::Steiner => "steiner",
            Topology::Spider => "spider",
        }
    }
}

/// True when Steiner is affordable for `terminals` eligible points in a
/// cluster of `cluster_points` points.
pub fn steiner_feasible(terminals: usize, cluster_points: usize, size_resolution: f64) -> bool {
    (terminals as f64) < size_resolution / 5.0 && cluster_points < STEINER_MAX_CLUSTER_POINTS
}

/// Route one cluster in flat mode.
///
/// `terminals` are the cluster points that need electricity; `cluster_points`
/// is the total number of points in the cluster.
pub fn cluster_grid(
    ctx: &RoutingContext<'_>,
    terminals: &PointSet,
    cluster_points: usize,
) -> LvResult<(Topology, Route)> {
    if !steiner_feasible(terminals.len(), cluster_points, ctx.resolution) {
        info!(
            terminals = terminals.len(),
            "too many points to use Steiner, running Spider"
        );
        return Ok((Topology::Spider, spider(ctx, terminals, &[])?));
    }

    let by_spider = spider(ctx, terminals, &[])?;
    let by_steiner = steiner(ctx, terminals, &[])?;
    let steiner_wins = match (joins(&by_steiner, terminals), joins(&by_spider, terminals)) {
        (true, false) => true,
        (false, true) => {
            warn!(
                terminals = terminals.len(),
                lines = by_steiner.network.len(),
                "Steiner left terminals apart, keeping Spider"
            );
            false
        }
        _ => by_steiner.summary.cost <= by_spider.summary.cost,
    };
    if steiner_wins {
        info!(cost = by_steiner.summary.cost, "Steiner has the better cost");
        Ok((Topology::Steiner, by_steiner))
    } else {
        info!(cost = by_spider.summary.cost, "Spider has the better cost");
        Ok((Topology::Spider, by_spider))
    }
}

/// True when every terminal sits in one connected piece of `route`.
fn joins(route: &Route, terminals: &PointSet) -> bool {
    if terminals.len() <= 1 {
        return true;
    }
    let components = connected_components(&route.network.pairs());
    components
        .iter()
        .any(|c| terminals.iter().all(|t| c.contains(&t.id)))
}
