//! Branch-mode routing: a main branch on a coarse grid plus collateral networks.
//!
//! The cluster is first downsampled into square cells; populated cells become
//! the terminals of a trunk ("main branch") routed through the cluster's own
//! points. Collateral networks then attach every eligible point, with the
//! branch lines frozen near zero cost so they are not routed twice. Finally
//! the collateral lines are split into connected components and each
//! component is sized by the population it serves.

use crate::grid::{steiner_feasible, Topology};
use crate::routing::{Route, RoutingContext};
use crate::spider::spider;
use crate::steiner::steiner;
use lvplan_core::{
    connected_components, ClusterInfo, Line, LvError, LvResult, Point, PointId, PointSet,
    RoutingConfig,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

/// Main branch and collateral networks of one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchNetworks {
    /// Builder used for the main branch, `None` when no branch was needed.
    pub branch_topology: Option<Topology>,
    pub branch: Route,
    pub collateral_topology: Topology,
    /// Collateral lines tagged with their component and power demand.
    pub collateral: Route,
}

/// A cell of the coarse grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Cell {
    col: i64,
    row: i64,
}

/// Side (m) of the coarse cells for a smallest cluster of `min_cluster_size` points.
pub fn low_resolution(min_cluster_size: usize, resolution: f64) -> f64 {
    (((min_cluster_size as f64).sqrt() / 3.0 + 1.0) * resolution).trunc()
}

/// Downsample `grid` into square cells sized from the smallest cluster.
///
/// Every cell holding at least one clustered point yields one point: ID and
/// cluster of the clustered point nearest the cell centre, coordinates of
/// the centre, summed population and mean elevation and weight of all the
/// points in the cell.
pub fn downsample(
    grid: &PointSet,
    clusters: &[ClusterInfo],
    resolution: f64,
) -> LvResult<PointSet> {
    let Some(min_size) = clusters
        .iter()
        .map(|c| grid.iter().filter(|p| p.cluster == Some(c.id)).count())
        .min()
    else {
        return Ok(PointSet::new());
    };
    let side = low_resolution(min_size, resolution);
    if side < 1.0 {
        return Err(LvError::Validation(format!(
            "resolution {resolution} gives an empty coarse cell"
        )));
    }

    let (min_x, min_y) = grid
        .iter()
        .fold((f64::INFINITY, f64::INFINITY), |(x, y), p| {
            (x.min(p.x), y.min(p.y))
        });
    if !min_x.is_finite() {
        return Ok(PointSet::new());
    }
    let origin_x = (min_x - side).floor();
    let origin_y = (min_y - side).floor();

    let mut cells: BTreeMap<Cell, Vec<&Point>> = BTreeMap::new();
    for p in grid.iter() {
        let cell = Cell {
            col: ((p.x - origin_x) / side).floor() as i64,
            row: ((p.y - origin_y) / side).floor() as i64,
        };
        cells.entry(cell).or_default().push(p);
    }

    let mut coarse = PointSet::new();
    for (cell, members) in cells {
        let cx = origin_x + (cell.col as f64 + 0.5) * side;
        let cy = origin_y + (cell.row as f64 + 0.5) * side;
        let centre = Point::new(0, cx, cy);
        let Some(representative) = members
            .iter()
            .filter(|p| p.cluster.is_some())
            .min_by(|a, b| a.distance_2d(&centre).total_cmp(&b.distance_2d(&centre)))
        else {
            continue;
        };
        let n = members.len() as f64;
        let mut point = Point::new(representative.id.value(), cx, cy)
            .with_population(members.iter().map(|p| p.population).sum())
            .with_elevation(members.iter().map(|p| p.elevation).sum::<f64>() / n)
            .with_weight(members.iter().map(|p| p.weight).sum::<f64>() / n);
        point.cluster = representative.cluster;
        coarse.push(point);
    }
    debug!(side, cells = coarse.len(), "coarse grid built");
    Ok(coarse)
}

/// Route the main branch of `cluster` over its own points.
///
/// Terminals are the coarse cells of the cluster with at least
/// `branch_population_threshold` inhabitants, mapped onto their grid point.
/// Fewer than two terminals means no branch is needed.
pub fn main_branch(
    ctx: &RoutingContext<'_>,
    config: &RoutingConfig,
    coarse: &PointSet,
    cluster_points: &PointSet,
) -> LvResult<Option<(Topology, Route)>> {
    let ids: Vec<PointId> = coarse
        .iter()
        .filter(|p| p.population >= config.branch_population_threshold)
        .map(|p| p.id)
        .collect();
    let terminals = cluster_points.select(&ids);
    if terminals.len() <= 1 {
        return Ok(None);
    }

    let ctx = ctx.with_grid(cluster_points);
    // the trunk is sized against three mesh spacings
    if steiner_feasible(terminals.len(), cluster_points.len(), 3.0 * ctx.resolution) {
        Ok(Some((Topology::Steiner, steiner(&ctx, &terminals, &[])?)))
    } else {
        info!(terminals = terminals.len(), "cluster too big to use Steiner, running Spider");
        Ok(Some((Topology::Spider, spider(&ctx, &terminals, &[])?)))
    }
}

/// Route the collateral network of a cluster around an existing `branch`.
pub fn collateral(
    ctx: &RoutingContext<'_>,
    config: &RoutingConfig,
    cluster_points: &PointSet,
    branch: &[(PointId, PointId)],
) -> LvResult<(Topology, Route)> {
    let terminals = cluster_points.filter(|p| p.population >= config.population_threshold);
    let ctx = ctx.with_line_base_cost(config.collateral_cost());
    if terminals.is_empty() {
        return Ok((Topology::Steiner, Route::empty()));
    }
    if steiner_feasible(terminals.len(), cluster_points.len(), ctx.resolution) {
        Ok((Topology::Steiner, steiner(&ctx, &terminals, branch)?))
    } else {
        info!(terminals = terminals.len(), "cluster too big to use Steiner, running Spider");
        let ctx = ctx.with_grid(cluster_points);
        Ok((Topology::Spider, spider(&ctx, &terminals, branch)?))
    }
}

/// Split collateral lines into connected components and size each one.
///
/// Lines on `branch` pairs are dropped. Each remaining line gets the 1-based
/// index of its component and that component's power: the truncated
/// population of its grid points times `load_per_capita_kw`.
pub fn collateral_sizing(
    grid: &PointSet,
    lines: Vec<Line>,
    branch: &[(PointId, PointId)],
    load_per_capita_kw: f64,
) -> Vec<Line> {
    let frozen: HashSet<(PointId, PointId)> =
        branch.iter().map(|&(a, b)| (a.min(b), a.max(b))).collect();
    let lines: Vec<Line> = lines
        .into_iter()
        .filter(|l| !frozen.contains(&l.key()))
        .collect();
    let pairs: Vec<(PointId, PointId)> = lines.iter().map(|l| (l.id1, l.id2)).collect();

    let mut sizing: HashMap<PointId, (u32, f64)> = HashMap::new();
    for (index, component) in connected_components(&pairs).iter().enumerate() {
        let population: f64 = component
            .iter()
            .filter_map(|id| grid.get(*id))
            .map(|p| p.population)
            .sum();
        let power = population.trunc() * load_per_capita_kw;
        for id in component {
            sizing.insert(*id, (index as u32 + 1, power));
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            if let Some(&(component, power)) = sizing.get(&line.id1) {
                line.component = Some(component);
                line.power_kw = Some(power);
            }
            line
        })
        .collect()
}

/// Route one cluster in branch mode.
pub fn branch_routing(
    ctx: &RoutingContext<'_>,
    config: &RoutingConfig,
    coarse: &PointSet,
    cluster: &ClusterInfo,
) -> LvResult<BranchNetworks> {
    let cluster_points = ctx.grid.cluster(cluster.id);
    let coarse_points = coarse.cluster(cluster.id);

    let (branch_topology, branch) = match main_branch(ctx, config, &coarse_points, &cluster_points)? {
        Some((topology, route)) => (Some(topology), route),
        None => {
            info!(cluster = %cluster.id, "main branch not necessary");
            (None, Route::empty())
        }
    };
    let branch_pairs = branch.network.pairs();

    let (collateral_topology, routed) = collateral(ctx, config, &cluster_points, &branch_pairs)?;
    let lines = if branch_topology.is_none() {
        routed
            .network
            .lines
            .into_iter()
            .map(|mut line| {
                line.component = Some(1);
                line.power_kw = Some(cluster.load_kw);
                line
            })
            .collect()
    } else {
        collateral_sizing(
            ctx.grid,
            routed.network.lines,
            &branch_pairs,
            config.load_per_capita_kw,
        )
    };

    Ok(BranchNetworks {
        branch_topology,
        branch,
        collateral_topology,
        collateral: Route::from_lines(lines),
    })
}
