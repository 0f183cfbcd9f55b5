//! Routing pass over every cluster.
//!
//! Clusters are independent: each one is routed on a rayon worker with its
//! own bounding boxes and matrices, reading the shared grid and road graph.
//! Results come back to the calling thread, which writes exactly one
//! `grid_resume` row per cluster. A cluster whose routing fails keeps a row
//! with its error message; the others complete normally.

use crate::branches::{branch_routing, downsample};
use crate::grid::{cluster_grid, Topology};
use crate::links::full_electrification;
use crate::roads::RoadGraph;
use crate::routing::{Route, RoutingContext};
use crate::substations::{substation_assignment, substation_connection, SubstationConnection};
use lvplan_core::{
    ClusterId, ClusterInfo, ConnectionType, GridResume, GridResumeRow, LvError, LvResult,
    Network, NetworkSummary, PointSet, RoutingConfig, RoutingMode, Substation, SubstationKind,
};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::BTreeMap;
use tracing::{info, warn};
use web_time::Instant;

/// Everything a routing pass reads.
#[derive(Debug, Clone, Copy)]
pub struct PlanningInputs<'a> {
    pub grid: &'a PointSet,
    pub clusters: &'a [ClusterInfo],
    pub roads: Option<&'a RoadGraph>,
    /// Substations to connect flat-mode clusters to; may be empty.
    pub substations: &'a [Substation],
}

/// Networks routed for one cluster.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterNetworks {
    /// Builder of the flat grid, or of the collateral in branch mode.
    pub topology: Option<Topology>,
    /// Flat-mode grid.
    pub grid: Route,
    pub branch: Route,
    pub collateral: Route,
    pub connection: Option<SubstationConnection>,
}

impl ClusterNetworks {
    /// All lines inside the cluster: the flat grid, or branch plus collateral.
    pub fn backbone(&self) -> Network {
        let mut network = self.grid.network.clone();
        network.extend(self.branch.network.clone());
        network.extend(self.collateral.network.clone());
        network
    }

    fn is_branch_mode(&self) -> bool {
        !self.branch.network.is_empty() || !self.collateral.network.is_empty()
    }
}

/// Output of a routing pass.
#[derive(Debug, Clone, Default)]
pub struct GridRouting {
    pub resume: GridResume,
    /// Networks of every cluster routed without error.
    pub networks: BTreeMap<ClusterId, ClusterNetworks>,
    /// Full-electrification links, empty unless enabled.
    pub links: Route,
}

/// Route every cluster of `inputs` according to `config`.
pub fn route_clusters(inputs: &PlanningInputs<'_>, config: &RoutingConfig) -> LvResult<GridRouting> {
    let start = Instant::now();
    let ctx = RoutingContext::from_config(inputs.grid, inputs.roads, config);
    let coarse = match config.mode {
        RoutingMode::Branches => downsample(inputs.grid, inputs.clusters, config.resolution)?,
        RoutingMode::Flat => PointSet::new(),
    };

    let thread_count = if config.threads == 0 {
        num_cpus::get()
    } else {
        config.threads
    };
    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .map_err(|e| LvError::Other(format!("building Rayon thread pool for routing: {e}")))?;

    let total = inputs.clusters.len();
    let results: Vec<(usize, LvResult<ClusterNetworks>)> = pool.install(|| {
        inputs
            .clusters
            .par_iter()
            .enumerate()
            .map(|(i, cluster)| {
                info!(
                    cluster = %cluster.id,
                    "routing cluster {} of {}",
                    i + 1,
                    total
                );
                let routed = match config.mode {
                    RoutingMode::Flat => route_flat(&ctx, config, inputs.substations, cluster),
                    RoutingMode::Branches => branch_routing(&ctx, config, &coarse, cluster)
                        .map(|b| ClusterNetworks {
                            topology: Some(b.collateral_topology),
                            grid: Route::empty(),
                            branch: b.branch,
                            collateral: b.collateral,
                            connection: None,
                        }),
                };
                (i, routed)
            })
            .collect()
    });

    let mut routing = GridRouting::default();
    for (i, result) in results {
        let cluster = &inputs.clusters[i];
        let mut row = GridResumeRow::new(cluster.id, cluster.population, cluster.load_kw);
        match result {
            Ok(networks) => {
                fill_row(&mut row, &networks);
                routing.networks.insert(cluster.id, networks);
            }
            Err(e) => {
                warn!(cluster = %cluster.id, error = %e, "cluster routing failed");
                row.error = Some(e.to_string());
            }
        }
        routing.resume.upsert(row);
    }

    if config.full_electrification {
        let backbones: Vec<Network> = routing.networks.values().map(|n| n.backbone()).collect();
        let refs: Vec<&Network> = backbones.iter().collect();
        routing.links = full_electrification(&ctx, &refs, config.population_threshold)?;
        info!(
            lines = routing.links.network.len(),
            length_km = routing.links.summary.length_km(),
            "full electrification links built"
        );
    }

    info!(
        clusters = total,
        failed = routing.resume.failed().count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "routing pass finished"
    );
    Ok(routing)
}

/// Route one cluster as a single network and connect it to a substation.
fn route_flat(
    ctx: &RoutingContext<'_>,
    config: &RoutingConfig,
    substations: &[Substation],
    cluster: &ClusterInfo,
) -> LvResult<ClusterNetworks> {
    let cluster_points = ctx.grid.cluster(cluster.id);
    let terminals = cluster_points.filter(|p| p.population >= config.population_threshold);
    if terminals.is_empty() {
        info!(cluster = %cluster.id, "no point to electrify");
        return Ok(ClusterNetworks::default());
    }

    let (topology, grid) = cluster_grid(ctx, &terminals, cluster_points.len())?;
    let mut networks = ClusterNetworks {
        topology: Some(topology),
        grid,
        ..ClusterNetworks::default()
    };

    if !substations.is_empty() {
        let network_points = if networks.grid.network.is_empty() {
            terminals
        } else {
            ctx.grid.select(&networks.grid.network.point_ids())
        };
        let assigned =
            substation_assignment(ctx.grid, &network_points, substations, cluster.load_kw);
        networks.connection = substation_connection(
            ctx,
            &assigned,
            &networks.grid.network.pairs(),
            config.substation_cost_hv,
            config.substation_cost_mv,
        )?;
    }
    Ok(networks)
}

fn fill_row(row: &mut GridResumeRow, networks: &ClusterNetworks) {
    if networks.is_branch_mode() {
        row.set_branch_and_collateral(networks.branch.summary, networks.collateral.summary);
    } else {
        row.set_grid(networks.grid.summary);
    }
    if let Some(connection) = &networks.connection {
        row.set_connection(NetworkSummary {
            cost: connection.cost.trunc() as u64,
            length: connection.route.summary.length,
        });
        row.connection_type = match connection.kind {
            SubstationKind::Hv => ConnectionType::Hv,
            SubstationKind::Mv => ConnectionType::Mv,
        };
        row.connection_id = Some(connection.substation.value());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lvplan_core::{Point, SubstationId};

    /// Two 3x3 clusters 1 km apart, 100 m mesh, joined by an unclustered row.
    fn two_clusters() -> PointSet {
        let mut points = Vec::new();
        let mut id = 1;
        for (cluster, x0) in [(1, 0.0), (2, 1200.0)] {
            for i in 0..3 {
                for j in 0..3 {
                    points.push(
                        Point::new(id, x0 + i as f64 * 100.0, j as f64 * 100.0)
                            .with_population(3.0)
                            .with_cluster(ClusterId::new(cluster)),
                    );
                    id += 1;
                }
            }
        }
        for k in 0..9 {
            points.push(Point::new(id, 300.0 + k as f64 * 100.0, 0.0));
            id += 1;
        }
        points.into_iter().collect()
    }

    fn roster() -> Vec<ClusterInfo> {
        [1, 2]
            .into_iter()
            .map(|c| ClusterInfo {
                id: ClusterId::new(c),
                population: 27.0,
                load_kw: 10.0,
            })
            .collect()
    }

    #[test]
    fn flat_pass_fills_one_row_per_cluster() {
        let grid = two_clusters();
        let clusters = roster();
        let inputs = PlanningInputs {
            grid: &grid,
            clusters: &clusters,
            roads: None,
            substations: &[],
        };
        let mut config = RoutingConfig::new(100.0, 1000.0);
        config.threads = 2;
        let routing = route_clusters(&inputs, &config).unwrap();

        assert_eq!(routing.resume.len(), 2);
        assert_eq!(routing.networks.len(), 2);
        for row in routing.resume.rows() {
            assert_eq!(row.grid_length_km, 0.8);
            assert_eq!(row.grid_cost_keur, 0.8);
            assert!(row.error.is_none());
        }
    }

    #[test]
    fn flat_pass_connects_substation() {
        let grid = two_clusters();
        let clusters = roster();
        let substations = vec![Substation {
            id: SubstationId::new(9),
            x: 700.0,
            y: 0.0,
            power_available_kw: 1000.0,
            kind: SubstationKind::Hv,
            cost_keur: 100.0,
            exists: true,
        }];
        let inputs = PlanningInputs {
            grid: &grid,
            clusters: &clusters,
            roads: None,
            substations: &substations,
        };
        let config = RoutingConfig::new(100.0, 1000.0);
        let routing = route_clusters(&inputs, &config).unwrap();

        let row = routing.resume.get(ClusterId::new(1)).unwrap();
        assert_eq!(row.connection_type, ConnectionType::Hv);
        assert_eq!(row.substation_id(), Some(SubstationId::new(9)));
        // from x=200 to the substation at x=700 along the unclustered row
        assert_eq!(row.connection_length_km, 0.5);
    }

    #[test]
    fn empty_cluster_records_zeros() {
        let grid = two_clusters();
        let mut clusters = roster();
        clusters.push(ClusterInfo {
            id: ClusterId::new(3),
            population: 0.0,
            load_kw: 0.0,
        });
        let inputs = PlanningInputs {
            grid: &grid,
            clusters: &clusters,
            roads: None,
            substations: &[],
        };
        let config = RoutingConfig::new(100.0, 1000.0);
        let routing = route_clusters(&inputs, &config).unwrap();

        let row = routing.resume.get(ClusterId::new(3)).unwrap();
        assert_eq!(row.grid_length_km, 0.0);
        assert_eq!(row.grid_cost_keur, 0.0);
        assert!(row.error.is_none());
        assert!(routing.networks[&ClusterId::new(3)].backbone().is_empty());
    }

    #[test]
    fn full_electrification_links_outside_points() {
        let mut points: Vec<Point> = two_clusters().iter().cloned().collect();
        for p in points.iter_mut().filter(|p| p.cluster.is_none()) {
            p.population = 1.0;
        }
        let grid: PointSet = points.into_iter().collect();
        let clusters = roster();
        let inputs = PlanningInputs {
            grid: &grid,
            clusters: &clusters,
            roads: None,
            substations: &[],
        };
        let mut config = RoutingConfig::new(100.0, 1000.0);
        config.full_electrification = true;
        let routing = route_clusters(&inputs, &config).unwrap();
        // each row point hangs off its nearest cluster; the 700-800 gap stays open
        assert_eq!(routing.links.summary.length, 900);
        assert_eq!(routing.links.network.len(), 9);
    }

    #[test]
    fn branch_pass_fills_branch_columns() {
        let grid = two_clusters();
        let clusters = roster();
        let inputs = PlanningInputs {
            grid: &grid,
            clusters: &clusters,
            roads: None,
            substations: &[],
        };
        let mut config = RoutingConfig::new(100.0, 1000.0);
        config.mode = RoutingMode::Branches;
        config.branch_population_threshold = 1000.0;
        let routing = route_clusters(&inputs, &config).unwrap();

        for row in routing.resume.rows() {
            assert_eq!(row.branch_length_km, 0.0);
            assert_eq!(row.collateral_length_km, 0.8);
            assert_eq!(row.grid_length_km, 0.8);
        }
    }
}
