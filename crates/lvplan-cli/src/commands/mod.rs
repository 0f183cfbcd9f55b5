pub mod plan;
pub mod route;
pub mod validate;

use anyhow::{Context, Result};
use lvplan_algo::{splice_roads, RoadGraph};
use lvplan_cli::InputArgs;
use lvplan_core::{ClusterInfo, PlanningConfig, PointSet};
use lvplan_io::{load_config, read_clusters, read_points, read_roads, unknown_clusters};
use tracing::{info, warn};

/// Everything the routing commands read before running.
pub struct LoadedInputs {
    pub config: PlanningConfig,
    pub grid: PointSet,
    pub clusters: Vec<ClusterInfo>,
    pub roads: Option<RoadGraph>,
}

impl LoadedInputs {
    pub fn load(args: &InputArgs) -> Result<Self> {
        let mut config = load_config(&args.config)?;
        if let Some(threads) = args.threads {
            config.routing.threads = threads;
        }
        let grid = read_points(&args.points)?;
        let clusters = read_clusters(&args.clusters)?;
        let stray = unknown_clusters(&grid, &clusters);
        if !stray.is_empty() {
            warn!(
                points = stray.len(),
                "points labelled with clusters missing from the roster are ignored"
            );
        }

        let roads = match (&args.roads, config.routing.use_roads) {
            (Some(path), true) => {
                let polylines = read_roads(path)?;
                let roads = splice_roads(&polylines, &grid);
                info!(
                    vertices = roads.points.len(),
                    segments = roads.segments.len(),
                    "roads spliced"
                );
                Some(roads)
            }
            (Some(_), false) => {
                info!("use_roads is off, road file ignored");
                None
            }
            (None, _) => None,
        };

        std::fs::create_dir_all(&args.out)
            .with_context(|| format!("creating output directory {}", args.out.display()))?;
        Ok(Self {
            config,
            grid,
            clusters,
            roads,
        })
    }
}
