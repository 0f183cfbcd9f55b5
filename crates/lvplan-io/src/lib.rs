//! # lvplan-io: Tabular Boundary of the Planning Toolkit
//!
//! Reads the planning inputs from CSV and TOML and writes routed networks and
//! optimization results back out. Nothing past this crate touches a file.
//!
//! ## Inputs
//!
//! | Table | Columns |
//! |-------|---------|
//! | Point grid | `ID, X, Y, Elevation, Population, Weight, Cluster` (`-1` = unclustered) |
//! | Cluster roster | `Cluster, Population, Load [kW]` |
//! | Substations | `ID, X, Y, PowerAvailable, Type, Cost [keur], Exist` |
//! | Roads | `road_id, X, Y`, one row per vertex |
//! | Microgrids | `Cluster, Total Cost [k€], Energy Produced [MWh]` |
//!
//! ## Outputs
//!
//! - Line CSV: one row per line with cluster, role and WKT geometry
//! - `grid_resume` CSV: per-cluster lengths, costs and connection
//! - Optimization JSON: microgrids, active substations, selected links
//!
//! ## Example
//!
//! ```rust,no_run
//! use lvplan_io::{load_config, read_clusters, read_points};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = load_config(Path::new("planning.toml"))?;
//!     let grid = read_points(Path::new("points.csv"))?;
//!     let roster = read_clusters(Path::new("clusters.csv"))?;
//!     println!("{} points, {} clusters at {} m", grid.len(), roster.len(), config.routing.resolution);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod exporters;
pub mod importers;

pub use config::{load_config, parse_config};
pub use exporters::{collect_lines, write_grid_resume, write_lines, write_milp_results, LineRecord};
pub use importers::{
    read_clusters, read_microgrids, read_points, read_roads, read_substations, unknown_clusters,
    SchemaError,
};
