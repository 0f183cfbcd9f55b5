//! # lvplan-algo: Low-Voltage Grid Routing and Connection Planning
//!
//! Routes a low-voltage distribution grid inside every settlement cluster of a
//! point grid, connects clusters to substations, and chooses between grid
//! extension and stand-alone microgrids by minimizing net present cost.
//!
//! ## Routing
//!
//! | Routine | Use | Result |
//! |---------|-----|--------|
//! | [`steiner()`] | Small clusters | Approximate Steiner tree over a bounding-box graph |
//! | [`spider()`] | Large clusters | MST of the terminals, each edge replaced by a shortest path |
//! | [`dijkstra_connection`] | Point-to-point | Cheapest path reusing existing lines |
//!
//! [`cluster_grid`] picks Steiner or Spider from the cluster size. Every
//! routine works on a [`RoutingContext`]: the grid, the optional road graph,
//! the mesh resolution and the line base cost.
//!
//! ## Orchestration
//!
//! - [`route_clusters`]: all clusters in parallel, flat or branch mode
//! - [`branch_routing`]: main branch on a downsampled grid plus collateral networks
//! - [`substation_assignment`] / [`substation_connection`]: nearest feasible substation
//! - [`full_electrification`]: links for population outside any cluster
//!
//! ## NPC Optimization
//!
//! The [`npc`] module routes candidate links between clusters and substations
//! and solves a MILP choosing, per cluster, a microgrid or a radial grid
//! connection. See the module documentation for the formulation.
//!
//! ## Example
//!
//! ```ignore
//! use lvplan_algo::{route_clusters, PlanningInputs};
//!
//! let inputs = PlanningInputs { grid: &grid, clusters: &roster, roads: None, substations: &subs };
//! let routing = route_clusters(&inputs, &config.routing)?;
//! for row in routing.resume.rows() {
//!     println!("{}: {:.2} km", row.cluster, row.grid_length_km);
//! }
//! ```

pub mod branches;
pub mod connector;
pub mod graph;
pub mod grid;
pub mod links;
pub mod npc;
pub mod planner;
pub mod roads;
pub mod routing;
pub mod spider;
pub mod steiner;
pub mod substations;

pub use branches::{branch_routing, downsample, low_resolution, BranchNetworks};
pub use connector::dijkstra_connection;
pub use graph::{GraphAlgorithms, PetgraphAlgorithms, WeightedGraph};
pub use grid::{cluster_grid, steiner_feasible, Topology, STEINER_MAX_CLUSTER_POINTS};
pub use links::full_electrification;
pub use npc::{
    apply_to_resume, candidate_links, linearize, solve_npc, CandidateLink, MicrogridCost,
    NpcError, NpcProblem, NpcProblemBuilder, NpcSolution,
};
pub use planner::{route_clusters, ClusterNetworks, GridRouting, PlanningInputs};
pub use roads::{splice_roads, RoadGraph, RoadSegment};
pub use routing::{Route, RoutingContext};
pub use spider::spider;
pub use steiner::steiner;
pub use substations::{
    substation_assignment, substation_connection, AssignedSubstation, SubstationConnection,
    CANDIDATE_SUBSTATIONS,
};
