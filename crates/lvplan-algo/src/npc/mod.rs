//! Net-present-cost network optimization
//!
//! Decides, for every cluster, between a stand-alone microgrid and a grid
//! connection, and which substations to activate, with a Mixed-Integer
//! Linear Program over the candidate links produced by the router.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NPC NETWORK OPTIMIZATION                                                │
//! │  ────────────────────────                                                │
//! │                                                                          │
//! │  Given:                                                                  │
//! │    • Clusters with peak load, microgrid NPC and lifetime energy         │
//! │    • Substations with capacity and cost                                 │
//! │    • Candidate links (cluster-cluster, cluster-substation) with NPC     │
//! │                                                                          │
//! │  Decide:                                                                 │
//! │    • Which links to build                       x_l ∈ {0,1}             │
//! │    • Which substations to activate              y_s ∈ {0,1}             │
//! │    • Which clusters run a microgrid             z_c ∈ {0,1}             │
//! │    • Power on every link and out of substations (continuous)            │
//! │                                                                          │
//! │  Minimize:                                                               │
//! │    Σ npc_c·z_c + Σ cost_s·y_s + Σ npc_l·x_l + coe·Σ E_c·(1 - z_c)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## MILP Formulation
//!
//! ```text
//! Σ_l x_l = |C| - Σ_c z_c                          Radiality
//! Σ_in P - Σ_out P = p_c · (1 - z_c)    ∀ c ∈ C    Cluster balance
//! Σ_in P - Σ_out P = -ps_s              ∀ s ∈ S    Substation injection
//! -Pmax · x_l ≤ P_l ≤ Pmax · x_l        ∀ l        Link capacity (gated)
//! 0 ≤ ps_s ≤ cap_s · y_s                ∀ s ∈ S    Substation capacity (gated)
//! ```
//!
//! Links are directed from the first to the second node of each candidate
//! pair; a negative flow runs the other way. Costs are in k€, energy in MWh
//! and the cost of electricity in €/kWh, so `coe · E` is already in k€.
//!
//! The selected links form an unordered forest. [`linearize`] peels it from
//! the leaves into one `cluster → cluster | substation` assignment per
//! grid-connected cluster, and [`apply_to_resume`] writes the outcome into
//! the `grid_resume` table.
//!
//! ## Solvers
//!
//! The pure-Rust `microlp` branch-and-bound solver is used by default; the
//! `solver-highs` feature switches to HiGHS.

mod assign;
mod candidates;
mod problem;
mod solution;
mod solver;

pub use assign::{apply_to_resume, linearize, Assignment};
pub use candidates::{candidate_links, link_npc};
pub use problem::{
    CandidateLink, MicrogridCost, NpcCluster, NpcNode, NpcProblem, NpcProblemBuilder,
    NpcSubstation,
};
pub use solution::{NpcSolution, SelectedLink};
pub use solver::{solve_npc, NpcError};
