//! NPC MILP solver

use super::{NpcNode, NpcProblem, NpcSolution, SelectedLink};
#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as milp_solver;
#[cfg(not(feature = "solver-highs"))]
use good_lp::solvers::microlp::microlp as milp_solver;
use good_lp::{
    constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel, Variable,
};
use lvplan_core::{ClusterId, LvError};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};
use web_time::Instant;

/// NPC optimization errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NpcError {
    #[error("no cluster to optimize")]
    NoClusters,

    #[error("unknown node {0}")]
    UnknownNode(String),

    #[error("no microgrid cost for cluster {0}")]
    MissingMicrogrid(ClusterId),

    #[error("candidate link {from}-{to} joins two substations")]
    SubstationLink { from: String, to: String },

    #[error("solver failed: {0}")]
    SolverFailed(String),

    #[error("problem is infeasible")]
    Infeasible,

    #[error("problem is unbounded")]
    Unbounded,

    #[error("selected links are not radial ({remaining} links left without a leaf)")]
    NonRadial { remaining: usize },

    #[error("selected link {from}-{to} is not a candidate")]
    MissingLink { from: String, to: String },
}

impl From<NpcError> for LvError {
    fn from(err: NpcError) -> Self {
        LvError::Solver(err.to_string())
    }
}

impl From<ResolutionError> for NpcError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::Infeasible => NpcError::Infeasible,
            ResolutionError::Unbounded => NpcError::Unbounded,
            other => NpcError::SolverFailed(other.to_string()),
        }
    }
}

/// Solve the NPC problem.
///
/// Binary decisions are rounded to the nearest integer after the solve.
///
/// # Example
///
/// ```no_run
/// use lvplan_algo::npc::{solve_npc, NpcCluster, NpcProblemBuilder};
/// use lvplan_core::ClusterId;
///
/// let problem = NpcProblemBuilder::new()
///     .cluster(NpcCluster {
///         id: ClusterId::new(1),
///         load_kw: 20.0,
///         microgrid_npc_keur: 150.0,
///         energy_mwh: 400.0,
///     })
///     .build()?;
/// let solution = solve_npc(&problem)?;
/// println!("{}", solution.summary());
/// # Ok::<(), lvplan_algo::npc::NpcError>(())
/// ```
pub fn solve_npc(problem: &NpcProblem) -> Result<NpcSolution, NpcError> {
    let start = Instant::now();
    if problem.clusters.is_empty() {
        return Err(NpcError::NoClusters);
    }
    let pmax = problem.max_line_power_kw;
    let coe = problem.cost_of_electricity;

    // === Variables ===
    // x[l]: link built, P[l]: link flow (kW)
    // y[s]: substation active, ps[s]: substation output (kW)
    // z[c]: cluster runs a microgrid
    let mut vars = variables!();

    let mut objective = Expression::from(0.0);
    let mut cluster_vars: Vec<Variable> = Vec::with_capacity(problem.clusters.len());
    for cluster in &problem.clusters {
        let z = vars.add(variable().binary());
        // coe·E·(1 - z) = coe·E - coe·E·z
        objective += coe * cluster.energy_mwh;
        objective += (cluster.microgrid_npc_keur - coe * cluster.energy_mwh) * z;
        cluster_vars.push(z);
    }

    let mut substation_vars: Vec<(Variable, Variable)> = Vec::with_capacity(problem.substations.len());
    for substation in &problem.substations {
        let y = vars.add(variable().binary());
        let ps = vars.add(variable().min(0.0));
        objective += substation.cost_keur * y;
        substation_vars.push((y, ps));
    }

    let mut link_vars: Vec<(Variable, Variable)> = Vec::with_capacity(problem.links.len());
    for link in &problem.links {
        let x = vars.add(variable().binary());
        let p = vars.add(variable().min(-pmax).max(pmax));
        objective += link.npc_keur * x;
        link_vars.push((x, p));
    }

    debug!(
        clusters = problem.clusters.len(),
        substations = problem.substations.len(),
        links = problem.links.len(),
        "NPC model built"
    );
    let mut model = vars.minimise(objective).using(milp_solver);

    // === Radiality ===
    let mut built = Expression::from(0.0);
    for (x, _) in &link_vars {
        built += *x;
    }
    for z in &cluster_vars {
        built += *z;
    }
    model = model.with(constraint!(built == problem.clusters.len() as f64));

    // === Flow balance: inflow - outflow per node ===
    let mut balance: HashMap<NpcNode, Expression> = HashMap::new();
    for (link, (_, p)) in problem.links.iter().zip(&link_vars) {
        *balance.entry(link.to).or_insert_with(|| Expression::from(0.0)) += *p;
        *balance.entry(link.from).or_insert_with(|| Expression::from(0.0)) -= *p;
    }
    for (cluster, z) in problem.clusters.iter().zip(&cluster_vars) {
        let net = balance
            .remove(&NpcNode::Cluster(cluster.id))
            .unwrap_or_else(|| Expression::from(0.0));
        // net = p·(1 - z)
        model = model.with(constraint!(net + cluster.load_kw * *z == cluster.load_kw));
    }
    for (substation, (y, ps)) in problem.substations.iter().zip(&substation_vars) {
        let net = balance
            .remove(&NpcNode::Substation(substation.id))
            .unwrap_or_else(|| Expression::from(0.0));
        model = model.with(constraint!(net + *ps == 0.0));
        model = model.with(constraint!(*ps <= substation.capacity_kw * *y));
    }

    // === Link capacity, gated by construction ===
    for (x, p) in &link_vars {
        model = model.with(constraint!(*p <= pmax * *x));
        model = model.with(constraint!(*p >= -pmax * *x));
    }

    // === Solve ===
    let solution = model.solve()?;

    // === Extract Results ===
    let mut result = NpcSolution::new();
    for (cluster, z) in problem.clusters.iter().zip(&cluster_vars) {
        if solution.value(*z).round() as i64 == 1 {
            result.microgrids.push(cluster.id);
            result.microgrid_cost_keur += cluster.microgrid_npc_keur;
        } else {
            result.energy_cost_keur += coe * cluster.energy_mwh;
        }
    }
    for (substation, (y, ps)) in problem.substations.iter().zip(&substation_vars) {
        if solution.value(*y).round() as i64 == 1 {
            result
                .active_substations
                .push((substation.id, solution.value(*ps)));
            result.substation_cost_keur += substation.cost_keur;
        }
    }
    for (link, (x, p)) in problem.links.iter().zip(&link_vars) {
        if solution.value(*x).round() as i64 == 1 {
            result.links.push(SelectedLink {
                from: link.from,
                to: link.to,
                power_kw: solution.value(*p),
                npc_keur: link.npc_keur,
            });
            result.link_cost_keur += link.npc_keur;
        }
    }
    result.total_cost_keur = result.microgrid_cost_keur
        + result.substation_cost_keur
        + result.link_cost_keur
        + result.energy_cost_keur;
    result.solve_time_ms = start.elapsed().as_millis() as u64;

    info!(
        microgrids = result.microgrids.len(),
        links = result.links.len(),
        total_keur = result.total_cost_keur,
        elapsed_ms = result.solve_time_ms,
        "NPC optimization solved"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npc::{CandidateLink, NpcCluster, NpcProblemBuilder, NpcSubstation};
    use crate::routing::Route;
    use lvplan_core::{SubstationId, SubstationKind};

    fn cluster(id: u32, load_kw: f64, microgrid_npc_keur: f64) -> NpcCluster {
        NpcCluster {
            id: ClusterId::new(id),
            load_kw,
            microgrid_npc_keur,
            energy_mwh: 100.0,
        }
    }

    fn substation(id: u64, capacity_kw: f64) -> NpcSubstation {
        NpcSubstation {
            id: SubstationId::new(id),
            kind: SubstationKind::Mv,
            capacity_kw,
            cost_keur: 10.0,
        }
    }

    fn link(from: NpcNode, to: NpcNode, npc_keur: f64) -> CandidateLink {
        CandidateLink {
            from,
            to,
            route: Route::empty(),
            npc_keur,
        }
    }

    fn c(id: u32) -> NpcNode {
        NpcNode::Cluster(ClusterId::new(id))
    }

    fn s(id: u64) -> NpcNode {
        NpcNode::Substation(SubstationId::new(id))
    }

    #[test]
    fn lone_cluster_falls_back_to_microgrid() {
        let problem = NpcProblemBuilder::new()
            .cluster(cluster(1, 50.0, 200.0))
            .build()
            .unwrap();
        let solution = solve_npc(&problem).unwrap();
        assert_eq!(solution.microgrids, vec![ClusterId::new(1)]);
        assert!(solution.links.is_empty());
        assert!((solution.total_cost_keur - 200.0).abs() < 1e-6);
    }

    #[test]
    fn cheap_chain_connects_both_clusters() {
        // S1 - C1 - C2, grid far cheaper than microgrids
        let problem = NpcProblemBuilder::new()
            .cluster(cluster(1, 50.0, 500.0))
            .cluster(cluster(2, 30.0, 500.0))
            .substation(substation(1, 1000.0))
            .link(link(c(1), c(2), 5.0))
            .link(link(c(1), s(1), 5.0))
            .link(link(c(2), s(1), 50.0))
            .cost_of_electricity(0.1)
            .build()
            .unwrap();
        let solution = solve_npc(&problem).unwrap();

        assert!(solution.microgrids.is_empty());
        assert_eq!(solution.links.len(), 2);
        assert_eq!(solution.links.len(), problem.clusters.len() - solution.microgrids.len());
        assert!(solution.links.iter().all(|l| l.npc_keur == 5.0));
        // 10 substation + 2 * 5 links + 200 * 0.1 energy
        assert!((solution.total_cost_keur - 40.0).abs() < 1e-6);
        let (_, output) = solution.active_substations[0];
        assert!((output - 80.0).abs() < 1e-6);
    }

    #[test]
    fn substation_capacity_forces_a_microgrid() {
        let problem = NpcProblemBuilder::new()
            .cluster(cluster(1, 50.0, 500.0))
            .cluster(cluster(2, 30.0, 300.0))
            .substation(substation(1, 60.0))
            .link(link(c(1), s(1), 5.0))
            .link(link(c(2), s(1), 5.0))
            .build()
            .unwrap();
        let solution = solve_npc(&problem).unwrap();
        assert_eq!(solution.microgrids, vec![ClusterId::new(2)]);
        assert_eq!(solution.links.len(), 1);
    }

    #[test]
    fn line_power_limit_is_respected() {
        let problem = NpcProblemBuilder::new()
            .cluster(cluster(1, 50.0, 500.0))
            .substation(substation(1, 1000.0))
            .link(link(c(1), s(1), 5.0))
            .max_line_power_kw(40.0)
            .build()
            .unwrap();
        let solution = solve_npc(&problem).unwrap();
        assert_eq!(solution.microgrids, vec![ClusterId::new(1)]);
    }

    #[test]
    fn radiality_holds_on_a_mesh() {
        let problem = NpcProblemBuilder::new()
            .cluster(cluster(1, 10.0, 100.0))
            .cluster(cluster(2, 10.0, 100.0))
            .cluster(cluster(3, 10.0, 100.0))
            .substation(substation(1, 1000.0))
            .substation(substation(2, 1000.0))
            .link(link(c(1), c(2), 1.0))
            .link(link(c(2), c(3), 1.0))
            .link(link(c(1), c(3), 1.0))
            .link(link(c(1), s(1), 2.0))
            .link(link(c(3), s(2), 2.0))
            .build()
            .unwrap();
        let solution = solve_npc(&problem).unwrap();
        assert_eq!(
            solution.links.len(),
            problem.clusters.len() - solution.microgrids.len()
        );
    }
}
