//! Turn the selected links into per-cluster connections.

use super::{NpcError, NpcNode, NpcProblem, NpcSolution, SelectedLink};
use crate::routing::Route;
use lvplan_core::{ClusterId, ConnectionType, GridResume, NetworkSummary, SubstationKind};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A cluster and the node that supplies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub cluster: ClusterId,
    pub target: NpcNode,
}

/// Peel the selected links from the leaves.
///
/// A leaf is a cluster appearing in exactly one remaining link; it is
/// assigned to the other end of that link, which is then removed. Leaves
/// are searched among the first endpoints of the remaining links, then the
/// second ones. Remaining links without any leaf mean a cycle.
pub fn linearize(links: &[SelectedLink]) -> Result<Vec<Assignment>, NpcError> {
    let mut remaining: Vec<(NpcNode, NpcNode)> = links.iter().map(|l| (l.from, l.to)).collect();
    let mut assignments = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let mut counts: HashMap<NpcNode, usize> = HashMap::new();
        for &(a, b) in &remaining {
            *counts.entry(a).or_default() += 1;
            *counts.entry(b).or_default() += 1;
        }
        let leaf = remaining
            .iter()
            .map(|l| l.0)
            .chain(remaining.iter().map(|l| l.1))
            .find_map(|node| match node {
                NpcNode::Cluster(id) if counts[&node] == 1 => Some(id),
                _ => None,
            });
        let not_radial = NpcError::NonRadial {
            remaining: remaining.len(),
        };
        let Some(cluster) = leaf else {
            return Err(not_radial);
        };
        let node = NpcNode::Cluster(cluster);
        let index = remaining
            .iter()
            .position(|&(a, b)| a == node || b == node)
            .ok_or(not_radial)?;
        let (a, b) = remaining.remove(index);
        let target = if a == node { b } else { a };
        debug!(%node, %target, "connection assigned");
        assignments.push(Assignment { cluster, target });
    }
    Ok(assignments)
}

/// Write the optimization outcome into `resume`.
///
/// Microgrid clusters get no connection. Grid-connected clusters get the
/// length and cost of the candidate route to their supplier, which is
/// returned per cluster for export.
pub fn apply_to_resume(
    resume: &mut GridResume,
    problem: &NpcProblem,
    solution: &NpcSolution,
) -> Result<BTreeMap<ClusterId, Route>, NpcError> {
    for cluster in &solution.microgrids {
        if let Some(row) = resume.get_mut(*cluster) {
            row.set_connection(NetworkSummary::default());
            row.connection_type = ConnectionType::Microgrid;
            row.connection_id = None;
        }
    }

    let mut connections = BTreeMap::new();
    for assignment in linearize(&solution.links)? {
        let node = NpcNode::Cluster(assignment.cluster);
        let link = problem
            .link(node, assignment.target)
            .ok_or_else(|| NpcError::MissingLink {
                from: node.to_string(),
                to: assignment.target.to_string(),
            })?;
        let (connection_type, connection_id) = match assignment.target {
            NpcNode::Cluster(id) => (ConnectionType::IntraCluster, u64::from(id.value())),
            NpcNode::Substation(id) => {
                let kind = problem
                    .substation(id)
                    .map(|s| s.kind)
                    .ok_or_else(|| NpcError::UnknownNode(assignment.target.to_string()))?;
                let connection_type = match kind {
                    SubstationKind::Hv => ConnectionType::Hv,
                    SubstationKind::Mv => ConnectionType::Mv,
                };
                (connection_type, id.value())
            }
        };
        if let Some(row) = resume.get_mut(assignment.cluster) {
            row.set_connection(link.route.summary);
            row.connection_type = connection_type;
            row.connection_id = Some(connection_id);
        }
        connections.insert(assignment.cluster, link.route.clone());
    }
    Ok(connections)
}
