//! NPC problem data structures

use super::NpcError;
use crate::routing::Route;
use lvplan_core::{ClusterId, ClusterInfo, Substation, SubstationId, SubstationKind};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// A node of the optimization graph, written `C<id>` or `S<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NpcNode {
    Cluster(ClusterId),
    Substation(SubstationId),
}

impl NpcNode {
    pub fn is_substation(&self) -> bool {
        matches!(self, NpcNode::Substation(_))
    }

    pub fn cluster(&self) -> Option<ClusterId> {
        match self {
            NpcNode::Cluster(id) => Some(*id),
            NpcNode::Substation(_) => None,
        }
    }
}

impl fmt::Display for NpcNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NpcNode::Cluster(id) => write!(f, "C{id}"),
            NpcNode::Substation(id) => write!(f, "S{id}"),
        }
    }
}

impl FromStr for NpcNode {
    type Err = NpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || NpcError::UnknownNode(s.to_string());
        let mut chars = s.chars();
        let kind = chars.next().ok_or_else(unknown)?;
        let id = chars.as_str();
        match kind {
            'C' => Ok(NpcNode::Cluster(ClusterId::new(
                id.parse().map_err(|_| unknown())?,
            ))),
            'S' => Ok(NpcNode::Substation(SubstationId::new(
                id.parse().map_err(|_| unknown())?,
            ))),
            _ => Err(unknown()),
        }
    }
}

impl Serialize for NpcNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NpcNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Microgrid alternative of a cluster, from the microgrid sizing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicrogridCost {
    #[serde(rename = "Cluster")]
    pub cluster: ClusterId,
    /// Net present cost of the microgrid (k€).
    #[serde(rename = "Total Cost [k€]")]
    pub npc_keur: f64,
    /// Energy the cluster needs over the project (MWh).
    #[serde(rename = "Energy Produced [MWh]")]
    pub energy_mwh: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NpcCluster {
    pub id: ClusterId,
    pub load_kw: f64,
    pub microgrid_npc_keur: f64,
    pub energy_mwh: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NpcSubstation {
    pub id: SubstationId,
    pub kind: SubstationKind,
    pub capacity_kw: f64,
    pub cost_keur: f64,
}

impl From<&Substation> for NpcSubstation {
    fn from(s: &Substation) -> Self {
        Self {
            id: s.id,
            kind: s.kind,
            capacity_kw: s.power_available_kw,
            cost_keur: s.cost_keur,
        }
    }
}

/// A routed connection that the optimizer may build.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLink {
    pub from: NpcNode,
    pub to: NpcNode,
    /// Lines to build and their totals.
    pub route: Route,
    /// Net present cost of the link (k€).
    pub npc_keur: f64,
}

impl CandidateLink {
    /// True when the link joins `a` and `b` in either direction.
    pub fn joins(&self, a: NpcNode, b: NpcNode) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

/// A complete NPC optimization instance.
#[derive(Debug, Clone)]
pub struct NpcProblem {
    pub clusters: Vec<NpcCluster>,
    pub substations: Vec<NpcSubstation>,
    pub links: Vec<CandidateLink>,
    /// Maximum power on any link (kW).
    pub max_line_power_kw: f64,
    /// Cost of grid electricity (€/kWh).
    pub cost_of_electricity: f64,
}

impl NpcProblem {
    pub fn link(&self, a: NpcNode, b: NpcNode) -> Option<&CandidateLink> {
        self.links.iter().find(|l| l.joins(a, b))
    }

    pub fn substation(&self, id: SubstationId) -> Option<&NpcSubstation> {
        self.substations.iter().find(|s| s.id == id)
    }
}

/// Builder for [`NpcProblem`]
///
/// ```ignore
/// let problem = NpcProblemBuilder::new()
///     .clusters(&roster, &microgrids)?
///     .substations(&substations)
///     .links(candidates)
///     .max_line_power_kw(5000.0)
///     .cost_of_electricity(0.09)
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct NpcProblemBuilder {
    clusters: Vec<NpcCluster>,
    substations: Vec<NpcSubstation>,
    links: Vec<CandidateLink>,
    max_line_power_kw: f64,
    cost_of_electricity: f64,
}

impl NpcProblemBuilder {
    pub fn new() -> Self {
        Self {
            max_line_power_kw: 5000.0,
            ..Self::default()
        }
    }

    pub fn cluster(mut self, cluster: NpcCluster) -> Self {
        self.clusters.push(cluster);
        self
    }

    /// Join the cluster roster with the microgrid table.
    pub fn clusters(
        mut self,
        roster: &[ClusterInfo],
        microgrids: &[MicrogridCost],
    ) -> Result<Self, NpcError> {
        let by_cluster: HashMap<ClusterId, &MicrogridCost> =
            microgrids.iter().map(|m| (m.cluster, m)).collect();
        for info in roster {
            let mg = by_cluster
                .get(&info.id)
                .ok_or(NpcError::MissingMicrogrid(info.id))?;
            self.clusters.push(NpcCluster {
                id: info.id,
                load_kw: info.load_kw,
                microgrid_npc_keur: mg.npc_keur,
                energy_mwh: mg.energy_mwh,
            });
        }
        Ok(self)
    }

    pub fn substation(mut self, substation: NpcSubstation) -> Self {
        self.substations.push(substation);
        self
    }

    pub fn substations(mut self, substations: &[Substation]) -> Self {
        self.substations.extend(substations.iter().map(NpcSubstation::from));
        self
    }

    pub fn link(mut self, link: CandidateLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn links(mut self, links: impl IntoIterator<Item = CandidateLink>) -> Self {
        self.links.extend(links);
        self
    }

    pub fn max_line_power_kw(mut self, power: f64) -> Self {
        self.max_line_power_kw = power;
        self
    }

    pub fn cost_of_electricity(mut self, coe: f64) -> Self {
        self.cost_of_electricity = coe;
        self
    }

    /// Check that the instance is well formed.
    pub fn build(self) -> Result<NpcProblem, NpcError> {
        if self.clusters.is_empty() {
            return Err(NpcError::NoClusters);
        }
        let nodes: HashSet<NpcNode> = self
            .clusters
            .iter()
            .map(|c| NpcNode::Cluster(c.id))
            .chain(self.substations.iter().map(|s| NpcNode::Substation(s.id)))
            .collect();
        for link in &self.links {
            for node in [link.from, link.to] {
                if !nodes.contains(&node) {
                    return Err(NpcError::UnknownNode(node.to_string()));
                }
            }
            if link.from.is_substation() && link.to.is_substation() {
                return Err(NpcError::SubstationLink {
                    from: link.from.to_string(),
                    to: link.to.to_string(),
                });
            }
        }
        Ok(NpcProblem {
            clusters: self.clusters,
            substations: self.substations,
            links: self.links,
            max_line_power_kw: self.max_line_power_kw,
            cost_of_electricity: self.cost_of_electricity,
        })
    }
}
