//! Routed line records, network summaries and the per-cluster `grid_resume` table.

use crate::geometry::PointMatrix;
use crate::{ClusterId, LvError, LvResult, PointId, PointSet, SubstationId, INFEASIBLE};
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Role of a line in the exported network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRole {
    Grid,
    Branch,
    Collateral,
    Connection,
    Link,
}

impl LineRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineRole::Grid => "grid",
            LineRole::Branch => "branch",
            LineRole::Collateral => "collateral",
            LineRole::Connection => "connection",
            LineRole::Link => "link",
        }
    }
}

/// A straight line between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id1: PointId,
    pub id2: PointId,
    /// Line cost in currency units.
    pub cost: f64,
    /// Planar length in meters.
    pub length: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    /// Connected component of a collateral network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<u32>,
    /// Peak power carried by the component (kW).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_kw: Option<f64>,
}

impl Line {
    /// Unordered endpoint pair, smaller ID first.
    pub fn key(&self) -> (PointId, PointId) {
        if self.id1 <= self.id2 {
            (self.id1, self.id2)
        } else {
            (self.id2, self.id1)
        }
    }
}

/// Integer totals of a network: truncated currency units and meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub cost: u64,
    pub length: u64,
}

impl NetworkSummary {
    pub const fn infeasible() -> Self {
        Self {
            cost: INFEASIBLE as u64,
            length: INFEASIBLE as u64,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        self.cost >= INFEASIBLE as u64
    }

    pub fn cost_keur(&self) -> f64 {
        self.cost as f64 / 1000.0
    }

    pub fn length_km(&self) -> f64 {
        self.length as f64 / 1000.0
    }
}

/// An ordered list of lines. Duplicate endpoint pairs are tolerated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub lines: Vec<Line>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn extend(&mut self, other: Network) {
        self.lines.extend(other.lines);
    }

    pub fn total_cost(&self) -> f64 {
        self.lines.iter().map(|l| l.cost).sum()
    }

    pub fn total_length(&self) -> f64 {
        self.lines.iter().map(|l| l.length).sum()
    }

    /// Totals, truncated once after accumulation.
    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            cost: self.total_cost().trunc() as u64,
            length: self.total_length().trunc() as u64,
        }
    }

    /// Endpoint pairs as stored.
    pub fn pairs(&self) -> Vec<(PointId, PointId)> {
        self.lines.iter().map(|l| (l.id1, l.id2)).collect()
    }

    /// Distinct endpoint IDs in first-seen order.
    pub fn point_ids(&self) -> Vec<PointId> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for line in &self.lines {
            for id in [line.id1, line.id2] {
                if seen.insert(id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    /// Drop later lines whose unordered endpoint pair was already seen.
    pub fn dedup_pairs(&mut self) {
        let mut seen = HashSet::new();
        self.lines.retain(|l| seen.insert(l.key()));
    }
}

/// Convert an edge sequence into lines, costed from `cost`.
///
/// Pairs listed in `skip` (in either order) already carry a line and are
/// left out, as are pairs with no cost at all.
pub fn edges_to_lines(
    path: &[(PointId, PointId)],
    points: &PointSet,
    cost: &PointMatrix,
    skip: &[(PointId, PointId)],
) -> LvResult<Vec<Line>> {
    let skip: HashSet<(PointId, PointId)> =
        skip.iter().map(|&(a, b)| (a.min(b), a.max(b))).collect();
    let mut lines = Vec::with_capacity(path.len());
    for &(a, b) in path {
        let (pa, pb) = match (points.get(a), points.get(b)) {
            (Some(pa), Some(pb)) => (pa, pb),
            _ => {
                return Err(LvError::Routing(format!(
                    "edge {a}-{b} references a point outside the working set"
                )))
            }
        };
        let c = cost.get(a, b).ok_or_else(|| {
            LvError::Routing(format!("edge {a}-{b} is missing from the cost matrix"))
        })?;
        if c == 0.0 || skip.contains(&(a.min(b), a.max(b))) {
            continue;
        }
        lines.push(Line {
            id1: a,
            id2: b,
            cost: c,
            length: pa.distance_2d(pb),
            x1: pa.x,
            y1: pa.y,
            x2: pb.x,
            y2: pb.y,
            component: None,
            power_kw: None,
        });
    }
    Ok(lines)
}

/// Group the endpoints of `pairs` into connected components.
///
/// Components are ordered by their first-seen point; IDs inside a
/// component keep first-seen order too.
pub fn connected_components(pairs: &[(PointId, PointId)]) -> Vec<Vec<PointId>> {
    let mut index: HashMap<PointId, usize> = HashMap::new();
    let mut order = Vec::new();
    for &(a, b) in pairs {
        for id in [a, b] {
            index.entry(id).or_insert_with(|| {
                order.push(id);
                order.len() - 1
            });
        }
    }
    let mut uf = UnionFind::<usize>::new(order.len());
    for &(a, b) in pairs {
        uf.union(index[&a], index[&b]);
    }
    let mut groups: BTreeMap<usize, Vec<PointId>> = BTreeMap::new();
    let mut first_of_root: HashMap<usize, usize> = HashMap::new();
    for (i, id) in order.iter().enumerate() {
        let root = uf.find(i);
        let key = *first_of_root.entry(root).or_insert(i);
        groups.entry(key).or_default().push(*id);
    }
    groups.into_values().collect()
}

/// How a cluster is finally supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConnectionType {
    #[default]
    #[serde(rename = "")]
    Unassigned,
    Microgrid,
    #[serde(rename = "Intra cluster connection")]
    IntraCluster,
    #[serde(rename = "HV")]
    Hv,
    #[serde(rename = "MV")]
    Mv,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Unassigned => "",
            ConnectionType::Microgrid => "Microgrid",
            ConnectionType::IntraCluster => "Intra cluster connection",
            ConnectionType::Hv => "HV",
            ConnectionType::Mv => "MV",
        }
    }
}

/// One `grid_resume` row. Lengths in km, costs in k€.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridResumeRow {
    #[serde(rename = "Cluster")]
    pub cluster: ClusterId,
    #[serde(rename = "Population")]
    pub population: f64,
    #[serde(rename = "Load [kW]")]
    pub load_kw: f64,
    #[serde(rename = "Branch Length [km]")]
    pub branch_length_km: f64,
    #[serde(rename = "Branch Cost [k€]")]
    pub branch_cost_keur: f64,
    #[serde(rename = "Collateral Length [km]")]
    pub collateral_length_km: f64,
    #[serde(rename = "Collateral Cost [k€]")]
    pub collateral_cost_keur: f64,
    #[serde(rename = "Grid Length [km]")]
    pub grid_length_km: f64,
    #[serde(rename = "Grid Cost [k€]")]
    pub grid_cost_keur: f64,
    #[serde(rename = "Connection Length [km]")]
    pub connection_length_km: f64,
    #[serde(rename = "Connection Cost [k€]")]
    pub connection_cost_keur: f64,
    #[serde(rename = "Connection Type")]
    pub connection_type: ConnectionType,
    /// Substation ID, or the target cluster for intra-cluster connections.
    #[serde(rename = "Substation ID")]
    pub connection_id: Option<u64>,
    /// Set when routing this cluster failed.
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

impl GridResumeRow {
    pub fn new(cluster: ClusterId, population: f64, load_kw: f64) -> Self {
        Self {
            cluster,
            population,
            load_kw,
            branch_length_km: 0.0,
            branch_cost_keur: 0.0,
            collateral_length_km: 0.0,
            collateral_cost_keur: 0.0,
            grid_length_km: 0.0,
            grid_cost_keur: 0.0,
            connection_length_km: 0.0,
            connection_cost_keur: 0.0,
            connection_type: ConnectionType::Unassigned,
            connection_id: None,
            error: None,
        }
    }

    pub fn set_grid(&mut self, summary: NetworkSummary) {
        self.grid_length_km = summary.length_km();
        self.grid_cost_keur = summary.cost_keur();
    }

    pub fn set_connection(&mut self, summary: NetworkSummary) {
        self.connection_length_km = summary.length_km();
        self.connection_cost_keur = summary.cost_keur();
    }

    /// Grid totals are branch plus collateral.
    pub fn set_branch_and_collateral(&mut self, branch: NetworkSummary, collateral: NetworkSummary) {
        self.branch_length_km = branch.length_km();
        self.branch_cost_keur = branch.cost_keur();
        self.collateral_length_km = collateral.length_km();
        self.collateral_cost_keur = collateral.cost_keur();
        self.grid_length_km = self.branch_length_km + self.collateral_length_km;
        self.grid_cost_keur = self.branch_cost_keur + self.collateral_cost_keur;
    }

    pub fn substation_id(&self) -> Option<SubstationId> {
        match self.connection_type {
            ConnectionType::Hv | ConnectionType::Mv => self.connection_id.map(SubstationId::new),
            _ => None,
        }
    }
}

/// The per-cluster summary table, keyed by cluster.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridResume {
    rows: BTreeMap<ClusterId, GridResumeRow>,
}

impl GridResume {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the row of a cluster.
    pub fn upsert(&mut self, row: GridResumeRow) {
        self.rows.insert(row.cluster, row);
    }

    pub fn get(&self, cluster: ClusterId) -> Option<&GridResumeRow> {
        self.rows.get(&cluster)
    }

    pub fn get_mut(&mut self, cluster: ClusterId) -> Option<&mut GridResumeRow> {
        self.rows.get_mut(&cluster)
    }

    pub fn rows(&self) -> impl Iterator<Item = &GridResumeRow> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn failed(&self) -> impl Iterator<Item = &GridResumeRow> {
        self.rows.values().filter(|r| r.error.is_some())
    }
}
