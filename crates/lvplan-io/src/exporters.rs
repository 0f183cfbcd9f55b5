//! Writers for routed networks, the `grid_resume` table and optimization results.

use anyhow::{Context, Result};
use lvplan_algo::npc::NpcSolution;
use lvplan_algo::{GridRouting, Route};
use lvplan_core::{ClusterId, GridResume, Line, LineRole, PointId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// One exported line, tagged with its cluster and role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    /// Owning cluster; empty for full-electrification links.
    #[serde(rename = "Cluster")]
    pub cluster: Option<ClusterId>,
    #[serde(rename = "Role")]
    pub role: LineRole,
    #[serde(rename = "ID1")]
    pub id1: PointId,
    #[serde(rename = "ID2")]
    pub id2: PointId,
    #[serde(rename = "Cost")]
    pub cost: f64,
    #[serde(rename = "Length")]
    pub length: f64,
    #[serde(rename = "Component")]
    pub component: Option<u32>,
    #[serde(rename = "Power [kW]")]
    pub power_kw: Option<f64>,
    /// WKT `LINESTRING`.
    #[serde(rename = "Geometry")]
    pub geometry: String,
}

impl LineRecord {
    pub fn new(cluster: Option<ClusterId>, role: LineRole, line: &Line) -> Self {
        Self {
            cluster,
            role,
            id1: line.id1,
            id2: line.id2,
            cost: line.cost,
            length: line.length,
            component: line.component,
            power_kw: line.power_kw,
            geometry: format!(
                "LINESTRING ({} {}, {} {})",
                line.x1, line.y1, line.x2, line.y2
            ),
        }
    }
}

fn push_route(
    records: &mut Vec<LineRecord>,
    cluster: Option<ClusterId>,
    role: LineRole,
    route: &Route,
) {
    records.extend(
        route
            .network
            .lines
            .iter()
            .map(|line| LineRecord::new(cluster, role, line)),
    );
}

/// Flatten every routed network into line records.
///
/// `connections` are the optimized cluster connections; when given they
/// replace the substation connections found during routing.
pub fn collect_lines(
    routing: &GridRouting,
    connections: Option<&BTreeMap<ClusterId, Route>>,
) -> Vec<LineRecord> {
    let mut records = Vec::new();
    for (&cluster, networks) in &routing.networks {
        let id = Some(cluster);
        push_route(&mut records, id, LineRole::Grid, &networks.grid);
        push_route(&mut records, id, LineRole::Branch, &networks.branch);
        push_route(&mut records, id, LineRole::Collateral, &networks.collateral);
        match connections {
            Some(optimized) => {
                if let Some(route) = optimized.get(&cluster) {
                    push_route(&mut records, id, LineRole::Connection, route);
                }
            }
            None => {
                if let Some(connection) = &networks.connection {
                    push_route(&mut records, id, LineRole::Connection, &connection.route);
                }
            }
        }
    }
    push_route(&mut records, None, LineRole::Link, &routing.links);
    records
}

/// Write line records as CSV.
pub fn write_lines(path: &Path, records: &[LineRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("creating CSV writer for {}", path.display()))?;
    for record in records {
        wtr.serialize(record).context("writing line record")?;
    }
    wtr.flush().context("flushing CSV writer")?;
    info!(lines = records.len(), path = %path.display(), "lines written");
    Ok(())
}

/// Write the `grid_resume` table as CSV, one row per cluster.
pub fn write_grid_resume(path: &Path, resume: &GridResume) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("creating CSV writer for {}", path.display()))?;
    for row in resume.rows() {
        wtr.serialize(row)
            .with_context(|| format!("writing grid_resume row of cluster {}", row.cluster))?;
    }
    wtr.flush().context("flushing CSV writer")?;
    info!(clusters = resume.len(), path = %path.display(), "grid_resume written");
    Ok(())
}

/// Write the optimization result as pretty JSON.
pub fn write_milp_results(path: &Path, solution: &NpcSolution) -> Result<()> {
    let json = serde_json::to_string_pretty(solution).context("serializing NpcSolution to JSON")?;
    std::fs::write(path, json).with_context(|| format!("writing JSON to {}", path.display()))?;
    Ok(())
}
