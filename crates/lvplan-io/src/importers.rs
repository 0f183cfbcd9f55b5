//! CSV readers for the planning inputs.
//!
//! Every reader checks the header row first and fails with a
//! [`SchemaError::MissingColumn`] naming the first absent column. Row errors
//! carry the file and the 1-based line number.

use anyhow::{Context, Result};
use lvplan_algo::npc::MicrogridCost;
use lvplan_core::{
    ClusterId, ClusterInfo, Point, PointId, PointSet, RoadPolyline, Substation, SubstationId,
    SubstationKind,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Input table layout errors.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("{file}: missing required column '{column}'")]
    MissingColumn { file: String, column: &'static str },

    #[error("{file}, line {line}: invalid {column} '{value}'")]
    InvalidValue {
        file: String,
        line: usize,
        column: &'static str,
        value: String,
    },
}

const POINT_COLUMNS: &[&str] = &["ID", "X", "Y", "Elevation", "Population", "Weight", "Cluster"];
const CLUSTER_COLUMNS: &[&str] = &["Cluster", "Population", "Load [kW]"];
const SUBSTATION_COLUMNS: &[&str] = &[
    "ID",
    "X",
    "Y",
    "PowerAvailable",
    "Type",
    "Cost [keur]",
    "Exist",
];
const ROAD_COLUMNS: &[&str] = &["road_id", "X", "Y"];
const MICROGRID_COLUMNS: &[&str] = &["Cluster", "Total Cost [k€]", "Energy Produced [MWh]"];

#[derive(Debug, Deserialize)]
struct PointRecord {
    #[serde(rename = "ID")]
    id: u64,
    #[serde(rename = "X")]
    x: f64,
    #[serde(rename = "Y")]
    y: f64,
    #[serde(rename = "Elevation")]
    elevation: f64,
    #[serde(rename = "Population")]
    population: f64,
    #[serde(rename = "Weight")]
    weight: f64,
    #[serde(rename = "Cluster")]
    cluster: i64,
}

#[derive(Debug, Deserialize)]
struct ClusterRecord {
    #[serde(rename = "Cluster")]
    cluster: u32,
    #[serde(rename = "Population")]
    population: f64,
    #[serde(rename = "Load [kW]")]
    load_kw: f64,
}

#[derive(Debug, Deserialize)]
struct SubstationRecord {
    #[serde(rename = "ID")]
    id: u64,
    #[serde(rename = "X")]
    x: f64,
    #[serde(rename = "Y")]
    y: f64,
    #[serde(rename = "PowerAvailable")]
    power_available: f64,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Cost [keur]")]
    cost_keur: f64,
    #[serde(rename = "Exist")]
    exist: String,
}

#[derive(Debug, Deserialize)]
struct RoadRecord {
    road_id: i64,
    #[serde(rename = "X")]
    x: f64,
    #[serde(rename = "Y")]
    y: f64,
}

/// Deserialize every row of a CSV table after checking its header.
///
/// Rows come back with their 1-based line number in the file.
fn read_table<T: DeserializeOwned>(
    path: &Path,
    columns: &[&'static str],
) -> Result<Vec<(usize, T)>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .clone();
    if let Some(column) = columns.iter().find(|c| !headers.iter().any(|h| h == **c)) {
        return Err(SchemaError::MissingColumn {
            file: path.display().to_string(),
            column,
        }
        .into());
    }

    let mut rows = Vec::new();
    for (i, record) in reader.deserialize().enumerate() {
        let line = i + 2;
        let row: T =
            record.with_context(|| format!("{}, line {}", path.display(), line))?;
        rows.push((line, row));
    }
    Ok(rows)
}

fn invalid(path: &Path, line: usize, column: &'static str, value: impl ToString) -> anyhow::Error {
    SchemaError::InvalidValue {
        file: path.display().to_string(),
        line,
        column,
        value: value.to_string(),
    }
    .into()
}

/// Read the weighted point grid. `Cluster = -1` marks unclustered points.
pub fn read_points(path: &Path) -> Result<PointSet> {
    let mut points = Vec::new();
    for (line, r) in read_table::<PointRecord>(path, POINT_COLUMNS)? {
        let cluster = match r.cluster {
            -1 => None,
            c => Some(ClusterId::new(
                u32::try_from(c).map_err(|_| invalid(path, line, "Cluster", c))?,
            )),
        };
        let mut point = Point::new(r.id, r.x, r.y)
            .with_elevation(r.elevation)
            .with_population(r.population)
            .with_weight(r.weight);
        point.cluster = cluster;
        points.push(point);
    }
    let grid = PointSet::from_points(points)
        .with_context(|| format!("validating points of {}", path.display()))?;
    info!(points = grid.len(), path = %path.display(), "point grid loaded");
    Ok(grid)
}

/// Read the cluster roster.
pub fn read_clusters(path: &Path) -> Result<Vec<ClusterInfo>> {
    let mut clusters = Vec::new();
    for (line, r) in read_table::<ClusterRecord>(path, CLUSTER_COLUMNS)? {
        if r.load_kw < 0.0 || !r.load_kw.is_finite() {
            return Err(invalid(path, line, "Load [kW]", r.load_kw));
        }
        clusters.push(ClusterInfo {
            id: ClusterId::new(r.cluster),
            population: r.population,
            load_kw: r.load_kw,
        });
    }
    info!(clusters = clusters.len(), "cluster roster loaded");
    Ok(clusters)
}

/// Read the substation table. `Exist` is `yes` or `no`.
pub fn read_substations(path: &Path) -> Result<Vec<Substation>> {
    let mut substations = Vec::new();
    for (line, r) in read_table::<SubstationRecord>(path, SUBSTATION_COLUMNS)? {
        let kind: SubstationKind = r
            .kind
            .parse()
            .map_err(|_| invalid(path, line, "Type", &r.kind))?;
        let exists = match r.exist.to_ascii_lowercase().as_str() {
            "yes" => true,
            "no" => false,
            _ => return Err(invalid(path, line, "Exist", &r.exist)),
        };
        substations.push(Substation {
            id: SubstationId::new(r.id),
            x: r.x,
            y: r.y,
            power_available_kw: r.power_available,
            kind,
            cost_keur: r.cost_keur,
            exists,
        });
    }
    info!(substations = substations.len(), "substations loaded");
    Ok(substations)
}

/// Read road vertices and group them into polylines.
///
/// Vertices keep their file order within a road; roads keep the order of
/// their first vertex.
pub fn read_roads(path: &Path) -> Result<Vec<RoadPolyline>> {
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut roads: Vec<RoadPolyline> = Vec::new();
    for (_, r) in read_table::<RoadRecord>(path, ROAD_COLUMNS)? {
        let slot = *index.entry(r.road_id).or_insert_with(|| {
            roads.push(RoadPolyline::default());
            roads.len() - 1
        });
        roads[slot].vertices.push((r.x, r.y));
    }
    info!(roads = roads.len(), "road polylines loaded");
    Ok(roads)
}

/// Read the microgrid NPC table produced by microgrid sizing.
pub fn read_microgrids(path: &Path) -> Result<Vec<MicrogridCost>> {
    Ok(read_table::<MicrogridCost>(path, MICROGRID_COLUMNS)?
        .into_iter()
        .map(|(_, m)| m)
        .collect())
}

/// Point IDs in `grid` that name a cluster missing from `roster`.
pub fn unknown_clusters(grid: &PointSet, roster: &[ClusterInfo]) -> Vec<PointId> {
    grid.iter()
        .filter(|p| p.cluster.is_some_and(|c| !roster.iter().any(|r| r.id == c)))
        .map(|p| p.id)
        .collect()
}
