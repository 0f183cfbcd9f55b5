//! # lvplan-core: Rural Electrification Planning Core
//!
//! Provides the data model shared by the routing and optimization crates.
//!
//! ## Design Philosophy
//!
//! The study area is a **point grid**: every mesh point carries planar
//! coordinates, elevation, population, and a terrain weight that multiplies
//! the cost of any line crossing it. Clustering (external) labels points with
//! a settlement. Routing works on transient, cluster-local copies of the grid
//! and produces [`Network`]s: ordered lists of straight [`Line`] records.
//!
//! ## Core Data Structures
//!
//! - [`Point`] / [`PointSet`] - the grid and its ID index
//! - [`Line`] / [`Network`] - routed edges and their summary
//! - [`Substation`], [`ClusterInfo`], [`RoadPolyline`] - collaborator tables
//! - Type-safe IDs: [`PointId`], [`ClusterId`], [`SubstationId`]
//!
//! ## Modules
//!
//! - [`geometry`] - distance and cost matrices, bounding-box filter
//! - [`network`] - line records, summaries, connectivity helpers
//! - [`config`] - validated planning configuration
//! - [`error`] - unified error type

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub mod config;
pub mod error;
pub mod geometry;
pub mod network;

pub use config::{ConfigError, EconomicsConfig, PlanningConfig, RoutingConfig, RoutingMode};
pub use error::{LvError, LvResult};
pub use geometry::{bounding_box, box_extension, cost_matrix, distance_matrix, Dims, PointMatrix};
pub use network::{
    connected_components, edges_to_lines, ConnectionType, GridResume, GridResumeRow, Line,
    LineRole, Network, NetworkSummary,
};

/// Cost/length marker for connections that cannot be routed.
pub const INFEASIBLE: f64 = 999_999.0;

/// Cost given to edges that already carry a built line, so routing reuses them.
pub const FROZEN_EDGE_COST: f64 = 0.001;

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(u64);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(u32);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubstationId(u64);

impl PointId {
    #[inline]
    pub fn new(value: u64) -> Self {
        PointId(value)
    }
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl ClusterId {
    #[inline]
    pub fn new(value: u32) -> Self {
        ClusterId(value)
    }
    #[inline]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl SubstationId {
    #[inline]
    pub fn new(value: u64) -> Self {
        SubstationId(value)
    }
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SubstationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point of the weighted grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub x: f64,
    pub y: f64,
    pub elevation: f64,
    pub population: f64,
    /// Terrain traversal cost multiplier (>= 0).
    pub weight: f64,
    /// Settlement label; `None` for unclustered/noise points.
    pub cluster: Option<ClusterId>,
}

impl Point {
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self {
            id: PointId::new(id),
            x,
            y,
            elevation: 0.0,
            population: 0.0,
            weight: 1.0,
            cluster: None,
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn with_population(mut self, population: f64) -> Self {
        self.population = population;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_cluster(mut self, cluster: ClusterId) -> Self {
        self.cluster = Some(cluster);
        self
    }

    /// Planar distance to another point.
    #[inline]
    pub fn distance_2d(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Euclidean distance including elevation.
    #[inline]
    pub fn distance_3d(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2)
            + (self.y - other.y).powi(2)
            + (self.elevation - other.elevation).powi(2))
        .sqrt()
    }
}

/// An ordered set of points with unique IDs and an ID index.
#[derive(Debug, Clone, Default)]
pub struct PointSet {
    points: Vec<Point>,
    index: HashMap<PointId, usize>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set, rejecting duplicate IDs and negative weights/populations.
    pub fn from_points(points: Vec<Point>) -> LvResult<Self> {
        let mut set = PointSet::new();
        for point in points {
            if point.weight < 0.0 || !point.weight.is_finite() {
                return Err(LvError::Validation(format!(
                    "point {} has invalid Weight {}",
                    point.id, point.weight
                )));
            }
            if point.population < 0.0 || !point.population.is_finite() {
                return Err(LvError::Validation(format!(
                    "point {} has invalid Population {}",
                    point.id, point.population
                )));
            }
            if set.index.contains_key(&point.id) {
                return Err(LvError::Validation(format!(
                    "duplicate point ID {}",
                    point.id
                )));
            }
            set.push(point);
        }
        Ok(set)
    }

    /// Append a point. A point whose ID is already present is ignored.
    pub fn push(&mut self, point: Point) -> bool {
        if self.index.contains_key(&point.id) {
            return false;
        }
        self.index.insert(point.id, self.points.len());
        self.points.push(point);
        true
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[Point] {
        &self.points
    }

    pub fn get(&self, id: PointId) -> Option<&Point> {
        self.index.get(&id).map(|&i| &self.points[i])
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn position(&self, id: PointId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Largest point ID, if any.
    pub fn max_id(&self) -> Option<PointId> {
        self.points.iter().map(|p| p.id).max()
    }

    /// Copy the points matching a predicate into a new set.
    pub fn filter<F>(&self, mut keep: F) -> PointSet
    where
        F: FnMut(&Point) -> bool,
    {
        let mut out = PointSet::new();
        for point in self.points.iter().filter(|p| keep(p)) {
            out.push(point.clone());
        }
        out
    }

    /// Points labelled with the given cluster.
    pub fn cluster(&self, cluster: ClusterId) -> PointSet {
        self.filter(|p| p.cluster == Some(cluster))
    }

    /// Copy the points with the given IDs, in the order given; unknown IDs are skipped.
    pub fn select(&self, ids: &[PointId]) -> PointSet {
        let mut out = PointSet::new();
        for id in ids {
            if let Some(point) = self.get(*id) {
                out.push(point.clone());
            }
        }
        out
    }

    /// Append every point of `other` whose ID is not present yet.
    pub fn extend_unique(&mut self, other: &PointSet) {
        for point in other.iter() {
            self.push(point.clone());
        }
    }

    pub fn ids(&self) -> Vec<PointId> {
        self.points.iter().map(|p| p.id).collect()
    }

    pub fn total_population(&self) -> f64 {
        self.points.iter().map(|p| p.population).sum()
    }

    pub fn mean_elevation(&self) -> f64 {
        if self.points.is_empty() {
            0.0
        } else {
            self.points.iter().map(|p| p.elevation).sum::<f64>() / self.points.len() as f64
        }
    }

    /// Point with the smallest planar distance to `(x, y)`; ties keep the first.
    pub fn nearest(&self, x: f64, y: f64) -> Option<&Point> {
        let mut best: Option<(&Point, f64)> = None;
        for point in &self.points {
            let d = (point.x - x).powi(2) + (point.y - y).powi(2);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((point, d));
            }
        }
        best.map(|(p, _)| p)
    }
}

impl FromIterator<Point> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let mut set = PointSet::new();
        for point in iter {
            set.push(point);
        }
        set
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// One row of the cluster roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub id: ClusterId,
    pub population: f64,
    /// Peak load of the cluster (kW).
    pub load_kw: f64,
}

/// Substation voltage class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubstationKind {
    #[serde(rename = "HV")]
    Hv,
    #[serde(rename = "MV")]
    Mv,
}

impl SubstationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubstationKind::Hv => "HV",
            SubstationKind::Mv => "MV",
        }
    }
}

impl std::str::FromStr for SubstationKind {
    type Err = LvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HV" => Ok(SubstationKind::Hv),
            "MV" => Ok(SubstationKind::Mv),
            other => Err(LvError::Validation(format!(
                "unknown substation Type '{other}' (expected HV or MV)"
            ))),
        }
    }
}

/// An existing or candidate primary substation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substation {
    pub id: SubstationId,
    pub x: f64,
    pub y: f64,
    /// Power available for new connections (kW).
    pub power_available_kw: f64,
    pub kind: SubstationKind,
    /// Net present cost of the substation (k€).
    pub cost_keur: f64,
    pub exists: bool,
}

/// A road centreline in the project's planar CRS.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoadPolyline {
    pub vertices: Vec<(f64, f64)>,
}

impl RoadPolyline {
    pub fn new(vertices: Vec<(f64, f64)>) -> Self {
        Self { vertices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ids_are_rejected() {
        let points = vec![Point::new(1, 0.0, 0.0), Point::new(1, 5.0, 5.0)];
        let err = PointSet::from_points(points).unwrap_err();
        assert!(err.to_string().contains("duplicate point ID 1"));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let points = vec![Point::new(1, 0.0, 0.0).with_weight(-1.0)];
        assert!(PointSet::from_points(points).is_err());
    }

    #[test]
    fn cluster_filter_keeps_order() {
        let c = ClusterId::new(3);
        let set: PointSet = vec![
            Point::new(5, 0.0, 0.0).with_cluster(c),
            Point::new(2, 1.0, 0.0),
            Point::new(9, 2.0, 0.0).with_cluster(c),
        ]
        .into_iter()
        .collect();
        let ids: Vec<u64> = set.cluster(c).iter().map(|p| p.id.value()).collect();
        assert_eq!(ids, vec![5, 9]);
        assert_eq!(set.max_id(), Some(PointId::new(9)));
    }

    #[test]
    fn nearest_prefers_first_on_tie() {
        let set: PointSet = vec![Point::new(1, -1.0, 0.0), Point::new(2, 1.0, 0.0)]
            .into_iter()
            .collect();
        assert_eq!(set.nearest(0.0, 0.0).unwrap().id, PointId::new(1));
    }

    #[test]
    fn distances_include_elevation() {
        let a = Point::new(1, 0.0, 0.0);
        let b = Point::new(2, 3.0, 4.0).with_elevation(12.0);
        assert_eq!(a.distance_2d(&b), 5.0);
        assert_eq!(a.distance_3d(&b), 13.0);
    }

    #[test]
    fn substation_kind_parses_case_insensitively() {
        assert_eq!("hv".parse::<SubstationKind>().unwrap(), SubstationKind::Hv);
        assert!("LV".parse::<SubstationKind>().is_err());
    }
}
