//! Road splicing: turn road polylines into extra routing points and segments.
//!
//! Every polyline vertex becomes a [`Point`] with a synthetic ID above the
//! grid's largest ID, unit weight and the grid's mean elevation. Consecutive
//! vertices of the same polyline are joined by a [`RoadSegment`]; segments
//! never join vertices of different polylines.

use lvplan_core::{Point, PointId, PointSet, RoadPolyline};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One straight piece of a road between two consecutive vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadSegment {
    pub id1: PointId,
    pub id2: PointId,
    /// Segment length (km).
    pub length_km: f64,
    /// Index of the source polyline.
    pub road: usize,
}

/// Road vertices and segments compatible with the point grid.
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    pub points: PointSet,
    pub segments: Vec<RoadSegment>,
}

impl RoadGraph {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments whose two endpoints are both in `points`.
    pub fn segments_within(&self, points: &PointSet) -> Vec<&RoadSegment> {
        self.segments
            .iter()
            .filter(|s| points.contains(s.id1) && points.contains(s.id2))
            .collect()
    }

    /// IDs of all road vertices.
    pub fn point_ids(&self) -> HashSet<PointId> {
        self.points.iter().map(|p| p.id).collect()
    }
}

/// Splice road polylines against `grid`.
pub fn splice_roads(polylines: &[RoadPolyline], grid: &PointSet) -> RoadGraph {
    let mut next_id = grid.max_id().map_or(0, |id| id.value() + 1);
    let elevation = grid.mean_elevation();
    let mut roads = RoadGraph::default();

    for (road, polyline) in polylines.iter().enumerate() {
        let mut previous: Option<Point> = None;
        for &(x, y) in &polyline.vertices {
            let vertex = Point::new(next_id, x, y)
                .with_elevation(elevation)
                .with_weight(1.0);
            next_id += 1;
            if let Some(prev) = &previous {
                roads.segments.push(RoadSegment {
                    id1: prev.id,
                    id2: vertex.id,
                    length_km: prev.distance_2d(&vertex) / 1000.0,
                    road,
                });
            }
            roads.points.push(vertex.clone());
            previous = Some(vertex);
        }
    }
    roads
}
