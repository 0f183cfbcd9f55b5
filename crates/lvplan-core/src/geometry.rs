//! Geometry and cost utilities.
//!
//! All matrices are keyed by [`PointId`] on both axes. They are rebuilt for
//! every bounding box and never persisted.

use crate::{LvError, LvResult, PointId, PointSet};
use std::collections::HashMap;

/// Coordinate dimensions used by [`distance_matrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dims {
    /// X, Y
    Planar,
    /// X, Y, Elevation
    Spatial,
}

/// Dense matrix addressed by point IDs.
#[derive(Debug, Clone, PartialEq)]
pub struct PointMatrix {
    rows: Vec<PointId>,
    cols: Vec<PointId>,
    row_index: HashMap<PointId, usize>,
    col_index: HashMap<PointId, usize>,
    data: Vec<f64>,
}

impl PointMatrix {
    pub fn zeros(rows: Vec<PointId>, cols: Vec<PointId>) -> Self {
        let row_index = rows.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let col_index = cols.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let data = vec![0.0; rows.len() * cols.len()];
        Self {
            rows,
            cols,
            row_index,
            col_index,
            data,
        }
    }

    pub fn row_ids(&self) -> &[PointId] {
        &self.rows
    }

    pub fn col_ids(&self) -> &[PointId] {
        &self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols.len() + j]
    }

    #[inline]
    fn at_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        let n = self.cols.len();
        &mut self.data[i * n + j]
    }

    pub fn get(&self, a: PointId, b: PointId) -> Option<f64> {
        let i = *self.row_index.get(&a)?;
        let j = *self.col_index.get(&b)?;
        Some(self.at(i, j))
    }

    /// Set one entry; returns false when either ID is unknown.
    pub fn set(&mut self, a: PointId, b: PointId, value: f64) -> bool {
        match (self.row_index.get(&a), self.col_index.get(&b)) {
            (Some(&i), Some(&j)) => {
                *self.at_mut(i, j) = value;
                true
            }
            _ => false,
        }
    }

    /// Set `[a,b]` and `[b,a]`.
    pub fn set_symmetric(&mut self, a: PointId, b: PointId, value: f64) -> bool {
        let first = self.set(a, b, value);
        let second = self.set(b, a, value);
        first && second
    }

    /// Apply `f(row_id, col_id, value)` to every entry in place.
    pub fn update<F>(&mut self, mut f: F)
    where
        F: FnMut(PointId, PointId, f64) -> f64,
    {
        let n = self.cols.len();
        for (i, a) in self.rows.iter().enumerate() {
            for (j, b) in self.cols.iter().enumerate() {
                let cell = &mut self.data[i * n + j];
                *cell = f(*a, *b, *cell);
            }
        }
    }

    /// Upper-triangle entries of a square matrix with a strictly positive value.
    pub fn positive_pairs(&self) -> Vec<(PointId, PointId, f64)> {
        let mut pairs = Vec::new();
        for i in 0..self.rows.len() {
            for j in (i + 1)..self.cols.len() {
                let value = self.at(i, j);
                if value > 0.0 {
                    pairs.push((self.rows[i], self.cols[j], value));
                }
            }
        }
        pairs
    }
}

/// Pairwise Euclidean distances between two point sets.
pub fn distance_matrix(a: &PointSet, b: &PointSet, dims: Dims) -> PointMatrix {
    let mut matrix = PointMatrix::zeros(a.ids(), b.ids());
    let n = b.len();
    for (i, p) in a.iter().enumerate() {
        for (j, q) in b.iter().enumerate() {
            matrix.data[i * n + j] = match dims {
                Dims::Planar => p.distance_2d(q),
                Dims::Spatial => p.distance_3d(q),
            };
        }
    }
    matrix
}

/// Terrain-weighted line cost: `dist3d * (w_i + w_j) / 2 * line_base_cost / 1000`.
///
/// `dist3d` must be the square 3D distance matrix of `points`.
pub fn cost_matrix(
    points: &PointSet,
    dist3d: &PointMatrix,
    line_base_cost: f64,
) -> LvResult<PointMatrix> {
    if dist3d.rows.len() != points.len() || !dist3d.is_square() {
        return Err(LvError::Validation(format!(
            "distance matrix is {}x{}, expected square over {} points",
            dist3d.rows.len(),
            dist3d.cols.len(),
            points.len()
        )));
    }
    let weights: Vec<f64> = points.iter().map(|p| p.weight).collect();
    let mut cost = dist3d.clone();
    let n = weights.len();
    for i in 0..n {
        for j in 0..n {
            let w = (weights[i] + weights[j]) / 2.0;
            cost.data[i * n + j] = dist3d.at(i, j) * w * line_base_cost / 1000.0;
        }
    }
    Ok(cost)
}

/// Margin added around a reference extent with diagonal `diagonal`.
pub fn box_extension(diagonal: f64) -> f64 {
    if diagonal < 5000.0 {
        diagonal
    } else if diagonal < 15000.0 {
        diagonal * 0.6
    } else {
        diagonal / 4.0
    }
}

/// Candidates inside the reference extent grown by [`box_extension`].
///
/// The box is closed, so a single reference point still selects itself.
pub fn bounding_box(reference: &PointSet, candidates: &PointSet) -> PointSet {
    let Some(first) = reference.iter().next() else {
        return PointSet::new();
    };
    let (mut x_min, mut x_max, mut y_min, mut y_max) = (first.x, first.x, first.y, first.y);
    for p in reference.iter() {
        x_min = x_min.min(p.x);
        x_max = x_max.max(p.x);
        y_min = y_min.min(p.y);
        y_max = y_max.max(p.y);
    }
    let diagonal = ((x_max - x_min).powi(2) + (y_max - y_min).powi(2)).sqrt();
    let ext = box_extension(diagonal);
    candidates.filter(|p| {
        p.x >= x_min - ext && p.x <= x_max + ext && p.y >= y_min - ext && p.y <= y_max + ext
    })
}
