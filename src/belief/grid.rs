use ndarray::Array1;
use ordered_float::OrderedFloat;

use crate::error::{Error, Result};

/// A strictly increasing set of belief values in [0,1], the finite state space of the
/// discretized MDP. Grid index `g` refers to `points[g]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BeliefGrid {
    points: Array1<f64>,
    midpoints: Vec<f64>,
}

impl BeliefGrid {
    /// `size` evenly spaced beliefs from 0 to 1 inclusive, spacing 1/(size-1).
    pub fn uniform(size: usize) -> Result<BeliefGrid> {
        if size < 2 {
            return Err(Error::InvalidConfiguration(format!(
                "belief grid needs at least 2 points, got {}",
                size
            )));
        }
        let denom = (size - 1) as f64;
        // i / (size-1) rather than i * step keeps both endpoints (and 0.5 for odd sizes) exact
        let points: Vec<f64> = (0..size).map(|i| i as f64 / denom).collect();
        BeliefGrid::from_points(points)
    }

    /// Arbitrary 1-D grid over the two-state simplex.
    pub fn from_points(points: Vec<f64>) -> Result<BeliefGrid> {
        if points.len() < 2 {
            return Err(Error::InvalidConfiguration(format!(
                "belief grid needs at least 2 points, got {}",
                points.len()
            )));
        }
        if let Some(bad) = points.iter().find(|b| !(0.0..=1.0).contains(*b)) {
            return Err(Error::InvalidConfiguration(format!(
                "belief grid point {} is outside [0,1]",
                bad
            )));
        }
        if let Some(w) = points.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::InvalidConfiguration(format!(
                "belief grid must be strictly increasing, found {} followed by {}",
                w[0], w[1]
            )));
        }
        let midpoints: Vec<f64> = points.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect();
        Ok(BeliefGrid {
            points: Array1::from(points),
            midpoints,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false, a grid holds at least two points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &Array1<f64> {
        &self.points
    }

    pub fn belief(&self, g: usize) -> Option<f64> {
        self.points.get(g).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().copied()
    }

    /// Index of the grid point nearest to `v`: the number of midpoints strictly below `v`.
    /// A value sitting exactly on a midpoint resolves to the lower of the two neighbours.
    pub fn nearest_index(&self, v: f64) -> usize {
        self.midpoints.partition_point(|&m| m < v)
    }

    /// Index minimising |grid[g] - target|, the first such index on an exact tie.
    pub fn closest_index(&self, target: f64) -> usize {
        self.points
            .iter()
            .enumerate()
            .min_by_key(|(_, b)| OrderedFloat((*b - target).abs()))
            .map(|(g, _)| g)
            .unwrap_or(0)
    }
}
