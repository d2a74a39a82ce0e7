//! 2D density binning for heatmap overlays.
//!
//! Partitions the tight bounding box of a point set into an
//! `x_bins × y_bins` grid and counts the points in each cell. Points on the
//! maximum edge are clamped into the last cell, so every input point lands
//! in exactly one cell and the counts sum to the number of points.
//!
//! An axis with zero range (every x, or every y, identical) has no width to
//! divide. By default all points collapse into cell index 0 on that axis;
//! [`ZeroRange::Reject`] turns it into [`Error::DegenerateInput`] instead.
//!
//! # Example
//!
//! ```
//! use streamchart::density::{bin2d, Point2D};
//!
//! let points = [Point2D::new(0.0, 0.0), Point2D::new(1.0, 1.0), Point2D::new(1.0, 0.0)];
//! let cells = bin2d(&points, 2, 2).unwrap();
//! let total: u64 = cells.iter().map(|c| c.count).sum();
//! assert_eq!(total, 3);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A point in the data plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point2D {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Tight axis-aligned bounding box of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Smallest x.
    pub min_x: f64,
    /// Largest x.
    pub max_x: f64,
    /// Smallest y.
    pub min_y: f64,
    /// Largest y.
    pub max_y: f64,
}

impl Bounds {
    /// Compute the bounds in a single pass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `points` is empty or contains a
    /// non-finite coordinate.
    pub fn from_points(points: &[Point2D]) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::invalid("point set is empty"));
        }
        let mut bounds = Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for (index, p) in points.iter().enumerate() {
            if !p.is_finite() {
                return Err(Error::invalid(format!("point {index} has a non-finite coordinate")));
            }
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Ok(bounds)
    }

    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if a point lies inside (edges included).
    #[must_use]
    pub fn contains(&self, point: Point2D) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}

/// Policy for an axis whose points all share one coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroRange {
    /// Map every point to index 0 on that axis.
    #[default]
    Collapse,
    /// Fail with [`Error::DegenerateInput`].
    Reject,
}

/// One occupied grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensityCell {
    /// Column (x bin) index.
    pub i: usize,
    /// Row (y bin) index.
    pub j: usize,
    /// Number of points in the cell.
    pub count: u64,
}

/// Grid of per-cell point counts.
///
/// Only occupied cells are stored, so memory grows with the number of
/// distinct cells hit rather than with the resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    x_bins: usize,
    y_bins: usize,
    bounds: Bounds,
    x_step: f64,
    y_step: f64,
    /// Occupied cells keyed `(i, j)`.
    counts: BTreeMap<(usize, usize), u64>,
}

/// Map a coordinate to its bin, clamping the maximum edge into the last bin.
fn bin_index(value: f64, min: f64, step: f64, bins: usize) -> usize {
    if step <= 0.0 {
        return 0;
    }
    let raw = ((value - min) / step).floor();
    if raw <= 0.0 {
        0
    } else {
        (raw as usize).min(bins - 1)
    }
}

impl DensityGrid {
    /// Empty grid over the given bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if either bin count is zero or
    /// the bounds are not finite and ordered.
    pub fn empty(bounds: Bounds, x_bins: usize, y_bins: usize) -> Result<Self> {
        if x_bins == 0 || y_bins == 0 {
            return Err(Error::invalid(format!(
                "bin counts must be positive, got {x_bins}x{y_bins}"
            )));
        }
        let ordered = bounds.min_x <= bounds.max_x && bounds.min_y <= bounds.max_y;
        let finite = [bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !ordered || !finite {
            return Err(Error::invalid(format!("bounds {bounds:?} are not a finite box")));
        }
        Ok(Self {
            x_bins,
            y_bins,
            bounds,
            x_step: bounds.width() / x_bins as f64,
            y_step: bounds.height() / y_bins as f64,
            counts: BTreeMap::new(),
        })
    }

    /// Count one more point. Points outside the bounds are ignored.
    ///
    /// Returns true if the point was counted.
    pub fn add(&mut self, point: Point2D) -> bool {
        if !point.is_finite() || !self.bounds.contains(point) {
            return false;
        }
        *self.counts.entry(self.locate(point)).or_insert(0) += 1;
        true
    }

    /// Cell indices for a point inside the bounds.
    #[must_use]
    pub fn locate(&self, point: Point2D) -> (usize, usize) {
        (
            bin_index(point.x, self.bounds.min_x, self.x_step, self.x_bins),
            bin_index(point.y, self.bounds.min_y, self.y_step, self.y_bins),
        )
    }

    /// Count in cell `(i, j)`.
    #[must_use]
    pub fn count(&self, i: usize, j: usize) -> Option<u64> {
        if i >= self.x_bins || j >= self.y_bins {
            return None;
        }
        Some(self.counts.get(&(i, j)).copied().unwrap_or(0))
    }

    /// Occupied cells in row-major `(i, j)` order.
    pub fn cells(&self) -> impl Iterator<Item = DensityCell> + '_ {
        self.counts.iter().map(|(&(i, j), &count)| DensityCell { i, j, count })
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.counts.len()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Largest single-cell count.
    #[must_use]
    pub fn max_count(&self) -> u64 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Number of x bins.
    #[must_use]
    pub const fn x_bins(&self) -> usize {
        self.x_bins
    }

    /// Number of y bins.
    #[must_use]
    pub const fn y_bins(&self) -> usize {
        self.y_bins
    }

    /// Grid bounds.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Cell size `(x_step, y_step)`; zero on a collapsed axis.
    #[must_use]
    pub const fn steps(&self) -> (f64, f64) {
        (self.x_step, self.y_step)
    }

    /// Data-space rectangle `(x0, y0, x1, y1)` covered by cell `(i, j)`.
    #[must_use]
    pub fn cell_rect(&self, i: usize, j: usize) -> (f64, f64, f64, f64) {
        let x0 = self.bounds.min_x + i as f64 * self.x_step;
        let y0 = self.bounds.min_y + j as f64 * self.y_step;
        (x0, y0, x0 + self.x_step, y0 + self.y_step)
    }
}

/// Builder for density grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DensityBinner {
    x_bins: usize,
    y_bins: usize,
    zero_range: ZeroRange,
}

impl DensityBinner {
    /// Binner with the given resolution and [`ZeroRange::Collapse`].
    #[must_use]
    pub fn new(x_bins: usize, y_bins: usize) -> Self {
        Self { x_bins, y_bins, zero_range: ZeroRange::default() }
    }

    /// Set the zero-range policy.
    #[must_use]
    pub fn zero_range(mut self, policy: ZeroRange) -> Self {
        self.zero_range = policy;
        self
    }

    /// Bin `points` into a grid over their bounding box.
    ///
    /// Any positive resolution is accepted; cost is linear in the number of
    /// points.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `points` is empty, contains a
    /// non-finite coordinate, or a bin count is zero. Returns
    /// [`Error::DegenerateInput`] for a zero-range axis under
    /// [`ZeroRange::Reject`].
    pub fn bin(&self, points: &[Point2D]) -> Result<DensityGrid> {
        if self.x_bins == 0 || self.y_bins == 0 {
            return Err(Error::invalid(format!(
                "bin counts must be positive, got {}x{}",
                self.x_bins, self.y_bins
            )));
        }
        let bounds = Bounds::from_points(points)?;
        if self.zero_range == ZeroRange::Reject {
            if bounds.width() == 0.0 {
                return Err(Error::degenerate("every point shares the same x"));
            }
            if bounds.height() == 0.0 {
                return Err(Error::degenerate("every point shares the same y"));
            }
        }

        let mut grid = DensityGrid::empty(bounds, self.x_bins, self.y_bins)?;
        for &point in points {
            *grid.counts.entry(grid.locate(point)).or_insert(0) += 1;
        }

        debug!(
            points = points.len(),
            x_bins = self.x_bins,
            y_bins = self.y_bins,
            max_count = grid.max_count(),
            "binned density grid"
        );
        Ok(grid)
    }
}

/// Sparse density of `points` on an `x_bins × y_bins` grid.
///
/// Only cells with a positive count are returned, in row-major `(i, j)`
/// order. Zero-range axes collapse to index 0.
///
/// # Errors
///
/// See [`DensityBinner::bin`].
pub fn bin2d(points: &[Point2D], x_bins: usize, y_bins: usize) -> Result<Vec<DensityCell>> {
    let grid = DensityBinner::new(x_bins, y_bins).bin(points)?;
    Ok(grid.cells().collect())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn points_strategy() -> impl Strategy<Value = Vec<Point2D>> {
        prop::collection::vec((-1e6f64..1e6, -1e6f64..1e6), 1..400)
            .prop_map(|v| v.into_iter().map(Point2D::from).collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Cell counts sum to the number of points
        #[test]
        fn prop_counts_sum_to_points(
            points in points_strategy(),
            x_bins in 1usize..50,
            y_bins in 1usize..50
        ) {
            let cells = bin2d(&points, x_bins, y_bins).unwrap();
            let total: u64 = cells.iter().map(|c| c.count).sum();
            prop_assert_eq!(total, points.len() as u64);
            prop_assert!(cells.iter().all(|c| c.i < x_bins && c.j < y_bins && c.count > 0));
        }

        /// Re-binning the same data at the same resolution is idempotent
        #[test]
        fn prop_rebinning_is_stable(
            points in points_strategy(),
            x_bins in 1usize..20,
            y_bins in 1usize..20
        ) {
            let first = bin2d(&points, x_bins, y_bins).unwrap();
            let second = bin2d(&points, x_bins, y_bins).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
