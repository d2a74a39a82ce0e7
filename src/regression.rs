//! Ordinary least-squares trend lines.
//!
//! Fits `y = slope * x + intercept`, the closed form
//! `slope = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²)`, `intercept = (Σy − slope·Σx) / n`.
//! The sums are accumulated as running means and centred co-moments
//! (Welford's update), which is algebraically identical but does not overflow
//! or cancel catastrophically for large point counts or large coordinates.
//!
//! # References
//!
//! - Welford, B. P. (1962). "Note on a Method for Calculating Corrected Sums of
//!   Squares and Products." *Technometrics*, 4(3), 419-420.

use crate::density::Point2D;
use crate::error::{Error, Result};
use tracing::debug;

/// A fitted trend line over a finite x domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionLine {
    /// Change in y per unit x.
    pub slope: f64,
    /// Value of y at x = 0.
    pub intercept: f64,
    /// `(min_x, max_x)` of the fitted points.
    pub domain: (f64, f64),
    /// Coefficient of determination; 1.0 when y has no variance.
    pub r_squared: f64,
}

impl RegressionLine {
    /// Fitted y at `x`.
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Two-point segment spanning the domain, for rendering.
    #[must_use]
    pub fn segment(&self) -> [Point2D; 2] {
        let (min_x, max_x) = self.domain;
        [Point2D::new(min_x, self.predict(min_x)), Point2D::new(max_x, self.predict(max_x))]
    }
}

/// Running least-squares state; push points one at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionAccumulator {
    n: u64,
    mean_x: f64,
    mean_y: f64,
    /// Σ(x − x̄)²
    m2_x: f64,
    /// Σ(y − ȳ)²
    m2_y: f64,
    /// Σ(x − x̄)(y − ȳ)
    c_xy: f64,
    min_x: f64,
    max_x: f64,
}

impl Default for RegressionAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl RegressionAccumulator {
    /// Empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            n: 0,
            mean_x: 0.0,
            mean_y: 0.0,
            m2_x: 0.0,
            m2_y: 0.0,
            c_xy: 0.0,
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
        }
    }

    /// Add one point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a non-finite coordinate; the
    /// accumulator is unchanged.
    pub fn push(&mut self, point: Point2D) -> Result<()> {
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(Error::invalid(format!("point {point:?} has a non-finite coordinate")));
        }
        self.n += 1;
        let n = self.n as f64;
        let dx = point.x - self.mean_x;
        let dy = point.y - self.mean_y;
        self.mean_x += dx / n;
        self.mean_y += dy / n;
        self.m2_x += dx * (point.x - self.mean_x);
        self.m2_y += dy * (point.y - self.mean_y);
        self.c_xy += dx * (point.y - self.mean_y);
        self.min_x = self.min_x.min(point.x);
        self.max_x = self.max_x.max(point.x);
        Ok(())
    }

    /// Number of points pushed.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.n
    }

    /// Returns true if no points were pushed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Solve for the current line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if no points were pushed, and
    /// [`Error::DegenerateInput`] if every x is identical (vertical line) or
    /// the solution is not finite.
    pub fn line(&self) -> Result<RegressionLine> {
        if self.n == 0 {
            return Err(Error::invalid("cannot fit an empty point set"));
        }
        if self.min_x == self.max_x || self.m2_x <= 0.0 {
            return Err(Error::degenerate("every point shares the same x; slope is undefined"));
        }

        let slope = self.c_xy / self.m2_x;
        let intercept = self.mean_y - slope * self.mean_x;
        if !slope.is_finite() || !intercept.is_finite() {
            return Err(Error::degenerate("least-squares solution is not finite"));
        }
        let r_squared = if self.m2_y > 0.0 {
            (self.c_xy * self.c_xy / (self.m2_x * self.m2_y)).clamp(0.0, 1.0)
        } else {
            1.0
        };

        Ok(RegressionLine { slope, intercept, domain: (self.min_x, self.max_x), r_squared })
    }
}

/// Fit a least-squares line through `points`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `points` is empty or contains a
/// non-finite coordinate, and [`Error::DegenerateInput`] if every x is
/// identical.
///
/// # Example
///
/// ```
/// use streamchart::density::Point2D;
/// use streamchart::regression::fit;
///
/// let points = [Point2D::new(0.0, 1.0), Point2D::new(1.0, 3.0), Point2D::new(2.0, 5.0)];
/// let line = fit(&points).unwrap();
/// assert!((line.slope - 2.0).abs() < 1e-12);
/// assert!((line.intercept - 1.0).abs() < 1e-12);
/// ```
pub fn fit(points: &[Point2D]) -> Result<RegressionLine> {
    let mut acc = RegressionAccumulator::new();
    for &point in points {
        acc.push(point)?;
    }
    let line = acc.line()?;
    debug!(
        points = points.len(),
        slope = line.slope,
        intercept = line.intercept,
        "fitted regression line"
    );
    Ok(line)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Points on an exact line are fitted back to that line
        #[test]
        fn prop_recovers_exact_line(
            slope in -100.0f64..100.0,
            intercept in -1000.0f64..1000.0,
            xs in prop::collection::btree_set(-10_000i32..10_000, 2..100)
        ) {
            let points: Vec<Point2D> = xs
                .iter()
                .map(|&x| Point2D::new(f64::from(x), slope * f64::from(x) + intercept))
                .collect();
            let line = fit(&points).unwrap();
            prop_assert!((line.slope - slope).abs() < 1e-6 * (1.0 + slope.abs()));
            prop_assert!((line.intercept - intercept).abs() < 1e-4 * (1.0 + intercept.abs()));
        }
    }
}
