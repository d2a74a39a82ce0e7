//! Synthetic scatter clouds with a linear trend.
//!
//! Points are drawn as `x ~ N(x_mean, x_std)` and
//! `y = slope * x + intercept + N(0, noise_std)`, which gives the regression
//! and density overlays something to find.

use crate::density::Point2D;
use crate::error::{Error, Result};
use crate::random::{normal, RandomSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shape of a generated point cloud.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudParams {
    /// Mean of the x distribution.
    pub x_mean: f64,
    /// Standard deviation of the x distribution.
    pub x_std: f64,
    /// Slope of the underlying trend.
    pub slope: f64,
    /// Intercept of the underlying trend.
    pub intercept: f64,
    /// Standard deviation of the vertical noise.
    pub noise_std: f64,
}

impl Default for CloudParams {
    fn default() -> Self {
        Self { x_mean: 5.0, x_std: 4.0, slope: 0.5, intercept: 1.5, noise_std: 1.5 }
    }
}

impl CloudParams {
    /// Check that every parameter is finite and the deviations non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("x_mean", self.x_mean),
            ("x_std", self.x_std),
            ("slope", self.slope),
            ("intercept", self.intercept),
            ("noise_std", self.noise_std),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(Error::invalid(format!("{name} must be finite, got {value}")));
            }
        }
        if self.x_std < 0.0 || self.noise_std < 0.0 {
            return Err(Error::invalid("standard deviations must be non-negative"));
        }
        Ok(())
    }
}

/// Generate `count` points around the trend described by `params`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `count` is zero or the parameters
/// fail [`CloudParams::validate`].
pub fn generate_cloud<R: RandomSource + ?Sized>(
    count: usize,
    params: &CloudParams,
    rng: &mut R,
) -> Result<Vec<Point2D>> {
    if count == 0 {
        return Err(Error::invalid("point count must be positive"));
    }
    params.validate()?;

    let points: Vec<Point2D> = (0..count)
        .map(|_| {
            let x = normal(rng, params.x_mean, params.x_std);
            let y = params.slope * x + params.intercept + normal(rng, 0.0, params.noise_std);
            Point2D::new(x, y)
        })
        .collect();

    debug!(count, "generated point cloud");
    Ok(points)
}
