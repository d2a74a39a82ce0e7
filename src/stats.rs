//! Window summaries for axis scaling.
//!
//! Uses trueno's SIMD reductions (SSE2/AVX2/AVX512/NEON, selected at
//! runtime) to compute the extent and mean of a sample window. Values are
//! reduced in `f32`, which is ample for choosing axis extents; windows whose
//! values fall outside the `f32` range are reduced in `f64` instead.

use crate::series::Series;
use trueno::Vector;

/// Extent and mean of a window's values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSummary {
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Number of samples summarised.
    pub len: usize,
}

impl WindowSummary {
    /// Summarise a series; `None` when it is empty.
    #[must_use]
    pub fn of(series: &Series) -> Option<Self> {
        Self::of_values(&series.values())
    }

    /// Summarise raw values; `None` when empty or when a value is not finite.
    #[must_use]
    pub fn of_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let vec = Vector::from_vec(values.iter().map(|&v| v as f32).collect());

        let min = vec.min().unwrap_or(f32::NAN);
        let max = vec.max().unwrap_or(f32::NAN);
        let mean = vec.mean().unwrap_or(f32::NAN);
        if min.is_finite() && max.is_finite() && mean.is_finite() {
            return Some(Self {
                min: f64::from(min),
                max: f64::from(max),
                mean: f64::from(mean),
                len: values.len(),
            });
        }
        Self::of_values_wide(values)
    }

    /// Scalar `f64` reduction with a running mean, so it cannot overflow.
    fn of_values_wide(values: &[f64]) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut mean = 0.0;
        for (n, &value) in values.iter().enumerate() {
            if !value.is_finite() {
                return None;
            }
            min = min.min(value);
            max = max.max(value);
            mean += (value - mean) / (n + 1) as f64;
        }
        Some(Self { min, max, mean, len: values.len() })
    }

    /// Axis extent with `fraction` of the range added on each side.
    ///
    /// A flat window is widened by half a unit each way so a scale over it
    /// never has an empty domain.
    #[must_use]
    pub fn padded(&self, fraction: f64) -> (f64, f64) {
        let range = self.max - self.min;
        if range.abs() < f64::EPSILON {
            return (self.min - 0.5, self.max + 0.5);
        }
        let pad = range * fraction.max(0.0);
        (self.min - pad, self.max + pad)
    }
}
