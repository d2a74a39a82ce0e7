//! Injectable random sources.
//!
//! Every generator in this crate draws its uniform deviates through
//! [`RandomSource`], so tests can pin the stream with a seed or replay a
//! fixed sequence. Any [`rand::RngCore`] is a source out of the box.
//!
//! # References
//!
//! - Box, G. E. P., & Muller, M. E. (1958). "A Note on the Generation of Random
//!   Normal Deviates." *Annals of Mathematical Statistics*, 29(2), 610-611.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::f64::consts::PI;

/// Upper bound on redraws while looking for a non-zero deviate.
const MAX_ZERO_REDRAWS: usize = 64;

/// A supplier of uniform deviates in `[0, 1)`.
pub trait RandomSource {
    /// Next uniform deviate in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;

    /// Uniform deviate in `[-width / 2, width / 2)`.
    fn centered(&mut self, width: f64) -> f64 {
        self.next_uniform() * width - width / 2.0
    }
}

impl<R: RngCore> RandomSource for R {
    fn next_uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Deterministic generator for a given seed.
#[must_use]
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Generator seeded from the operating system.
#[must_use]
pub fn from_entropy() -> StdRng {
    StdRng::from_entropy()
}

/// Replays a fixed list of deviates, cycling when exhausted.
///
/// ```
/// use streamchart::random::{RandomSource, SequenceSource};
///
/// let mut source = SequenceSource::new(vec![0.25, 0.75]);
/// assert_eq!(source.next_uniform(), 0.25);
/// assert_eq!(source.next_uniform(), 0.75);
/// assert_eq!(source.next_uniform(), 0.25);
/// ```
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSource {
    /// Create a source over `values`. Values are clamped into `[0, 1)`;
    /// an empty list yields a constant `0.5`.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        let values = if values.is_empty() {
            vec![0.5]
        } else {
            values.into_iter().map(clamp_unit).collect()
        };
        Self { values, cursor: 0 }
    }

    /// Number of deviates handed out so far.
    #[must_use]
    pub fn drawn(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceSource {
    fn next_uniform(&mut self) -> f64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Draw a uniform deviate in `(0, 1)`.
///
/// Zero is redrawn so the logarithm in [`standard_normal`] stays finite. A
/// source that keeps returning zero falls back to the smallest positive value.
pub fn nonzero_uniform<R: RandomSource + ?Sized>(source: &mut R) -> f64 {
    for _ in 0..MAX_ZERO_REDRAWS {
        let u = source.next_uniform();
        if u > 0.0 {
            return u;
        }
    }
    f64::MIN_POSITIVE
}

/// Standard normal deviate via the Box–Muller transform (cosine branch).
pub fn standard_normal<R: RandomSource + ?Sized>(source: &mut R) -> f64 {
    let u = nonzero_uniform(source);
    let v = nonzero_uniform(source);
    (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos()
}

/// Normal deviate with the given mean and standard deviation.
pub fn normal<R: RandomSource + ?Sized>(source: &mut R, mean: f64, std_dev: f64) -> f64 {
    standard_normal(source) * std_dev + mean
}
