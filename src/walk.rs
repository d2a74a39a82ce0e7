//! Bounded random-walk series generation.
//!
//! Each value is the previous one plus a uniform step in
//! `[-volatility / 2, volatility / 2)`; each timestamp is the previous one
//! plus a fixed step. Two operations cover the whole lifecycle:
//!
//! - [`generate`] seeds a window of `count` samples
//! - [`slide`] returns the next window: oldest sample dropped, one new sample
//!   appended after the newest
//!
//! [`RandomWalkSeries`] owns one window plus its parameters and advances it
//! in place; [`DualWalk`] advances two of them in lockstep for dual-axis and
//! mixed bar/line charts.

use crate::error::{Error, Result};
use crate::random::RandomSource;
use crate::series::{step_millis, Sample, Series, Timestamp};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// How generated values are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueMode {
    /// Round to the nearest integer (bar and line displays).
    #[default]
    Rounded,
    /// Keep the full float value (scatter displays).
    Raw,
}

impl ValueMode {
    /// Apply the mode to a raw walk value.
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::Rounded => value.round(),
            Self::Raw => value,
        }
    }
}

/// Parameters of a random walk.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkParams {
    /// Time the walk starts from; the first sample lands one step later.
    pub start: Timestamp,
    /// Spacing between consecutive samples.
    pub step: Duration,
    /// Walk value before the first step.
    pub initial_value: f64,
    /// Width of the uniform step distribution.
    pub volatility: f64,
    /// Rounding applied to emitted values.
    pub mode: ValueMode,
}

impl WalkParams {
    /// Parameters with rounded values.
    #[must_use]
    pub fn new(start: Timestamp, step: Duration, initial_value: f64, volatility: f64) -> Self {
        Self { start, step, initial_value, volatility, mode: ValueMode::Rounded }
    }

    /// Set the value mode.
    #[must_use]
    pub fn mode(mut self, mode: ValueMode) -> Self {
        self.mode = mode;
        self
    }

    fn validate(&self) -> Result<Timestamp> {
        if !self.initial_value.is_finite() {
            return Err(Error::invalid(format!(
                "initial value {} is not finite",
                self.initial_value
            )));
        }
        check_volatility(self.volatility)?;
        step_millis(self.step)
    }
}

/// Uniform baseline in `[0, max)`, used to start walks at a random level.
pub fn random_baseline<R: RandomSource + ?Sized>(max: f64, rng: &mut R) -> f64 {
    rng.next_uniform() * max
}

fn check_volatility(volatility: f64) -> Result<()> {
    if !volatility.is_finite() || volatility < 0.0 {
        return Err(Error::invalid(format!(
            "volatility must be finite and non-negative, got {volatility}"
        )));
    }
    Ok(())
}

fn check_count(count: usize) -> Result<()> {
    if count == 0 {
        return Err(Error::invalid("sample count must be positive"));
    }
    Ok(())
}

fn advance_time(timestamp: Timestamp, step_ms: Timestamp) -> Result<Timestamp> {
    timestamp
        .checked_add(step_ms)
        .ok_or_else(|| Error::invalid(format!("timestamp overflow after {timestamp}")))
}

fn next_walk_sample<R: RandomSource + ?Sized>(
    last: &Sample,
    step_ms: Timestamp,
    volatility: f64,
    mode: ValueMode,
    rng: &mut R,
) -> Result<Sample> {
    let timestamp = advance_time(last.timestamp, step_ms)?;
    let value = mode.apply(last.value + rng.centered(volatility));
    Ok(Sample::new(timestamp, value))
}

/// Generate `count` samples of a random walk.
///
/// The walk accumulator keeps full precision; only the emitted values are
/// rounded under [`ValueMode::Rounded`]. Sample `i` (zero-based) is stamped
/// `start + (i + 1) * step`. The returned series has capacity `count`, so it
/// is already in its sliding phase.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `count` is zero, the step is shorter
/// than a millisecond, the initial value is not finite, or the volatility is
/// negative or not finite.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use streamchart::random::seeded;
/// use streamchart::walk::{generate, WalkParams};
///
/// let params = WalkParams::new(0, Duration::from_secs(1), 500.0, 20.0);
/// let series = generate(100, &params, &mut seeded(1)).unwrap();
/// assert_eq!(series.len(), 100);
/// assert_eq!(series.last().unwrap().timestamp, 100_000);
/// ```
pub fn generate<R: RandomSource + ?Sized>(
    count: usize,
    params: &WalkParams,
    rng: &mut R,
) -> Result<Series> {
    check_count(count)?;
    let step_ms = params.validate()?;

    let mut samples = Vec::with_capacity(count);
    let mut timestamp = params.start;
    let mut level = params.initial_value;
    for _ in 0..count {
        timestamp = advance_time(timestamp, step_ms)?;
        level += rng.centered(params.volatility);
        samples.push(Sample::new(timestamp, params.mode.apply(level)));
    }

    debug!(count, step_ms, volatility = params.volatility, "generated random walk");
    Series::from_samples(samples, count)
}

/// Next window of a random walk.
///
/// Drops the oldest sample (once the window is full) and appends one sample
/// stamped `last.timestamp + step` with value `last.value` plus a uniform step.
/// The input series is not modified.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `series` is empty, the step is
/// shorter than a millisecond, or the volatility is negative or not finite.
pub fn slide<R: RandomSource + ?Sized>(
    series: &Series,
    volatility: f64,
    step: Duration,
    mode: ValueMode,
    rng: &mut R,
) -> Result<Series> {
    check_volatility(volatility)?;
    let step_ms = step_millis(step)?;
    let last = series.last().ok_or_else(|| Error::invalid("cannot slide an empty series"))?;
    let sample = next_walk_sample(last, step_ms, volatility, mode, rng)?;
    series.with_pushed(sample)
}

/// Seed a window of `count` independent draws `round(uniform * max)`.
///
/// Used for category charts where each slot is a fresh value rather than a
/// walk step.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `count` is zero, the step is shorter
/// than a millisecond, or `max` is negative or not finite.
pub fn sample_window<R: RandomSource + ?Sized>(
    count: usize,
    start: Timestamp,
    step: Duration,
    max: f64,
    rng: &mut R,
) -> Result<Series> {
    check_count(count)?;
    check_volatility(max)?;
    let step_ms = step_millis(step)?;

    let mut samples = Vec::with_capacity(count);
    let mut timestamp = start;
    for _ in 0..count {
        timestamp = advance_time(timestamp, step_ms)?;
        samples.push(Sample::new(timestamp, (rng.next_uniform() * max).round()));
    }
    Series::from_samples(samples, count)
}

/// Next window of independent draws; see [`sample_window`].
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `series` is empty, the step is
/// shorter than a millisecond, or `max` is negative or not finite.
pub fn slide_independent<R: RandomSource + ?Sized>(
    series: &Series,
    step: Duration,
    max: f64,
    rng: &mut R,
) -> Result<Series> {
    check_volatility(max)?;
    let step_ms = step_millis(step)?;
    let last = series.last().ok_or_else(|| Error::invalid("cannot slide an empty series"))?;
    let timestamp = advance_time(last.timestamp, step_ms)?;
    series.with_pushed(Sample::new(timestamp, (rng.next_uniform() * max).round()))
}

/// A named random walk that owns its current window.
#[derive(Debug, Clone)]
pub struct RandomWalkSeries {
    name: String,
    params: WalkParams,
    series: Series,
}

impl RandomWalkSeries {
    /// Seed a walk of `count` samples.
    ///
    /// # Errors
    ///
    /// Same as [`generate`].
    pub fn seed<R: RandomSource + ?Sized>(
        name: impl Into<String>,
        count: usize,
        params: WalkParams,
        rng: &mut R,
    ) -> Result<Self> {
        let series = generate(count, &params, rng)?;
        Ok(Self { name: name.into(), params, series })
    }

    /// Advance one step, replacing the current window with its successor.
    ///
    /// Equivalent to `*self.series = slide(...)`, without copying the window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the next timestamp overflows.
    pub fn advance<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Result<&Series> {
        let step_ms = step_millis(self.params.step)?;
        let last = self.series.last().ok_or_else(|| Error::invalid("walk has no samples"))?;
        let sample =
            next_walk_sample(last, step_ms, self.params.volatility, self.params.mode, rng)?;
        self.series.push(sample)?;
        Ok(&self.series)
    }

    /// Re-seed the window from the original parameters.
    ///
    /// # Errors
    ///
    /// Same as [`generate`].
    pub fn reset<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Result<&Series> {
        self.series = generate(self.series.capacity(), &self.params, rng)?;
        Ok(&self.series)
    }

    /// Series name used as the redraw key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Walk parameters.
    #[must_use]
    pub fn params(&self) -> &WalkParams {
        &self.params
    }

    /// Current window.
    #[must_use]
    pub fn series(&self) -> &Series {
        &self.series
    }
}

/// Two walks advanced by one tick, sharing a timestamp column.
#[derive(Debug, Clone)]
pub struct DualWalk {
    primary: RandomWalkSeries,
    secondary: RandomWalkSeries,
}

impl DualWalk {
    /// Seed both walks with `count` samples each.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the two walks disagree on start
    /// time or step, or if either fails to generate.
    pub fn seed<R: RandomSource + ?Sized>(
        count: usize,
        primary: (&str, WalkParams),
        secondary: (&str, WalkParams),
        rng: &mut R,
    ) -> Result<Self> {
        if primary.1.start != secondary.1.start || primary.1.step != secondary.1.step {
            return Err(Error::invalid("lockstep walks must share start time and step"));
        }
        let primary = RandomWalkSeries::seed(primary.0, count, primary.1, rng)?;
        let secondary = RandomWalkSeries::seed(secondary.0, count, secondary.1, rng)?;
        Ok(Self { primary, secondary })
    }

    /// Advance both walks by one step.
    ///
    /// # Errors
    ///
    /// Same as [`RandomWalkSeries::advance`].
    pub fn advance<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.primary.advance(rng)?;
        self.secondary.advance(rng)?;
        Ok(())
    }

    /// Primary (left axis / bar) walk.
    #[must_use]
    pub fn primary(&self) -> &RandomWalkSeries {
        &self.primary
    }

    /// Secondary (right axis / line) walk.
    #[must_use]
    pub fn secondary(&self) -> &RandomWalkSeries {
        &self.secondary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{seeded, SequenceSource};

    fn params() -> WalkParams {
        WalkParams::new(0, Duration::from_secs(1), 500.0, 20.0)
    }

    #[test]
    fn test_generate_length_and_spacing() {
        let series = generate(50, &params(), &mut seeded(3)).unwrap();
        assert_eq!(series.len(), 50);
        assert_eq!(series.capacity(), 50);
        assert_eq!(series.first().unwrap().timestamp, 1000);
        let ts = series.timestamps();
        assert!(ts.windows(2).all(|w| w[1] - w[0] == 1000));
    }

    #[test]
    fn test_generate_minute_step() {
        let params = WalkParams::new(946_684_800_000, Duration::from_secs(60), 250.0, 10.0);
        let series = generate(3, &params, &mut seeded(3)).unwrap();
        assert_eq!(series.timestamps(), vec![946_684_860_000, 946_684_920_000, 946_684_980_000]);
    }

    #[test]
    fn test_generate_rejects_bad_arguments() {
        let mut rng = seeded(0);
        assert!(matches!(generate(0, &params(), &mut rng), Err(Error::InvalidArgument(_))));

        let zero_step = WalkParams::new(0, Duration::ZERO, 0.0, 1.0);
        assert!(generate(10, &zero_step, &mut rng).is_err());

        let bad_vol = WalkParams::new(0, Duration::from_secs(1), 0.0, f64::NAN);
        assert!(generate(10, &bad_vol, &mut rng).is_err());

        let negative_vol = WalkParams::new(0, Duration::from_secs(1), 0.0, -1.0);
        assert!(generate(10, &negative_vol, &mut rng).is_err());
    }

    #[test]
    fn test_generate_steps_are_bounded() {
        let p = params().mode(ValueMode::Raw);
        let series = generate(1000, &p, &mut seeded(9)).unwrap();
        let values = series.values();
        assert!((values[0] - 500.0).abs() <= 10.0);
        assert!(values.windows(2).all(|w| (w[1] - w[0]).abs() <= 10.0));
    }

    #[test]
    fn test_generate_rounded_values_are_integers() {
        let series = generate(200, &params(), &mut seeded(5)).unwrap();
        assert!(series.iter().all(|s| s.value.fract() == 0.0));
    }

    #[test]
    fn test_generate_keeps_unrounded_accumulator() {
        // Steps of +0.4 each: rounding every step would stay at 500 forever.
        let mut source = SequenceSource::new(vec![0.52]);
        let p = WalkParams::new(0, Duration::from_secs(1), 500.0, 20.0);
        let series = generate(3, &p, &mut source).unwrap();
        assert_eq!(series.values(), vec![500.0, 501.0, 501.0]);
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate(100, &params(), &mut seeded(11)).unwrap();
        let b = generate(100, &params(), &mut seeded(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_slide_shifts_window() {
        let series = generate(10, &params(), &mut seeded(1)).unwrap();
        let next = slide(&series, 20.0, Duration::from_secs(1), ValueMode::Rounded, &mut seeded(2))
            .unwrap();

        assert_eq!(next.len(), series.len());
        let old = series.to_vec();
        let new = next.to_vec();
        assert_eq!(&new[..9], &old[1..]);
        assert_eq!(new[9].timestamp, old[9].timestamp + 1000);
        assert!((new[9].value - old[9].value).abs() <= 10.0);
    }

    #[test]
    fn test_slide_uses_exact_step() {
        let series = Series::from_samples(vec![Sample::new(0, 100.0)], 1).unwrap();
        let mut source = SequenceSource::new(vec![0.75]);
        let next = slide(&series, 20.0, Duration::from_secs(1), ValueMode::Raw, &mut source)
            .unwrap();
        assert_eq!(next.to_vec(), vec![Sample::new(1000, 105.0)]);
    }

    #[test]
    fn test_slide_does_not_mutate_input() {
        let series = generate(5, &params(), &mut seeded(1)).unwrap();
        let before = series.clone();
        let _ = slide(&series, 20.0, Duration::from_secs(1), ValueMode::Rounded, &mut seeded(2));
        assert_eq!(series, before);
    }

    #[test]
    fn test_slide_empty_series_fails() {
        let empty = Series::with_capacity(3).unwrap();
        let result = slide(&empty, 20.0, Duration::from_secs(1), ValueMode::Raw, &mut seeded(0));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_slide_validates_before_drawing() {
        let series = generate(3, &params(), &mut seeded(1)).unwrap();
        let mut source = SequenceSource::new(vec![0.5]);
        assert!(slide(&series, 20.0, Duration::ZERO, ValueMode::Raw, &mut source).is_err());
        assert_eq!(source.drawn(), 0);
    }

    #[test]
    fn test_slide_in_fill_phase_grows() {
        let series = Series::from_samples(vec![Sample::new(0, 1.0)], 3).unwrap();
        let next = slide(&series, 2.0, Duration::from_secs(1), ValueMode::Raw, &mut seeded(4))
            .unwrap();
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn test_walk_series_advance_matches_slide() {
        let mut walk = RandomWalkSeries::seed("Real-time Data", 20, params(), &mut seeded(8))
            .unwrap();
        let expected = slide(walk.series(), 20.0, Duration::from_secs(1), ValueMode::Rounded, &mut seeded(99))
            .unwrap();
        walk.advance(&mut seeded(99)).unwrap();
        assert_eq!(walk.series(), &expected);
        assert_eq!(walk.name(), "Real-time Data");
    }

    #[test]
    fn test_walk_series_reset_restores_capacity() {
        let mut rng = seeded(8);
        let mut walk = RandomWalkSeries::seed("s", 20, params(), &mut rng).unwrap();
        for _ in 0..5 {
            walk.advance(&mut rng).unwrap();
        }
        let series = walk.reset(&mut rng).unwrap();
        assert_eq!(series.len(), 20);
        assert_eq!(series.last().unwrap().timestamp, 20_000);
    }

    #[test]
    fn test_dual_walk_lockstep() {
        let start = 946_684_800_000;
        let step = Duration::from_secs(60);
        let mut dual = DualWalk::seed(
            100,
            ("Bar Series", WalkParams::new(start, step, 600.0, 20.0)),
            ("Line Series", WalkParams::new(start, step, 300.0, 10.0)),
            &mut seeded(12),
        )
        .unwrap();

        for _ in 0..3 {
            dual.advance(&mut seeded(13)).unwrap();
            assert_eq!(
                dual.primary().series().timestamps(),
                dual.secondary().series().timestamps()
            );
        }
        assert_eq!(dual.primary().series().len(), 100);
        assert_eq!(dual.secondary().series().last().unwrap().timestamp, start + 103 * 60_000);
    }

    #[test]
    fn test_dual_walk_rejects_mismatched_clocks() {
        let result = DualWalk::seed(
            10,
            ("a", WalkParams::new(0, Duration::from_secs(1), 0.0, 1.0)),
            ("b", WalkParams::new(0, Duration::from_secs(60), 0.0, 1.0)),
            &mut seeded(0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_sample_window_and_slide_independent() {
        let mut rng = seeded(21);
        let window = sample_window(7, 0, Duration::from_secs(1), 1000.0, &mut rng).unwrap();
        assert_eq!(window.len(), 7);
        assert!(window.iter().all(|s| (0.0..=1000.0).contains(&s.value) && s.value.fract() == 0.0));

        let next = slide_independent(&window, Duration::from_secs(1), 1000.0, &mut rng).unwrap();
        assert_eq!(next.len(), 7);
        assert_eq!(&next.to_vec()[..6], &window.to_vec()[1..]);
        assert_eq!(next.last().unwrap().timestamp, 8000);
    }

    #[test]
    fn test_random_baseline_range() {
        let mut rng = seeded(0);
        for _ in 0..1000 {
            let b = random_baseline(1000.0, &mut rng);
            assert!((0.0..1000.0).contains(&b));
        }
    }
}
