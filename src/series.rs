//! Time-stamped sample windows.
//!
//! A [`Series`] is a bounded, timestamp-ordered window of [`Sample`]s:
//!
//! - **Bounded capacity**: length never exceeds the configured capacity
//! - **Fill phase**: until the window is full, pushes only append
//! - **Sliding phase**: once full, every push drops the oldest sample
//! - **Ordering**: timestamps are strictly increasing
//!
//! # Example
//!
//! ```
//! use streamchart::series::{Sample, Series};
//!
//! let mut series = Series::with_capacity(2).unwrap();
//! series.push(Sample::new(1_000, 1.0)).unwrap();
//! series.push(Sample::new(2_000, 2.0)).unwrap();
//! let evicted = series.push(Sample::new(3_000, 3.0)).unwrap();
//!
//! assert_eq!(evicted, Some(Sample::new(1_000, 1.0)));
//! assert_eq!(series.len(), 2);
//! ```

use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::time::Duration;

/// Milliseconds since the Unix epoch, or a monotonic tick count.
pub type Timestamp = i64;

/// One time-stamped value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    /// Sample time.
    pub timestamp: Timestamp,
    /// Sample value.
    pub value: f64,
}

impl Sample {
    /// Create a new sample.
    #[must_use]
    pub const fn new(timestamp: Timestamp, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// `[timestamp, value]` pair as consumed by time-axis charts.
    #[must_use]
    pub fn to_pair(self) -> [f64; 2] {
        [self.timestamp as f64, self.value]
    }
}

/// Convert a step duration into whole milliseconds.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the duration is shorter than one
/// millisecond, is not a whole number of milliseconds, or does not fit in a
/// [`Timestamp`].
pub fn step_millis(step: Duration) -> Result<Timestamp> {
    let millis = step.as_millis();
    if millis == 0 {
        return Err(Error::invalid(format!("step duration must be at least 1ms, got {step:?}")));
    }
    if step.subsec_nanos() % 1_000_000 != 0 {
        return Err(Error::invalid(format!(
            "step duration must be a whole number of milliseconds, got {step:?}"
        )));
    }
    Timestamp::try_from(millis)
        .map_err(|_| Error::invalid(format!("step duration {step:?} overflows the timestamp range")))
}

/// Fixed-capacity, timestamp-ordered sample window.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl Series {
    /// Create an empty series that holds at most `capacity` samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::invalid("series capacity must be positive"));
        }
        Ok(Self { samples: VecDeque::with_capacity(capacity), capacity })
    }

    /// Build a series from existing samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `capacity` is zero, if there are
    /// more samples than `capacity`, or if the samples violate the ordering
    /// and finiteness rules of [`Series::push`].
    pub fn from_samples(samples: Vec<Sample>, capacity: usize) -> Result<Self> {
        if samples.len() > capacity {
            return Err(Error::invalid(format!(
                "{} samples exceed capacity {capacity}",
                samples.len()
            )));
        }
        let mut series = Self::with_capacity(capacity)?;
        for sample in samples {
            series.check(&sample)?;
            series.samples.push_back(sample);
        }
        Ok(series)
    }

    fn check(&self, sample: &Sample) -> Result<()> {
        if !sample.value.is_finite() {
            return Err(Error::invalid(format!("sample value {} is not finite", sample.value)));
        }
        if let Some(last) = self.samples.back() {
            if sample.timestamp <= last.timestamp {
                return Err(Error::invalid(format!(
                    "timestamp {} does not follow {}",
                    sample.timestamp, last.timestamp
                )));
            }
        }
        Ok(())
    }

    /// Append a sample, dropping the oldest one when the window is full.
    ///
    /// Returns the evicted sample, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the value is not finite or the
    /// timestamp does not strictly follow the current last sample. The
    /// series is unchanged on error.
    pub fn push(&mut self, sample: Sample) -> Result<Option<Sample>> {
        self.check(&sample)?;
        let evicted = if self.is_full() { self.samples.pop_front() } else { None };
        self.samples.push_back(sample);
        Ok(evicted)
    }

    /// A copy of this series with `sample` pushed; `self` is untouched.
    ///
    /// # Errors
    ///
    /// Same as [`Series::push`].
    pub fn with_pushed(&self, sample: Sample) -> Result<Self> {
        self.check(&sample)?;
        let mut next = self.clone();
        if next.is_full() {
            next.samples.pop_front();
        }
        next.samples.push_back(sample);
        Ok(next)
    }

    /// Number of samples currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the series holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true once the fill phase is over.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    /// Oldest sample.
    #[must_use]
    pub fn first(&self) -> Option<&Sample> {
        self.samples.front()
    }

    /// Newest sample.
    #[must_use]
    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Sample at `index`, oldest first.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.samples.iter()
    }

    /// Copy the samples into a contiguous vector, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    /// Just the values, oldest first.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Just the timestamps, oldest first.
    #[must_use]
    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Sample;
    type IntoIter = std::collections::vec_deque::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Length is always min(pushes, capacity)
        #[test]
        fn prop_length_is_min_pushes_capacity(
            capacity in 1usize..200,
            pushes in 0usize..1000
        ) {
            let mut series = Series::with_capacity(capacity).unwrap();
            for i in 0..pushes {
                series.push(Sample::new(i as i64, i as f64)).unwrap();
            }
            prop_assert_eq!(series.len(), pushes.min(capacity));
        }

        /// Timestamps stay strictly increasing through evictions
        #[test]
        fn prop_timestamps_strictly_increasing(
            capacity in 1usize..50,
            gaps in prop::collection::vec(1i64..10_000, 1..200)
        ) {
            let mut series = Series::with_capacity(capacity).unwrap();
            let mut t = 0i64;
            for gap in gaps {
                t += gap;
                series.push(Sample::new(t, 0.0)).unwrap();
            }
            let ts = series.timestamps();
            prop_assert!(ts.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
