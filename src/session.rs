//! Streaming session state.
//!
//! A [`StreamSession`] owns every walk of one chart view plus the random
//! source that drives them. Each [`StreamSession::tick`] advances all walks
//! in lockstep and returns an immutable [`Redraw`] that replaces just the
//! series layers; [`StreamSession::reset`] re-seeds everything and returns a
//! full redraw. The session never shares its mutable state: surfaces only
//! ever see `Arc` snapshots.

use crate::cloud::generate_cloud;
use crate::config::Config;
use crate::density::{DensityGrid, Point2D};
use crate::error::Result;
use crate::random::{from_entropy, seeded, RandomSource};
use crate::regression::{fit, RegressionLine};
use crate::series::Series;
use crate::surface::{Layer, Redraw, RedrawMode};
use crate::walk::{random_baseline, RandomWalkSeries};
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{debug, trace};

/// Layer name of the binned point density.
pub const DENSITY_LAYER: &str = "density";
/// Layer name of the scatter sample.
pub const SCATTER_LAYER: &str = "scatter";
/// Layer name of the fitted trend line.
pub const TREND_LAYER: &str = "trend";

/// Layer names the session reserves for its overlay.
pub const OVERLAY_LAYERS: [&str; 3] = [DENSITY_LAYER, SCATTER_LAYER, TREND_LAYER];

/// Static point-cloud layers, recomputed only on reset.
#[derive(Debug, Clone)]
struct Overlay {
    density: Arc<DensityGrid>,
    scatter: Arc<[Point2D]>,
    trend: RegressionLine,
}

/// Owned state of one streaming chart view.
#[derive(Debug)]
pub struct StreamSession<R = StdRng> {
    config: Arc<Config>,
    walks: Vec<RandomWalkSeries>,
    overlay: Overlay,
    rng: R,
    version: u64,
    paused: bool,
}

impl StreamSession<StdRng> {
    /// Session seeded from `config.stream.seed`, or from entropy.
    ///
    /// # Errors
    ///
    /// See [`StreamSession::with_source`].
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let rng = config.stream.seed.map_or_else(from_entropy, seeded);
        Self::with_source(config, rng)
    }
}

impl<R: RandomSource> StreamSession<R> {
    /// Session drawing from an explicit random source.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConfigInvalid`] or
    /// [`crate::Error::UnsupportedVersion`] for a bad configuration, and
    /// [`crate::Error::DegenerateInput`] if the configured cloud has no x
    /// spread.
    pub fn with_source(config: Arc<Config>, mut rng: R) -> Result<Self> {
        config.validate()?;
        let walks = seed_walks(&config, &mut rng)?;
        let overlay = build_overlay(&config, &mut rng)?;
        debug!(
            series = walks.len(),
            capacity = config.stream.capacity,
            "stream session started"
        );
        Ok(Self { config, walks, overlay, rng, version: 0, paused: false })
    }

    /// Advance every walk one step.
    ///
    /// Returns `None` while paused; nothing moves and the version is kept.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] if the clock would overflow.
    pub fn tick(&mut self) -> Result<Option<Redraw>> {
        Ok(self.advance()?.then(|| self.redraw(RedrawMode::Partial)))
    }

    /// Advance every walk one step without building a redraw.
    ///
    /// Returns false while paused.
    ///
    /// # Errors
    ///
    /// Same as [`StreamSession::tick`].
    pub fn advance(&mut self) -> Result<bool> {
        if self.paused {
            trace!(version = self.version, "tick skipped while paused");
            return Ok(false);
        }
        for walk in &mut self.walks {
            walk.advance(&mut self.rng)?;
        }
        self.version += 1;
        trace!(version = self.version, "tick");
        Ok(true)
    }

    /// Re-seed every walk and the overlay; returns a full redraw.
    ///
    /// Reset does not change the paused state.
    ///
    /// # Errors
    ///
    /// Same as [`StreamSession::with_source`].
    pub fn reset(&mut self) -> Result<Redraw> {
        let walks = seed_walks(&self.config, &mut self.rng)?;
        let overlay = build_overlay(&self.config, &mut self.rng)?;
        self.walks = walks;
        self.overlay = overlay;
        self.version += 1;
        debug!(version = self.version, "stream session reset");
        Ok(self.redraw(RedrawMode::Full))
    }

    /// Stop advancing on tick.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume advancing on tick.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Returns true while paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Version of the latest snapshot.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Shared configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Current window of the named series.
    #[must_use]
    pub fn series(&self, name: &str) -> Option<&Series> {
        self.walks.iter().find(|w| w.name() == name).map(RandomWalkSeries::series)
    }

    /// All walks in configuration order.
    #[must_use]
    pub fn walks(&self) -> &[RandomWalkSeries] {
        &self.walks
    }

    /// Current trend line of the point cloud.
    #[must_use]
    pub fn trend(&self) -> RegressionLine {
        self.overlay.trend
    }

    /// Full snapshot of the current state at the current version.
    #[must_use]
    pub fn snapshot(&self) -> Redraw {
        self.redraw(RedrawMode::Full)
    }

    fn redraw(&self, mode: RedrawMode) -> Redraw {
        let mut redraw = Redraw { version: self.version, mode, layers: Vec::new() };
        if mode == RedrawMode::Full {
            redraw = redraw
                .with_layer(DENSITY_LAYER, Layer::Density(Arc::clone(&self.overlay.density)))
                .with_layer(SCATTER_LAYER, Layer::Scatter(Arc::clone(&self.overlay.scatter)))
                .with_layer(TREND_LAYER, Layer::Regression(self.overlay.trend));
        }
        for walk in &self.walks {
            redraw = redraw.with_layer(walk.name(), Layer::Series(Arc::new(walk.series().clone())));
        }
        redraw
    }
}

fn seed_walks<R: RandomSource>(config: &Config, rng: &mut R) -> Result<Vec<RandomWalkSeries>> {
    config
        .series
        .iter()
        .map(|series| {
            let initial = if series.random_baseline {
                random_baseline(series.baseline, rng)
            } else {
                series.baseline
            };
            let params = series.walk_params(&config.stream, initial);
            RandomWalkSeries::seed(series.name.clone(), config.stream.capacity, params, rng)
        })
        .collect()
}

fn build_overlay<R: RandomSource>(config: &Config, rng: &mut R) -> Result<Overlay> {
    let points = generate_cloud(config.density.points, &config.cloud, rng)?;
    let density = config.density.binner().bin(&points)?;
    let trend = fit(&points)?;
    let shown = config.density.scatter.min(points.len());
    Ok(Overlay {
        density: Arc::new(density),
        scatter: Arc::from(&points[..shown]),
        trend,
    })
}
