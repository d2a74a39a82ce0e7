//! # streamchart
//!
//! Streaming sample windows, 2D density binning, and regression overlays for
//! real-time charts.
//!
//! The core produces data, never pixels: a bounded random walk that slides
//! forward one sample per tick, an occupancy grid over a point cloud, and a
//! least-squares trend line. Rendering surfaces consume immutable, versioned
//! snapshots of that data.
//!
//! ## Features
//!
//! - **Sliding windows**: fixed-capacity series that drop the oldest sample and
//!   append the newest, with injectable random sources for deterministic tests
//! - **Density binning**: bounded-resolution 2D histograms with an explicit
//!   zero-range policy
//! - **Regression**: overflow-safe ordinary least squares
//! - **SIMD summaries**: window min/max/mean via [trueno](https://crates.io/crates/trueno)
//! - **Surfaces**: in-memory recording and SVG output
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use streamchart::prelude::*;
//!
//! let mut rng = seeded(42);
//! let params = WalkParams::new(0, Duration::from_secs(1), 500.0, 20.0);
//! let window = generate(100, &params, &mut rng)?;
//! let next = slide(&window, 20.0, Duration::from_secs(1), ValueMode::Rounded, &mut rng)?;
//! assert_eq!(next.len(), 100);
//! assert_eq!(next.last().map(|s| s.timestamp), Some(101_000));
//!
//! let cloud = generate_cloud(1000, &CloudParams::default(), &mut rng)?;
//! let cells = bin2d(&cloud, 30, 20)?;
//! assert_eq!(cells.iter().map(|c| c.count).sum::<u64>(), 1000);
//! let trend = fit(&cloud)?;
//! assert!(trend.slope > 0.0);
//! # Ok::<(), streamchart::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `ticker` (default): tokio periodic driver with cancellation
//! - `cli`: the `streamchart` command-line driver
//!
//! ## References
//!
//! - Box, G. E. P., & Muller, M. E. (1958). "A Note on the Generation of Random
//!   Normal Deviates." *Annals of Mathematical Statistics*, 29(2).
//! - Welford, B. P. (1962). "Note on a Method for Calculating Corrected Sums of
//!   Squares and Products." *Technometrics*, 4(3).

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Data Modules
// ============================================================================

/// Injectable uniform random sources.
pub mod random;

/// Timestamped samples and bounded windows.
pub mod series;

/// Random-walk generation and sliding.
pub mod walk;

/// Gaussian point clouds.
pub mod cloud;

/// 2D density binning.
pub mod density;

/// Least-squares trend lines.
pub mod regression;

/// SIMD window summaries.
pub mod stats;

// ============================================================================
// Rendering Modules
// ============================================================================

/// Color types.
pub mod color;

/// Scale functions for data-to-visual mappings.
pub mod scale;

/// Output encoders (SVG).
pub mod output;

/// Redraw instructions and rendering surfaces.
pub mod surface;

// ============================================================================
// Session Modules
// ============================================================================

/// Versioned YAML configuration.
pub mod config;

/// Owned streaming session state.
pub mod session;

/// Periodic tick driver.
#[cfg(feature = "ticker")]
#[cfg_attr(docsrs, doc(cfg(feature = "ticker")))]
pub mod ticker;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for streamchart operations.
pub mod error;

pub use error::{Error, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types and traits for convenient imports.
///
/// ```rust
/// use streamchart::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cloud::{generate_cloud, CloudParams};
    pub use crate::config::Config;
    pub use crate::density::{bin2d, DensityBinner, DensityCell, DensityGrid, Point2D, ZeroRange};
    pub use crate::error::{Error, Result};
    pub use crate::random::{seeded, RandomSource, SequenceSource};
    pub use crate::regression::{fit, RegressionLine};
    pub use crate::series::{Sample, Series, Timestamp};
    pub use crate::session::StreamSession;
    pub use crate::stats::WindowSummary;
    pub use crate::surface::{
        Layer, RecordingSurface, Redraw, RedrawMode, RenderSurface, SvgSurface,
    };
    pub use crate::walk::{generate, slide, DualWalk, RandomWalkSeries, ValueMode, WalkParams};
}

// Re-export trueno for advanced SIMD operations
pub use trueno;
