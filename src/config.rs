//! Versioned session configuration.
//!
//! Loaded once from YAML and then shared read-only (`Arc<Config>`); nothing
//! mutates a configuration after validation. Every field has a default, so an
//! empty document is a valid configuration.
//!
//! ```yaml
//! version: 1
//! stream:
//!   capacity: 100000
//!   step_ms: 1000
//!   interval_ms: 1000
//!   seed: 42
//! series:
//!   - name: Bar Series
//!     baseline: 500
//!     volatility: 20
//!   - name: Line Series
//!     baseline: 250
//!     volatility: 10
//!     mode: raw
//! density:
//!   points: 500000
//!   x_bins: 30
//!   y_bins: 20
//!   zero_range: collapse
//! ```

use crate::cloud::CloudParams;
use crate::density::{DensityBinner, ZeroRange};
use crate::error::{Error, Result};
use crate::series::Timestamp;
use crate::session::OVERLAY_LAYERS;
use crate::walk::{ValueMode, WalkParams};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Newest configuration format this build understands.
pub const CONFIG_VERSION: u32 = 1;

/// Streaming window and clock settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Samples kept per series.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Timestamp spacing in milliseconds.
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,

    /// Tick period in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Clock origin in epoch milliseconds.
    #[serde(default = "default_start_ms")]
    pub start_ms: Timestamp,

    /// Fixed RNG seed; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_capacity() -> usize {
    100_000
}
fn default_step_ms() -> u64 {
    1000
}
fn default_interval_ms() -> u64 {
    1000
}
fn default_start_ms() -> Timestamp {
    // 2000-01-01T00:00:00Z
    946_684_800_000
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            step_ms: default_step_ms(),
            interval_ms: default_interval_ms(),
            start_ms: default_start_ms(),
            seed: None,
        }
    }
}

impl StreamConfig {
    /// Timestamp spacing.
    #[must_use]
    pub fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    /// Tick period.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// One streamed random walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Layer name shown by surfaces.
    pub name: String,

    /// Starting value, or the upper bound of a random start.
    #[serde(default = "default_baseline")]
    pub baseline: f64,

    /// Draw the start uniformly from `[0, baseline)` instead.
    #[serde(default)]
    pub random_baseline: bool,

    /// Width of the per-step uniform change.
    #[serde(default = "default_volatility")]
    pub volatility: f64,

    /// Value rounding.
    #[serde(default)]
    pub mode: ValueMode,
}

fn default_baseline() -> f64 {
    500.0
}
fn default_volatility() -> f64 {
    20.0
}

impl SeriesConfig {
    /// Series with a fixed baseline and rounded values.
    #[must_use]
    pub fn new(name: impl Into<String>, baseline: f64, volatility: f64) -> Self {
        Self {
            name: name.into(),
            baseline,
            random_baseline: false,
            volatility,
            mode: ValueMode::Rounded,
        }
    }

    /// Walk parameters on the stream's clock, starting from `initial_value`.
    #[must_use]
    pub fn walk_params(&self, stream: &StreamConfig, initial_value: f64) -> WalkParams {
        WalkParams::new(stream.start_ms, stream.step(), initial_value, self.volatility)
            .mode(self.mode)
    }
}

fn default_series() -> Vec<SeriesConfig> {
    vec![SeriesConfig::new("Bar Series", 500.0, 20.0), SeriesConfig::new("Line Series", 250.0, 10.0)]
}

/// Density overlay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensityConfig {
    /// Cloud points binned per regeneration.
    #[serde(default = "default_points")]
    pub points: usize,

    /// Leading cloud points also published as a scatter layer.
    #[serde(default = "default_scatter")]
    pub scatter: usize,

    /// Horizontal resolution.
    #[serde(default = "default_x_bins")]
    pub x_bins: usize,

    /// Vertical resolution.
    #[serde(default = "default_y_bins")]
    pub y_bins: usize,

    /// Zero-range axis policy.
    #[serde(default)]
    pub zero_range: ZeroRange,
}

fn default_points() -> usize {
    500_000
}
fn default_scatter() -> usize {
    1000
}
fn default_x_bins() -> usize {
    30
}
fn default_y_bins() -> usize {
    20
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            points: default_points(),
            scatter: default_scatter(),
            x_bins: default_x_bins(),
            y_bins: default_y_bins(),
            zero_range: ZeroRange::default(),
        }
    }
}

impl DensityConfig {
    /// Binner for this resolution and policy.
    #[must_use]
    pub fn binner(&self) -> DensityBinner {
        DensityBinner::new(self.x_bins, self.y_bins).zero_range(self.zero_range)
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Configuration format version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Window and clock.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Streamed walks, in layer order.
    #[serde(default = "default_series")]
    pub series: Vec<SeriesConfig>,

    /// Density overlay.
    #[serde(default)]
    pub density: DensityConfig,

    /// Point cloud shape.
    #[serde(default)]
    pub cloud: CloudParams,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            stream: StreamConfig::default(),
            series: default_series(),
            density: DensityConfig::default(),
            cloud: CloudParams::default(),
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> Error {
    Error::ConfigInvalid { key: key.to_string(), message: message.into() }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] if the file cannot be read, otherwise
    /// see [`Config::parse`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| Error::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parses and validates configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] with the line number if the YAML is
    /// malformed, [`Error::UnsupportedVersion`] for a newer format, and
    /// [`Error::ConfigInvalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| {
            let line = e.location().map(|l| l.line()).unwrap_or(0);
            Error::ConfigParse { line, message: e.to_string() }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration with fallback to defaults.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "using default configuration");
            Self::default()
        })
    }

    /// Serialise back to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if serialisation fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self).map_err(|e| invalid("config", e.to_string()))
    }

    /// Check every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] or [`Error::ConfigInvalid`]
    /// naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.version > CONFIG_VERSION {
            return Err(Error::UnsupportedVersion(self.version));
        }
        if self.version == 0 {
            return Err(invalid("version", "must be at least 1"));
        }

        let stream = &self.stream;
        if stream.capacity == 0 {
            return Err(invalid("stream.capacity", "must be positive"));
        }
        if stream.step_ms == 0 {
            return Err(invalid("stream.step_ms", "must be positive"));
        }
        if stream.interval_ms == 0 {
            return Err(invalid("stream.interval_ms", "must be positive"));
        }

        if self.series.is_empty() {
            return Err(invalid("series", "at least one series is required"));
        }
        let mut names = HashSet::new();
        for (index, series) in self.series.iter().enumerate() {
            let key = |field: &str| format!("series[{index}].{field}");
            if series.name.trim().is_empty() {
                return Err(invalid(&key("name"), "must not be empty"));
            }
            if OVERLAY_LAYERS.contains(&series.name.as_str()) {
                return Err(invalid(&key("name"), format!("'{}' is a reserved layer name", series.name)));
            }
            if !names.insert(series.name.as_str()) {
                return Err(invalid(&key("name"), format!("duplicate series '{}'", series.name)));
            }
            if !series.baseline.is_finite() {
                return Err(invalid(&key("baseline"), "must be finite"));
            }
            if !series.volatility.is_finite() || series.volatility < 0.0 {
                return Err(invalid(&key("volatility"), "must be finite and non-negative"));
            }
        }

        let density = &self.density;
        if density.points == 0 {
            return Err(invalid("density.points", "must be positive"));
        }
        if density.x_bins == 0 {
            return Err(invalid("density.x_bins", "must be positive"));
        }
        if density.y_bins == 0 {
            return Err(invalid("density.y_bins", "must be positive"));
        }

        self.cloud.validate().map_err(|e| invalid("cloud", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::new();

        assert_eq!(config.version, 1);
        assert_eq!(config.stream.capacity, 100_000);
        assert_eq!(config.stream.step(), Duration::from_secs(1));
        assert_eq!(config.stream.interval(), Duration::from_secs(1));
        assert_eq!(config.stream.seed, None);
        assert_eq!(config.series.len(), 2);
        assert_eq!(config.series[0].name, "Bar Series");
        assert_eq!(config.density.x_bins, 30);
        assert_eq!(config.density.y_bins, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_empty_document() {
        let config = Config::parse("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_parse_full() {
        let yaml = r#"
version: 1
stream:
  capacity: 7
  step_ms: 60000
  interval_ms: 250
  seed: 42
series:
  - name: Scatter
    baseline: 10
    volatility: 2.5
    mode: raw
density:
  points: 1000
  x_bins: 8
  y_bins: 4
  zero_range: reject
cloud:
  slope: 2.0
"#;

        let config = Config::parse(yaml).unwrap();

        assert_eq!(config.stream.capacity, 7);
        assert_eq!(config.stream.step(), Duration::from_secs(60));
        assert_eq!(config.stream.seed, Some(42));
        assert_eq!(config.series.len(), 1);
        assert_eq!(config.series[0].mode, ValueMode::Raw);
        assert!(!config.series[0].random_baseline);
        assert_eq!(config.density.zero_range, ZeroRange::Reject);
        assert!((config.cloud.slope - 2.0).abs() < f64::EPSILON);
        assert!((config.cloud.x_mean - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_parse_error_includes_line() {
        let yaml = r#"
version: 1
stream:
  capacity: not_a_number
"#;

        let err = Config::parse(yaml).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }), "got {err:?}");
        assert!(err.to_string().contains('4'), "Error should include line number");
    }

    #[test]
    fn test_config_newer_version_rejected() {
        let err = Config::parse("version: 2").unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(2)));
    }

    #[test]
    fn test_config_invalid_values() {
        let cases = [
            ("stream:\n  capacity: 0", "stream.capacity"),
            ("stream:\n  step_ms: 0", "stream.step_ms"),
            ("series: []", "series"),
            ("series:\n  - name: a\n    volatility: -1", "series[0].volatility"),
            ("series:\n  - name: a\n  - name: a", "series[1].name"),
            ("series:\n  - name: trend", "series[0].name"),
            ("density:\n  x_bins: 0", "density.x_bins"),
            ("cloud:\n  x_std: -1", "cloud"),
        ];
        for (yaml, expected) in cases {
            match Config::parse(yaml) {
                Err(Error::ConfigInvalid { key, .. }) => assert_eq!(key, expected, "{yaml}"),
                other => panic!("{yaml}: expected ConfigInvalid, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_config_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stream:\n  capacity: 12\n  seed: 7").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.stream.capacity, 12);
        assert_eq!(config.stream.seed, Some(7));
    }

    #[test]
    fn test_config_load_missing_file() {
        let err = Config::load("/nonexistent/streamchart.yaml").unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn test_config_load_or_default() {
        let config = Config::load_or_default("/nonexistent/path");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_yaml_round_trip() {
        let mut config = Config::default();
        config.stream.seed = Some(99);
        let parsed = Config::parse(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_walk_params_follow_stream_clock() {
        let config = Config::default();
        let params = config.series[1].walk_params(&config.stream, 250.0);
        assert_eq!(params.start, 946_684_800_000);
        assert_eq!(params.step, Duration::from_secs(1));
        assert!((params.volatility - 10.0).abs() < f64::EPSILON);
    }
}
