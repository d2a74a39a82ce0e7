//! Scale functions for data-to-visual mappings.
//!
//! Scales transform data values to visual properties (position, color).
//! Based on the Grammar of Graphics [Wilkinson 2005].

use crate::color::Rgba;
use crate::error::{Error, Result};

/// Heatmap stops: cool blue, amber, warm red.
pub const DENSITY_PALETTE: [&str; 3] = ["#50a3ba", "#eac736", "#d94e5d"];

/// Trait for scale functions that map domain values to range values.
pub trait Scale<D, R> {
    /// Transform a domain value to a range value.
    fn scale(&self, value: D) -> R;

    /// Get the domain extent.
    fn domain(&self) -> (D, D);

    /// Get the range extent.
    fn range(&self) -> (R, R);
}

/// Linear scale for continuous-to-continuous mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_min: f64,
    domain_max: f64,
    range_min: f64,
    range_max: f64,
}

impl LinearScale {
    /// Create a new linear scale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the domain is empty or either
    /// extent is not finite.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Result<Self> {
        let finite = [domain.0, domain.1, range.0, range.1].iter().all(|v| v.is_finite());
        if !finite {
            return Err(Error::invalid("scale extents must be finite"));
        }
        if (domain.0 - domain.1).abs() < f64::EPSILON {
            return Err(Error::invalid("scale domain min and max cannot be equal"));
        }

        Ok(Self { domain_min: domain.0, domain_max: domain.1, range_min: range.0, range_max: range.1 })
    }

    /// Invert the scale (range to domain).
    #[must_use]
    pub fn invert(&self, value: f64) -> f64 {
        let t = (value - self.range_min) / (self.range_max - self.range_min);
        self.domain_min + t * (self.domain_max - self.domain_min)
    }
}

impl Scale<f64, f64> for LinearScale {
    fn scale(&self, value: f64) -> f64 {
        let t = (value - self.domain_min) / (self.domain_max - self.domain_min);
        self.range_min + t * (self.range_max - self.range_min)
    }

    fn domain(&self) -> (f64, f64) {
        (self.domain_min, self.domain_max)
    }

    fn range(&self) -> (f64, f64) {
        (self.range_min, self.range_max)
    }
}

/// Color scale for mapping values to colors.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    colors: Vec<Rgba>,
    domain_min: f64,
    domain_max: f64,
}

impl ColorScale {
    /// Create a new color scale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if colors is empty or the domain is
    /// empty.
    pub fn new(colors: Vec<Rgba>, domain: (f64, f64)) -> Result<Self> {
        if colors.is_empty() {
            return Err(Error::invalid("color scale requires at least one color"));
        }
        if (domain.0 - domain.1).abs() < f64::EPSILON {
            return Err(Error::invalid("color scale domain min and max cannot be equal"));
        }

        Ok(Self { colors, domain_min: domain.0, domain_max: domain.1 })
    }

    /// Density palette over `[0, max_count]`.
    ///
    /// A zero `max_count` still yields a valid scale over `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Propagates palette parsing failures.
    pub fn density(max_count: u64) -> Result<Self> {
        let colors =
            DENSITY_PALETTE.iter().map(|hex| Rgba::from_hex(hex)).collect::<Result<Vec<_>>>()?;
        Self::new(colors, (0.0, max_count.max(1) as f64))
    }
}

impl Scale<f64, Rgba> for ColorScale {
    fn scale(&self, value: f64) -> Rgba {
        let t = ((value - self.domain_min) / (self.domain_max - self.domain_min)).clamp(0.0, 1.0);

        if self.colors.len() == 1 {
            return self.colors[0];
        }

        let segment_count = self.colors.len() - 1;
        let segment = (t * segment_count as f64).floor() as usize;
        let segment = segment.min(segment_count - 1);

        let local_t = t * segment_count as f64 - segment as f64;

        self.colors[segment].lerp(self.colors[segment + 1], local_t as f32)
    }

    fn domain(&self) -> (f64, f64) {
        (self.domain_min, self.domain_max)
    }

    fn range(&self) -> (Rgba, Rgba) {
        (*self.colors.first().unwrap_or(&Rgba::BLACK), *self.colors.last().unwrap_or(&Rgba::WHITE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_scale() {
        let scale = LinearScale::new((0.0, 100.0), (0.0, 1.0)).unwrap();
        assert!((scale.scale(0.0) - 0.0).abs() < 1e-9);
        assert!((scale.scale(50.0) - 0.5).abs() < 1e-9);
        assert!((scale.scale(100.0) - 1.0).abs() < 1e-9);
        assert!((scale.invert(0.25) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_scale_flipped_range() {
        // SVG y grows downwards
        let scale = LinearScale::new((0.0, 10.0), (600.0, 0.0)).unwrap();
        assert!((scale.scale(10.0) - 0.0).abs() < 1e-9);
        assert!((scale.scale(0.0) - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_scale_rejects_empty_domain() {
        assert!(LinearScale::new((1.0, 1.0), (0.0, 1.0)).is_err());
        assert!(LinearScale::new((0.0, f64::NAN), (0.0, 1.0)).is_err());
    }

    #[test]
    fn test_density_scale_endpoints() {
        let scale = ColorScale::density(100).unwrap();
        assert_eq!(scale.scale(0.0), Rgba::from_hex(DENSITY_PALETTE[0]).unwrap());
        assert_eq!(scale.scale(100.0), Rgba::from_hex(DENSITY_PALETTE[2]).unwrap());
        assert_eq!(scale.scale(1e9), Rgba::from_hex(DENSITY_PALETTE[2]).unwrap());
    }

    #[test]
    fn test_density_scale_zero_max() {
        let scale = ColorScale::density(0).unwrap();
        assert_eq!(scale.domain(), (0.0, 1.0));
    }

    #[test]
    fn test_color_scale_requires_colors() {
        assert!(ColorScale::new(Vec::new(), (0.0, 1.0)).is_err());
    }
}
