//! Color type used by the rendering adapters.

use crate::error::{Error, Result};

/// RGBA color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct Rgba {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
    /// Alpha component (0-255, 255 = fully opaque).
    pub a: u8,
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Axis and label grey.
    pub const AXIS: Self = Self::rgb(110, 112, 121);
    /// Primary series blue.
    pub const SERIES_BLUE: Self = Self::rgb(84, 112, 198);
    /// Secondary series green.
    pub const SERIES_GREEN: Self = Self::rgb(145, 204, 117);
    /// Scatter point blue, 80% opaque.
    pub const SCATTER: Self = Self::new(60, 120, 255, 204);
    /// Trend line orange.
    pub const TREND: Self = Self::rgb(255, 127, 14);

    /// Create a new RGBA color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color (alpha = 255).
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Create a color with modified alpha.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the string is not a hex color.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return Err(Error::invalid(format!("'{hex}' is not a #rrggbb color")));
        }
        let channel = |at: usize| {
            u8::from_str_radix(&digits[at..at + 2], 16)
                .map_err(|_| Error::invalid(format!("'{hex}' is not a #rrggbb color")))
        };
        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Linear interpolation between two colors.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let inv_t = 1.0 - t;

        Self::new(
            (f32::from(self.r) * inv_t + f32::from(other.r) * t) as u8,
            (f32::from(self.g) * inv_t + f32::from(other.g) * t) as u8,
            (f32::from(self.b) * inv_t + f32::from(other.b) * t) as u8,
            (f32::from(self.a) * inv_t + f32::from(other.a) * t) as u8,
        )
    }

    /// CSS color string (`rgb(...)` when opaque, `rgba(...)` otherwise).
    #[must_use]
    pub fn to_css(self) -> String {
        if self.a == 255 {
            format!("rgb({},{},{})", self.r, self.g, self.b)
        } else {
            format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, f32::from(self.a) / 255.0)
        }
    }
}
