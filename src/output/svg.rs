//! Vector SVG encoder.
//!
//! Elements are accumulated in paint order and serialised on [`SvgEncoder::render`].
//! Coordinates are in output pixels with y growing downwards.

use crate::color::Rgba;
use crate::error::Result;
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// SVG document builder.
#[derive(Debug, Clone)]
pub struct SvgEncoder {
    width: u32,
    height: u32,
    /// Background color (None for transparent)
    background: Option<Rgba>,
    elements: Vec<SvgElement>,
}

/// An SVG element.
///
/// Field names match SVG attribute names.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum SvgElement {
    /// Rectangle
    Rect { x: f64, y: f64, width: f64, height: f64, fill: Rgba },
    /// Circle
    Circle { cx: f64, cy: f64, r: f64, fill: Rgba },
    /// Line
    Line { x1: f64, y1: f64, x2: f64, y2: f64, stroke: Rgba, stroke_width: f64 },
    /// Open polyline
    Polyline { points: Vec<(f64, f64)>, stroke: Rgba, stroke_width: f64 },
    /// Text
    Text { x: f64, y: f64, text: String, font_size: f64, fill: Rgba, anchor: TextAnchor },
}

/// Text anchor position for SVG text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAnchor {
    /// Align text start at position
    #[default]
    Start,
    /// Center text at position
    Middle,
    /// Align text end at position
    End,
}

impl TextAnchor {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

impl Default for SvgEncoder {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl SvgEncoder {
    /// Create a new SVG encoder with given dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, background: Some(Rgba::WHITE), elements: Vec::new() }
    }

    /// Document width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Document height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of elements added so far.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Set background color.
    #[must_use]
    pub fn background(mut self, color: Option<Rgba>) -> Self {
        self.background = color;
        self
    }

    /// Add a filled rectangle.
    #[must_use]
    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64, fill: Rgba) -> Self {
        self.elements.push(SvgElement::Rect { x, y, width, height, fill });
        self
    }

    /// Add a filled circle.
    #[must_use]
    pub fn circle(mut self, cx: f64, cy: f64, r: f64, fill: Rgba) -> Self {
        self.elements.push(SvgElement::Circle { cx, cy, r, fill });
        self
    }

    /// Add a line segment.
    #[must_use]
    pub fn line(
        mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: Rgba,
        stroke_width: f64,
    ) -> Self {
        self.elements.push(SvgElement::Line { x1, y1, x2, y2, stroke, stroke_width });
        self
    }

    /// Add an open polyline. Fewer than two points adds nothing.
    #[must_use]
    pub fn polyline(mut self, points: &[(f64, f64)], stroke: Rgba, stroke_width: f64) -> Self {
        if points.len() >= 2 {
            self.elements.push(SvgElement::Polyline {
                points: points.to_vec(),
                stroke,
                stroke_width,
            });
        }
        self
    }

    /// Add start-anchored text.
    #[must_use]
    pub fn text(self, x: f64, y: f64, text: &str, font_size: f64, fill: Rgba) -> Self {
        self.text_anchored(x, y, text, font_size, fill, TextAnchor::Start)
    }

    /// Add text with an explicit anchor.
    #[must_use]
    pub fn text_anchored(
        mut self,
        x: f64,
        y: f64,
        text: &str,
        font_size: f64,
        fill: Rgba,
        anchor: TextAnchor,
    ) -> Self {
        self.elements.push(SvgElement::Text {
            x,
            y,
            text: text.to_string(),
            font_size,
            fill,
            anchor,
        });
        self
    }

    /// Add a raw element.
    pub fn add_element(&mut self, element: SvgElement) {
        self.elements.push(element);
    }

    /// Render to SVG string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut svg = String::with_capacity(256 + self.elements.len() * 96);

        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );

        if let Some(bg) = self.background {
            let _ = writeln!(svg, r#"  <rect width="100%" height="100%" fill="{}"/>"#, bg.to_css());
        }

        for element in &self.elements {
            svg.push_str("  ");
            write_element(&mut svg, element);
            svg.push('\n');
        }

        svg.push_str("</svg>\n");
        svg
    }

    /// Write to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if file writing fails.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(self.render().as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn write_element(out: &mut String, element: &SvgElement) {
    let _ = match element {
        SvgElement::Rect { x, y, width, height, fill } => write!(
            out,
            r#"<rect x="{x}" y="{y}" width="{width}" height="{height}" fill="{}"/>"#,
            fill.to_css()
        ),
        SvgElement::Circle { cx, cy, r, fill } => {
            write!(out, r#"<circle cx="{cx}" cy="{cy}" r="{r}" fill="{}"/>"#, fill.to_css())
        }
        SvgElement::Line { x1, y1, x2, y2, stroke, stroke_width } => write!(
            out,
            r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="{}" stroke-width="{stroke_width}"/>"#,
            stroke.to_css()
        ),
        SvgElement::Polyline { points, stroke, stroke_width } => {
            out.push_str(r#"<polyline points=""#);
            for (i, (x, y)) in points.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{x},{y}");
            }
            write!(
                out,
                r#"" fill="none" stroke="{}" stroke-width="{stroke_width}"/>"#,
                stroke.to_css()
            )
        }
        SvgElement::Text { x, y, text, font_size, fill, anchor } => write!(
            out,
            r#"<text x="{x}" y="{y}" font-size="{font_size}" fill="{}" text-anchor="{}" font-family="sans-serif">{}</text>"#,
            fill.to_css(),
            anchor.as_str(),
            escape_xml(text)
        ),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_encoder_new() {
        let svg = SvgEncoder::new(800, 600).render();
        assert!(svg.contains("width=\"800\""));
        assert!(svg.contains("height=\"600\""));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn test_svg_rect() {
        let svg = SvgEncoder::new(100, 100).rect(10.0, 20.0, 30.0, 40.0, Rgba::rgb(255, 0, 0)).render();
        assert!(svg.contains(r#"<rect x="10" y="20" width="30" height="40" fill="rgb(255,0,0)"/>"#));
    }

    #[test]
    fn test_svg_circle_alpha() {
        let svg = SvgEncoder::new(100, 100).circle(50.0, 50.0, 2.5, Rgba::SCATTER).render();
        assert!(svg.contains(r#"<circle cx="50" cy="50" r="2.5" fill="rgba(60,120,255,0.800)"/>"#));
    }

    #[test]
    fn test_svg_line() {
        let svg = SvgEncoder::new(100, 100).line(0.0, 0.0, 100.0, 100.0, Rgba::BLACK, 2.0).render();
        assert!(svg.contains(r#"x1="0" y1="0" x2="100" y2="100""#));
        assert!(svg.contains("stroke-width=\"2\""));
    }

    #[test]
    fn test_svg_polyline() {
        let points = [(0.0, 0.0), (50.0, 100.0), (100.0, 0.0)];
        let svg = SvgEncoder::new(100, 100).polyline(&points, Rgba::SERIES_BLUE, 1.5).render();
        assert!(svg.contains("points=\"0,0 50,100 100,0\""));
        assert!(svg.contains("fill=\"none\""));
    }

    #[test]
    fn test_svg_polyline_needs_two_points() {
        let encoder = SvgEncoder::new(100, 100).polyline(&[(1.0, 1.0)], Rgba::BLACK, 1.0);
        assert_eq!(encoder.element_count(), 0);
    }

    #[test]
    fn test_svg_text_escaping() {
        let svg = SvgEncoder::new(100, 100)
            .text(10.0, 50.0, "<b>A & \"B\"</b>", 12.0, Rgba::BLACK)
            .render();
        assert!(!svg.contains("<b>"));
        assert!(svg.contains("&lt;b&gt;A &amp; &quot;B&quot;&lt;/b&gt;"));
        assert!(svg.contains("text-anchor=\"start\""));
    }

    #[test]
    fn test_svg_text_anchored() {
        let svg = SvgEncoder::new(100, 100)
            .text_anchored(50.0, 50.0, "Centered", 12.0, Rgba::BLACK, TextAnchor::Middle)
            .render();
        assert!(svg.contains("text-anchor=\"middle\""));
    }

    #[test]
    fn test_svg_transparent_background() {
        let svg = SvgEncoder::new(100, 100).background(None).render();
        assert_eq!(svg.matches("<rect").count(), 0);
    }

    #[test]
    fn test_svg_add_element() {
        let mut encoder = SvgEncoder::default();
        encoder.add_element(SvgElement::Circle { cx: 1.0, cy: 1.0, r: 1.0, fill: Rgba::BLACK });
        assert_eq!(encoder.element_count(), 1);
        assert!(encoder.render().contains("<circle"));
    }

    #[test]
    fn test_svg_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        SvgEncoder::new(100, 100).rect(10.0, 10.0, 80.0, 80.0, Rgba::BLACK).write_to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<svg"));
        assert!(content.contains("</svg>"));
    }

    #[test]
    fn test_svg_write_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("chart.svg");
        let result = SvgEncoder::new(10, 10).write_to_file(&path);
        assert!(matches!(result, Err(crate::error::Error::Io(_))));
    }
}
