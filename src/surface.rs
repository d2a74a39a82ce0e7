//! Rendering surfaces.
//!
//! A surface consumes [`Redraw`] instructions: an immutable, versioned set of
//! named layers. A [`RedrawMode::Full`] redraw replaces everything the surface
//! shows; a [`RedrawMode::Partial`] redraw replaces only the layers it names.
//! Layers are shared through [`Arc`], so handing the same snapshot to several
//! surfaces never copies sample data, and no surface can mutate it.
//!
//! Redraws older than the newest one a surface has accepted are dropped
//! (last-write-wins).

use crate::color::Rgba;
use crate::density::{Bounds, DensityGrid, Point2D};
use crate::error::Result;
use crate::output::{SvgEncoder, TextAnchor};
use crate::regression::RegressionLine;
use crate::scale::{ColorScale, LinearScale, Scale};
use crate::series::Series;
use crate::stats::WindowSummary;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::trace;

/// One named piece of chart data.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// A time series window.
    Series(Arc<Series>),
    /// Raw scatter points.
    Scatter(Arc<[Point2D]>),
    /// Binned point density.
    Density(Arc<DensityGrid>),
    /// Fitted trend line.
    Regression(RegressionLine),
}

/// How a redraw combines with what the surface already shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedrawMode {
    /// Discard every existing layer first.
    Full,
    /// Replace only the named layers.
    #[default]
    Partial,
}

/// An immutable redraw instruction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Redraw {
    /// Monotonic snapshot version.
    pub version: u64,
    /// Combination mode.
    pub mode: RedrawMode,
    /// Layers keyed by name, in paint order.
    pub layers: Vec<(String, Layer)>,
}

impl Redraw {
    /// Empty full redraw.
    #[must_use]
    pub fn full(version: u64) -> Self {
        Self { version, mode: RedrawMode::Full, layers: Vec::new() }
    }

    /// Empty partial redraw.
    #[must_use]
    pub fn partial(version: u64) -> Self {
        Self { version, mode: RedrawMode::Partial, layers: Vec::new() }
    }

    /// Add a layer.
    #[must_use]
    pub fn with_layer(mut self, name: impl Into<String>, layer: Layer) -> Self {
        self.layers.push((name.into(), layer));
        self
    }

    /// Layer by name.
    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|(n, _)| n == name).map(|(_, layer)| layer)
    }

    /// Series layer by name.
    #[must_use]
    pub fn series(&self, name: &str) -> Option<&Series> {
        match self.layer(name)? {
            Layer::Series(series) => Some(series),
            _ => None,
        }
    }
}

/// Consumer of redraw instructions.
///
/// Implementations must not assume a previous redraw has finished rendering
/// when the next one arrives.
pub trait RenderSurface {
    /// Apply one redraw.
    ///
    /// # Errors
    ///
    /// Implementation-specific; the in-memory surfaces never fail.
    fn submit(&mut self, redraw: &Redraw) -> Result<()>;
}

/// Layer state shared by the in-memory surfaces.
#[derive(Debug, Clone, Default)]
struct LayerState {
    layers: BTreeMap<String, Layer>,
    /// Insertion order of current layer names.
    order: Vec<String>,
    version: Option<u64>,
    redraws: usize,
    full_redraws: usize,
    dropped: usize,
}

impl LayerState {
    fn apply(&mut self, redraw: &Redraw) {
        if self.version.is_some_and(|seen| redraw.version < seen) {
            self.dropped += 1;
            trace!(version = redraw.version, "dropped stale redraw");
            return;
        }
        if redraw.mode == RedrawMode::Full {
            self.layers.clear();
            self.order.clear();
            self.full_redraws += 1;
        }
        for (name, layer) in &redraw.layers {
            if self.layers.insert(name.clone(), layer.clone()).is_none() {
                self.order.push(name.clone());
            }
        }
        self.version = Some(redraw.version);
        self.redraws += 1;
    }

    fn ordered(&self) -> impl Iterator<Item = (&str, &Layer)> + '_ {
        self.order.iter().filter_map(|name| self.layers.get(name).map(|l| (name.as_str(), l)))
    }
}

/// Surface that only remembers what it was asked to show.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    state: LayerState,
}

impl RecordingSurface {
    /// Empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently shown layer.
    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.state.layers.get(name)
    }

    /// Currently shown series.
    #[must_use]
    pub fn series(&self, name: &str) -> Option<&Series> {
        match self.layer(name)? {
            Layer::Series(series) => Some(series),
            _ => None,
        }
    }

    /// Names of the current layers, in first-shown order.
    #[must_use]
    pub fn layer_names(&self) -> Vec<&str> {
        self.state.ordered().map(|(name, _)| name).collect()
    }

    /// Version of the newest accepted redraw.
    #[must_use]
    pub fn version(&self) -> Option<u64> {
        self.state.version
    }

    /// Accepted redraws.
    #[must_use]
    pub fn redraws(&self) -> usize {
        self.state.redraws
    }

    /// Accepted full redraws.
    #[must_use]
    pub fn full_redraws(&self) -> usize {
        self.state.full_redraws
    }

    /// Redraws dropped as stale.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.state.dropped
    }
}

impl RenderSurface for RecordingSurface {
    fn submit(&mut self, redraw: &Redraw) -> Result<()> {
        self.state.apply(redraw);
        Ok(())
    }
}

/// Series stroke colors, cycled by layer order.
const SERIES_COLORS: [Rgba; 4] =
    [Rgba::SERIES_BLUE, Rgba::SERIES_GREEN, Rgba::rgb(250, 200, 88), Rgba::rgb(238, 102, 102)];

const MARGIN: f64 = 40.0;

/// Surface that renders its current layers as an SVG document.
///
/// Series layers share a time panel on top; scatter, density, and regression
/// layers share an x/y panel below it. Empty panels are omitted.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    width: u32,
    height: u32,
    state: LayerState,
}

impl Default for SvgSurface {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl SvgSurface {
    /// Surface of the given pixel size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, state: LayerState::default() }
    }

    /// Version of the newest accepted redraw.
    #[must_use]
    pub fn version(&self) -> Option<u64> {
        self.state.version
    }

    /// Build the SVG document for the current layers.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] if a layer holds non-finite data.
    pub fn document(&self) -> Result<SvgEncoder> {
        let series: Vec<(&str, &Series)> = self
            .state
            .ordered()
            .filter_map(|(name, layer)| match layer {
                Layer::Series(s) if !s.is_empty() => Some((name, &**s)),
                _ => None,
            })
            .collect();
        let planar: Vec<&Layer> = self
            .state
            .ordered()
            .map(|(_, layer)| layer)
            .filter(|layer| !matches!(layer, Layer::Series(_)))
            .collect();

        let panels = usize::from(!series.is_empty()) + usize::from(!planar.is_empty());
        let mut svg = SvgEncoder::new(self.width, self.height);
        if panels == 0 {
            return Ok(svg);
        }

        let panel_height = f64::from(self.height) / panels as f64;
        let mut top = 0.0;
        if !series.is_empty() {
            svg = self.draw_time_panel(svg, &series, top, panel_height)?;
            top += panel_height;
        }
        if !planar.is_empty() {
            svg = self.draw_plane_panel(svg, &planar, top, panel_height)?;
        }
        Ok(svg)
    }

    /// Render the current layers to an SVG string.
    ///
    /// # Errors
    ///
    /// See [`SvgSurface::document`].
    pub fn render(&self) -> Result<String> {
        Ok(self.document()?.render())
    }

    /// Render the current layers to a file.
    ///
    /// # Errors
    ///
    /// See [`SvgSurface::document`]; also fails if the file cannot be written.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.document()?.write_to_file(path)
    }

    fn plot_x(&self, domain: (f64, f64)) -> Result<LinearScale> {
        LinearScale::new(domain, (MARGIN, f64::from(self.width) - MARGIN / 2.0))
    }

    fn draw_time_panel(
        &self,
        mut svg: SvgEncoder,
        series: &[(&str, &Series)],
        top: f64,
        height: f64,
    ) -> Result<SvgEncoder> {
        let mut t0 = i64::MAX;
        let mut t1 = i64::MIN;
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for (_, s) in series {
            if let (Some(first), Some(last)) = (s.first(), s.last()) {
                t0 = t0.min(first.timestamp);
                t1 = t1.max(last.timestamp);
            }
            if let Some(summary) = WindowSummary::of(s) {
                lo = lo.min(summary.min);
                hi = hi.max(summary.max);
            }
        }
        let values = WindowSummary { min: lo, max: hi, mean: (lo + hi) / 2.0, len: 2 };
        let x = self.plot_x(widen(t0 as f64, t1 as f64))?;
        let y = LinearScale::new(values.padded(0.05), (top + height - MARGIN / 2.0, top + MARGIN))?;

        svg = draw_axes(svg, &x, &y);
        for (index, (name, s)) in series.iter().enumerate() {
            let color = SERIES_COLORS[index % SERIES_COLORS.len()];
            let points = decimate(s, self.width as usize * 2)
                .map(|sample| (x.scale(sample.timestamp as f64), y.scale(sample.value)))
                .collect::<Vec<_>>();
            let label_y = top + MARGIN / 2.0 + index as f64 * 14.0;
            svg = svg.polyline(&points, color, 1.5).text_anchored(
                f64::from(self.width) - MARGIN / 2.0,
                label_y,
                name,
                12.0,
                color,
                TextAnchor::End,
            );
        }
        Ok(svg)
    }

    fn draw_plane_panel(
        &self,
        mut svg: SvgEncoder,
        layers: &[&Layer],
        top: f64,
        height: f64,
    ) -> Result<SvgEncoder> {
        let mut extent: Option<Bounds> = None;
        let mut grow = |b: Bounds| {
            extent = Some(match extent {
                None => b,
                Some(e) => Bounds {
                    min_x: e.min_x.min(b.min_x),
                    max_x: e.max_x.max(b.max_x),
                    min_y: e.min_y.min(b.min_y),
                    max_y: e.max_y.max(b.max_y),
                },
            });
        };
        for layer in layers {
            match layer {
                Layer::Scatter(points) if !points.is_empty() => grow(Bounds::from_points(points)?),
                Layer::Density(grid) => grow(grid.bounds()),
                Layer::Regression(line) => {
                    let [a, b] = line.segment();
                    grow(Bounds::from_points(&[a, b])?);
                }
                _ => {}
            }
        }
        let Some(extent) = extent else {
            return Ok(svg);
        };

        let x = self.plot_x(widen(extent.min_x, extent.max_x))?;
        let y = LinearScale::new(
            widen(extent.min_y, extent.max_y),
            (top + height - MARGIN / 2.0, top + MARGIN / 2.0),
        )?;
        svg = draw_axes(svg, &x, &y);

        for layer in layers {
            svg = match layer {
                Layer::Density(grid) => draw_density(svg, grid, &x, &y)?,
                Layer::Scatter(points) => points
                    .iter()
                    .fold(svg, |svg, p| svg.circle(x.scale(p.x), y.scale(p.y), 2.0, Rgba::SCATTER)),
                Layer::Regression(line) => {
                    let [a, b] = line.segment();
                    svg.line(x.scale(a.x), y.scale(a.y), x.scale(b.x), y.scale(b.y), Rgba::TREND, 2.0)
                }
                Layer::Series(_) => svg,
            };
        }
        Ok(svg)
    }
}

impl RenderSurface for SvgSurface {
    fn submit(&mut self, redraw: &Redraw) -> Result<()> {
        self.state.apply(redraw);
        Ok(())
    }
}

/// Non-empty domain around `[lo, hi]`.
fn widen(lo: f64, hi: f64) -> (f64, f64) {
    if hi - lo > f64::EPSILON * lo.abs().max(1.0) {
        (lo, hi)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}

/// At most about `max_points` samples, always keeping the newest.
fn decimate(series: &Series, max_points: usize) -> impl Iterator<Item = &crate::series::Sample> {
    let stride = series.len().div_ceil(max_points.max(1)).max(1);
    let last = series.len().saturating_sub(1);
    series.iter().enumerate().filter(move |(i, _)| i % stride == 0 || *i == last).map(|(_, s)| s)
}

fn draw_axes(svg: SvgEncoder, x: &LinearScale, y: &LinearScale) -> SvgEncoder {
    let (x0, x1) = x.range();
    let (y0, y1) = y.range();
    svg.line(x0, y0, x1, y0, Rgba::AXIS, 1.0).line(x0, y0, x0, y1, Rgba::AXIS, 1.0)
}

fn draw_density(
    mut svg: SvgEncoder,
    grid: &DensityGrid,
    x: &LinearScale,
    y: &LinearScale,
) -> Result<SvgEncoder> {
    let colors = ColorScale::density(grid.max_count())?;
    for cell in grid.cells() {
        let (dx0, dy0, dx1, dy1) = grid.cell_rect(cell.i, cell.j);
        let (px0, px1) = (x.scale(dx0), x.scale(dx1));
        let (py0, py1) = (y.scale(dy0), y.scale(dy1));
        svg = svg.rect(
            px0.min(px1),
            py0.min(py1),
            (px1 - px0).abs().max(1.0),
            (py1 - py0).abs().max(1.0),
            colors.scale(cell.count as f64),
        );
    }
    Ok(svg)
}
