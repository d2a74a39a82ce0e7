//! Density and regression overlay tests over generated point clouds.
//!
//! Run: cargo test --test overlay_test

#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use streamchart::density::Bounds;
use streamchart::prelude::*;

fn cloud(count: usize, seed: u64) -> Vec<Point2D> {
    generate_cloud(count, &CloudParams::default(), &mut seeded(seed)).unwrap()
}

// ============================================================================
// Density
// ============================================================================

/// Counts add up to the number of points at every resolution.
#[test]
fn bin_counts_sum_to_point_count() {
    let points = cloud(50_000, 1);
    for (x_bins, y_bins) in [(1, 1), (30, 20), (100, 3), (256, 256)] {
        let cells = bin2d(&points, x_bins, y_bins).unwrap();
        assert_eq!(cells.iter().map(|c| c.count).sum::<u64>(), 50_000);
        assert!(cells.iter().all(|c| c.i < x_bins && c.j < y_bins && c.count > 0));
    }
}

/// Resolution far beyond the point count only costs occupied cells.
#[test]
fn huge_resolution_is_accepted() {
    let points = cloud(10_000, 8);
    let grid = DensityBinner::new(1 << 31, 1 << 31).bin(&points).unwrap();
    assert_eq!(grid.total(), 10_000);
    assert!(grid.occupied() <= 10_000);
}

/// Cells are row-major and unique.
#[test]
fn cells_are_ordered() {
    let cells = bin2d(&cloud(5_000, 2), 30, 20).unwrap();
    assert!(cells.windows(2).all(|w| (w[0].i, w[0].j) < (w[1].i, w[1].j)));
}

/// The bounding-box maxima land in the last bins, not one past them.
#[test]
fn max_edge_is_clamped() {
    let points = [Point2D::new(0.0, 0.0), Point2D::new(10.0, 10.0)];
    let grid = DensityBinner::new(5, 5).bin(&points).unwrap();
    assert_eq!(grid.count(0, 0), Some(1));
    assert_eq!(grid.count(4, 4), Some(1));
}

#[test]
fn zero_range_policies() {
    let flat = [Point2D::new(1.0, 0.0), Point2D::new(1.0, 5.0), Point2D::new(1.0, 10.0)];

    let grid = DensityBinner::new(4, 4).bin(&flat).unwrap();
    assert!(grid.cells().all(|c| c.i == 0));
    assert_eq!(grid.total(), 3);

    let rejected = DensityBinner::new(4, 4).zero_range(ZeroRange::Reject).bin(&flat);
    assert!(matches!(rejected, Err(Error::DegenerateInput(_))));
}

#[test]
fn invalid_binning_arguments() {
    assert!(matches!(bin2d(&[], 3, 3), Err(Error::InvalidArgument(_))));
    assert!(matches!(bin2d(&cloud(10, 3), 0, 3), Err(Error::InvalidArgument(_))));
    let nan = [Point2D::new(f64::NAN, 0.0)];
    assert!(matches!(bin2d(&nan, 3, 3), Err(Error::InvalidArgument(_))));
}

/// Grid bounds are the tight bounding box of the input.
#[test]
fn grid_bounds_match_points() {
    let points = cloud(1_000, 4);
    let grid = DensityBinner::new(10, 10).bin(&points).unwrap();
    assert_eq!(grid.bounds(), Bounds::from_points(&points).unwrap());
}

// ============================================================================
// Regression
// ============================================================================

/// A large cloud recovers the generating trend.
#[test]
fn fit_recovers_cloud_trend() {
    let params = CloudParams::default();
    let line = fit(&cloud(200_000, 5)).unwrap();
    assert_relative_eq!(line.slope, params.slope, epsilon = 0.02);
    assert_relative_eq!(line.intercept, params.intercept, epsilon = 0.1);
    assert!(line.r_squared > 0.5);
}

#[test]
fn fit_segment_spans_cloud() {
    let points = cloud(1_000, 6);
    let bounds = Bounds::from_points(&points).unwrap();
    let [a, b] = fit(&points).unwrap().segment();
    assert_relative_eq!(a.x, bounds.min_x);
    assert_relative_eq!(b.x, bounds.max_x);
}

#[test]
fn fit_rejects_vertical_cloud() {
    let params = CloudParams { x_std: 0.0, ..CloudParams::default() };
    let points = generate_cloud(100, &params, &mut seeded(7)).unwrap();
    assert!(matches!(fit(&points), Err(Error::DegenerateInput(_))));
}
