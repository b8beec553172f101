//! The [`Grid`] capability trait.
//!
//! A grid answers geometric questions about positions in grid
//! coordinates: `X` runs along the first horizontal index and `Y` along
//! the second, with cell centres at integer coordinates. Depth `Z` is
//! positive downwards in metres.
//!
//! The engine only consumes this interface; concrete backends live in
//! `drift-grid` (and in `drift-test-utils` for tests).

use crate::extent::Extent;

/// Geometric queries on a discretized ocean model grid.
///
/// # Object safety
///
/// This trait is object-safe; the engine shares a grid as
/// `Arc<dyn Grid>` between the forcing provider and the model.
pub trait Grid: Send + Sync {
    /// Horizontal array shape `(imax, jmax)` of cell-centred points.
    fn shape(&self) -> (usize, usize);

    /// Number of vertical layers in every water column.
    fn layer_count(&self) -> usize;

    /// The navigable domain. [`ingrid`](Grid::ingrid) is strict
    /// containment in this extent.
    fn extent(&self) -> Extent;

    /// Local metric distances `(dx, dy)` in metres at the nearest cell.
    fn metric(&self, x: f64, y: f64) -> (f64, f64);

    /// Water depth at `(x, y)`, positive, in metres.
    fn depth(&self, x: f64, y: f64) -> f64;

    /// Whether `(x, y)` lies inside the navigable domain.
    fn ingrid(&self, x: f64, y: f64) -> bool {
        self.extent().contains(x, y)
    }

    /// Whether the nearest cell of `(x, y)` is land.
    fn onland(&self, x: f64, y: f64) -> bool;

    /// Whether the nearest cell of `(x, y)` is sea.
    fn atsea(&self, x: f64, y: f64) -> bool {
        !self.onland(x, y)
    }

    /// Geographic position `(lon, lat)` in degrees.
    fn lonlat(&self, x: f64, y: f64) -> (f64, f64);

    /// Grid position of a geographic point.
    fn ll2xy(&self, lon: f64, lat: f64) -> (f64, f64);

    /// Clamp a position onto the navigable domain, for evaluating
    /// fields at intermediate integration stages.
    fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        self.extent().clamp(x, y)
    }

    /// Whether array cell `(i, j)` is sea. Indices are clamped to the
    /// array shape.
    fn is_sea_cell(&self, i: usize, j: usize) -> bool;

    /// Layer-centre depths of the water column at array cell `(i, j)`,
    /// positive down and increasing with layer index.
    fn layer_depths(&self, i: usize, j: usize) -> &[f64];

    // ── Slice helpers ───────────────────────────────────────────

    /// [`metric`](Grid::metric) over paired coordinate slices.
    fn sample_metric(&self, x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
        x.iter().zip(y).map(|(&x, &y)| self.metric(x, y)).unzip()
    }

    /// [`depth`](Grid::depth) over paired coordinate slices.
    fn sample_depth(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        x.iter().zip(y).map(|(&x, &y)| self.depth(x, y)).collect()
    }

    /// [`ingrid`](Grid::ingrid) over paired coordinate slices.
    fn ingrid_mask(&self, x: &[f64], y: &[f64]) -> Vec<bool> {
        x.iter().zip(y).map(|(&x, &y)| self.ingrid(x, y)).collect()
    }

    /// [`onland`](Grid::onland) over paired coordinate slices.
    fn onland_mask(&self, x: &[f64], y: &[f64]) -> Vec<bool> {
        x.iter().zip(y).map(|(&x, &y)| self.onland(x, y)).collect()
    }

    /// [`atsea`](Grid::atsea) over paired coordinate slices.
    fn atsea_mask(&self, x: &[f64], y: &[f64]) -> Vec<bool> {
        x.iter().zip(y).map(|(&x, &y)| self.atsea(x, y)).collect()
    }
}

/// Nearest array index of a coordinate, clamped to `0..len`.
///
/// Shared by grid backends and samplers so that every "nearest cell"
/// lookup rounds the same way.
pub fn nearest_index(coord: f64, len: usize) -> usize {
    if len == 0 || coord.is_nan() || coord <= 0.0 {
        return 0;
    }
    (coord.round() as usize).min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_index_rounds_and_clamps() {
        assert_eq!(nearest_index(2.49, 10), 2);
        assert_eq!(nearest_index(2.5, 10), 3);
        assert_eq!(nearest_index(-4.0, 10), 0);
        assert_eq!(nearest_index(40.0, 10), 9);
        assert_eq!(nearest_index(f64::NAN, 10), 0);
    }
}
