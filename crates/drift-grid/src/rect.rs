//! [`RectGrid`]: a rectilinear C-grid with sigma layers.
//!
//! Cell centres (rho points) sit at integer grid coordinates `X = i`,
//! `Y = j`. U velocities live half a cell east of the centres and V
//! velocities half a cell north, as on an Arakawa C-grid. The vertical
//! is terrain following: layer `k` of a column of depth `H` sits at
//! `sigma[k] * H`.

use drift_core::grid::nearest_index;
use drift_core::{Extent, Grid};

use crate::error::GridError;
use crate::interp::bilinear;

/// Regular longitude/latitude reference: `lon = lon0 + X * dlon`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Georeference {
    /// Longitude of cell (0, 0), degrees east.
    pub lon0: f64,
    /// Latitude of cell (0, 0), degrees north.
    pub lat0: f64,
    /// Longitude increment per X unit.
    pub dlon: f64,
    /// Latitude increment per Y unit.
    pub dlat: f64,
}

impl Default for Georeference {
    fn default() -> Self {
        Self {
            lon0: 0.0,
            lat0: 60.0,
            dlon: 0.01,
            dlat: 0.005,
        }
    }
}

/// Index window restricting the navigable domain: `i0..i1`, `j0..j1`
/// (upper bounds exclusive).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subgrid {
    /// First X index.
    pub i0: usize,
    /// One past the last X index.
    pub i1: usize,
    /// First Y index.
    pub j0: usize,
    /// One past the last Y index.
    pub j1: usize,
}

/// Rectilinear ocean grid.
///
/// Built with [`RectGrid::builder`] or read from a grid file with
/// [`RectGrid::read_from`](crate::codec).
#[derive(Clone, Debug, PartialEq)]
pub struct RectGrid {
    pub(crate) imax: usize,
    pub(crate) jmax: usize,
    pub(crate) depth: Vec<f64>,
    pub(crate) sea: Vec<bool>,
    pub(crate) dx: Vec<f64>,
    pub(crate) dy: Vec<f64>,
    pub(crate) sigma: Vec<f64>,
    pub(crate) georef: Georeference,
    pub(crate) subgrid: Subgrid,
    /// Layer-centre depths, `layers` contiguous values per column.
    z_r: Vec<f64>,
    extent: Extent,
}

/// Builder for [`RectGrid`].
///
/// Required: the shape passed to [`RectGrid::builder`]. Everything else
/// defaults to a uniform 100 m deep, all-sea grid with 1 km cells and a
/// single mid-depth layer.
pub struct RectGridBuilder {
    imax: usize,
    jmax: usize,
    depth: Option<Vec<f64>>,
    sea: Option<Vec<bool>>,
    dx: Option<Vec<f64>>,
    dy: Option<Vec<f64>>,
    sigma: Vec<f64>,
    georef: Georeference,
    subgrid: Option<Subgrid>,
}

impl RectGrid {
    /// Start building an `imax x jmax` grid.
    pub fn builder(imax: usize, jmax: usize) -> RectGridBuilder {
        RectGridBuilder {
            imax,
            jmax,
            depth: None,
            sea: None,
            dx: None,
            dy: None,
            sigma: vec![0.5],
            georef: Georeference::default(),
            subgrid: None,
        }
    }

    /// Sigma fractions of the layer centres, increasing downwards.
    pub fn sigma(&self) -> &[f64] {
        &self.sigma
    }

    /// The geographic reference.
    pub fn georeference(&self) -> Georeference {
        self.georef
    }

    /// The index window of the navigable domain.
    pub fn subgrid(&self) -> Subgrid {
        self.subgrid
    }

    /// Depth at array cell `(i, j)`.
    pub fn cell_depth(&self, i: usize, j: usize) -> f64 {
        self.depth[self.flat(i, j)]
    }

    fn flat(&self, i: usize, j: usize) -> usize {
        j.min(self.jmax - 1) * self.imax + i.min(self.imax - 1)
    }

    fn nearest_cell(&self, x: f64, y: f64) -> usize {
        self.flat(nearest_index(x, self.imax), nearest_index(y, self.jmax))
    }
}

impl RectGridBuilder {
    /// Per-cell water depth in metres (row-major, `imax * jmax`).
    pub fn depth(mut self, depth: Vec<f64>) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Uniform water depth in metres.
    pub fn uniform_depth(mut self, depth: f64) -> Self {
        self.depth = Some(vec![depth; self.imax * self.jmax]);
        self
    }

    /// Per-cell sea mask (`true` = sea).
    pub fn sea_mask(mut self, sea: Vec<bool>) -> Self {
        self.sea = Some(sea);
        self
    }

    /// Uniform cell size in metres.
    pub fn spacing(mut self, dx: f64, dy: f64) -> Self {
        let n = self.imax * self.jmax;
        self.dx = Some(vec![dx; n]);
        self.dy = Some(vec![dy; n]);
        self
    }

    /// Per-cell metric distances in metres.
    pub fn metrics(mut self, dx: Vec<f64>, dy: Vec<f64>) -> Self {
        self.dx = Some(dx);
        self.dy = Some(dy);
        self
    }

    /// Sigma fractions in `(0, 1]` of the layer centres, increasing.
    pub fn sigma_layers(mut self, sigma: Vec<f64>) -> Self {
        self.sigma = sigma;
        self
    }

    /// Geographic reference (default: 0°E 60°N, 0.01° x 0.005°).
    pub fn georeference(mut self, georef: Georeference) -> Self {
        self.georef = georef;
        self
    }

    /// Restrict the navigable domain to an index window.
    pub fn subgrid(mut self, subgrid: Subgrid) -> Self {
        self.subgrid = Some(subgrid);
        self
    }

    /// Build the grid, validating every array.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the (sub)grid is smaller than 4x4, an array has
    /// the wrong length, a depth is negative, a metric is not positive,
    /// or the sigma fractions are empty, outside `(0, 1]` or decreasing.
    pub fn build(self) -> Result<RectGrid, GridError> {
        let (imax, jmax) = (self.imax, self.jmax);
        if imax < 4 || jmax < 4 {
            return Err(GridError::TooSmall { imax, jmax });
        }
        let n = imax * jmax;
        let depth = self.depth.unwrap_or_else(|| vec![100.0; n]);
        let sea = self.sea.unwrap_or_else(|| vec![true; n]);
        let dx = self.dx.unwrap_or_else(|| vec![1000.0; n]);
        let dy = self.dy.unwrap_or_else(|| vec![1000.0; n]);
        check_len("depth", &depth, n)?;
        check_len("sea_mask", &sea, n)?;
        check_len("dx", &dx, n)?;
        check_len("dy", &dy, n)?;

        if let Some(h) = depth.iter().find(|h| !(h.is_finite() && **h >= 0.0)) {
            return Err(GridError::InvalidValue {
                name: "depth",
                reason: format!("depth must be finite and >= 0, got {h}"),
            });
        }
        for (name, metric) in [("dx", &dx), ("dy", &dy)] {
            if let Some(d) = metric.iter().find(|d| !(d.is_finite() && **d > 0.0)) {
                return Err(GridError::InvalidValue {
                    name,
                    reason: format!("metric must be finite and > 0, got {d}"),
                });
            }
        }
        if self.sigma.is_empty()
            || self.sigma.iter().any(|s| !(*s > 0.0 && *s <= 1.0))
            || self.sigma.windows(2).any(|w| w[1] < w[0])
        {
            return Err(GridError::InvalidValue {
                name: "sigma",
                reason: format!(
                    "sigma fractions must be in (0, 1] and non-decreasing, got {:?}",
                    self.sigma
                ),
            });
        }

        let subgrid = self.subgrid.unwrap_or(Subgrid {
            i0: 0,
            i1: imax,
            j0: 0,
            j1: jmax,
        });
        if subgrid.i1 > imax
            || subgrid.j1 > jmax
            || subgrid.i1 < subgrid.i0 + 4
            || subgrid.j1 < subgrid.j0 + 4
        {
            return Err(GridError::InvalidValue {
                name: "subgrid",
                reason: format!("{subgrid:?} is not a window of at least 4x4 inside {imax}x{jmax}"),
            });
        }

        let z_r = depth
            .iter()
            .flat_map(|h| self.sigma.iter().map(move |s| s * h))
            .collect();

        // One cell margin: every bilinear stencil of the staggered
        // velocity points stays inside the arrays.
        let extent = Extent::new(
            subgrid.i0 as f64 + 1.0,
            subgrid.i1 as f64 - 2.0,
            subgrid.j0 as f64 + 1.0,
            subgrid.j1 as f64 - 2.0,
        );

        Ok(RectGrid {
            imax,
            jmax,
            depth,
            sea,
            dx,
            dy,
            sigma: self.sigma,
            georef: self.georef,
            subgrid,
            z_r,
            extent,
        })
    }
}

fn check_len<T>(array: &'static str, values: &[T], expected: usize) -> Result<(), GridError> {
    if values.len() != expected {
        return Err(GridError::ShapeMismatch {
            array,
            expected,
            found: values.len(),
        });
    }
    Ok(())
}

impl Grid for RectGrid {
    fn shape(&self) -> (usize, usize) {
        (self.imax, self.jmax)
    }

    fn layer_count(&self) -> usize {
        self.sigma.len()
    }

    fn extent(&self) -> Extent {
        self.extent
    }

    fn metric(&self, x: f64, y: f64) -> (f64, f64) {
        let c = self.nearest_cell(x, y);
        (self.dx[c], self.dy[c])
    }

    fn depth(&self, x: f64, y: f64) -> f64 {
        bilinear(&self.depth, self.imax, self.jmax, x, y)
    }

    fn onland(&self, x: f64, y: f64) -> bool {
        !self.sea[self.nearest_cell(x, y)]
    }

    fn lonlat(&self, x: f64, y: f64) -> (f64, f64) {
        let g = &self.georef;
        (g.lon0 + x * g.dlon, g.lat0 + y * g.dlat)
    }

    fn ll2xy(&self, lon: f64, lat: f64) -> (f64, f64) {
        let g = &self.georef;
        ((lon - g.lon0) / g.dlon, (lat - g.lat0) / g.dlat)
    }

    fn is_sea_cell(&self, i: usize, j: usize) -> bool {
        self.sea[self.flat(i, j)]
    }

    fn layer_depths(&self, i: usize, j: usize) -> &[f64] {
        let layers = self.sigma.len();
        let start = self.flat(i, j) * layers;
        &self.z_r[start..start + layers]
    }
}
