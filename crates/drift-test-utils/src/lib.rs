//! Test utilities and mock types for Drift development.
//!
//! Provides mock implementations of the capability traits
//! ([`Grid`], [`VelocityField`]) and file fixtures for forcing and
//! release inputs.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use drift_core::grid::nearest_index;
use drift_core::{parse_timestamp, Extent, FieldError, Grid, VelocityField};

/// Parse a timestamp literal, panicking on bad input.
pub fn ts(text: &str) -> NaiveDateTime {
    parse_timestamp(text).unwrap_or_else(|| panic!("bad timestamp literal {text:?}"))
}

// ── MockGrid ────────────────────────────────────────────────────

/// A flat-bottomed box grid with uniform metrics.
///
/// The navigable extent is `(1, imax - 2) x (1, jmax - 2)`, matching
/// the real rectilinear backend. Geographic coordinates are the grid
/// coordinates scaled by `degrees_per_cell`.
#[derive(Clone, Debug)]
pub struct MockGrid {
    imax: usize,
    jmax: usize,
    dx: f64,
    dy: f64,
    depth: f64,
    layers: Vec<f64>,
    land: HashSet<(usize, usize)>,
    degrees_per_cell: f64,
}

impl MockGrid {
    /// All-sea `imax x jmax` box, 1 km cells, 100 m deep, one layer.
    pub fn open_box(imax: usize, jmax: usize) -> Self {
        Self {
            imax,
            jmax,
            dx: 1000.0,
            dy: 1000.0,
            depth: 100.0,
            layers: vec![50.0],
            land: HashSet::new(),
            degrees_per_cell: 0.01,
        }
    }

    pub fn with_spacing(mut self, dx: f64, dy: f64) -> Self {
        self.dx = dx;
        self.dy = dy;
        self
    }

    /// Set the water depth; layer centres are spread evenly over it.
    pub fn with_depth(mut self, depth: f64, layers: usize) -> Self {
        self.depth = depth;
        self.layers = (0..layers)
            .map(|k| depth * (k as f64 + 0.5) / layers as f64)
            .collect();
        self
    }

    pub fn with_land(mut self, cells: &[(usize, usize)]) -> Self {
        self.land.extend(cells.iter().copied());
        self
    }
}

impl Grid for MockGrid {
    fn shape(&self) -> (usize, usize) {
        (self.imax, self.jmax)
    }

    fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn extent(&self) -> Extent {
        Extent::new(1.0, self.imax as f64 - 2.0, 1.0, self.jmax as f64 - 2.0)
    }

    fn metric(&self, _x: f64, _y: f64) -> (f64, f64) {
        (self.dx, self.dy)
    }

    fn depth(&self, _x: f64, _y: f64) -> f64 {
        self.depth
    }

    fn onland(&self, x: f64, y: f64) -> bool {
        let cell = (nearest_index(x, self.imax), nearest_index(y, self.jmax));
        self.land.contains(&cell)
    }

    fn lonlat(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.degrees_per_cell, y * self.degrees_per_cell)
    }

    fn ll2xy(&self, lon: f64, lat: f64) -> (f64, f64) {
        (lon / self.degrees_per_cell, lat / self.degrees_per_cell)
    }

    fn is_sea_cell(&self, i: usize, j: usize) -> bool {
        !self.land.contains(&(i, j))
    }

    fn layer_depths(&self, _i: usize, _j: usize) -> &[f64] {
        &self.layers
    }
}

// ── Velocity fields ─────────────────────────────────────────────

/// Spatially and temporally uniform current, with optional constant
/// scalar fields.
#[derive(Clone, Debug, Default)]
pub struct UniformField {
    pub u: f64,
    pub v: f64,
    scalars: HashMap<String, f64>,
}

impl UniformField {
    pub fn new(u: f64, v: f64) -> Self {
        Self {
            u,
            v,
            scalars: HashMap::new(),
        }
    }

    /// A field with no current at all.
    pub fn still() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn with_scalar(mut self, name: &str, value: f64) -> Self {
        self.scalars.insert(name.to_string(), value);
        self
    }
}

impl VelocityField for UniformField {
    fn velocity(&self, _x: f64, _y: f64, _z: f64, _tstep: f64) -> (f64, f64) {
        (self.u, self.v)
    }

    fn field(&self, _x: f64, _y: f64, _z: f64, name: &str) -> Result<f64, FieldError> {
        self.scalars
            .get(name)
            .copied()
            .ok_or_else(|| FieldError::UnknownField {
                name: name.to_string(),
            })
    }
}

/// A velocity field defined by a closure of `(x, y, z, tstep)`.
pub struct FnField<F>(pub F);

impl<F> VelocityField for FnField<F>
where
    F: Fn(f64, f64, f64, f64) -> (f64, f64),
{
    fn velocity(&self, x: f64, y: f64, z: f64, tstep: f64) -> (f64, f64) {
        (self.0)(x, y, z, tstep)
    }

    fn field(&self, _x: f64, _y: f64, _z: f64, name: &str) -> Result<f64, FieldError> {
        Err(FieldError::UnknownField {
            name: name.to_string(),
        })
    }
}
