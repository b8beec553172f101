//! The time-windowed forcing provider.
//!
//! [`Forcing`] is a forward finite-difference buffer over the frames of
//! one or more forcing files. It holds two frames `(U0, V0)` at step
//! `T0` and `(U1, V1)` at step `T1`, the per-step derivative
//! `dU = (U1 - U0) / (T1 - T0)`, and the fields `(U, V)` valid at the
//! current model step. After [`update`](Forcing::update) returns,
//! `T0 <= step < T1` holds unless the last frame has been reached.
//!
//! The held fields are overwritten in place on every update. Nothing
//! borrowed from a `Forcing` survives the next `update` call, which the
//! borrow checker enforces.

use std::fs::File;
use std::io::BufReader;
use std::mem;
use std::path::PathBuf;
use std::sync::Arc;

use drift_core::grid::nearest_index;
use drift_core::{Clock, FieldError, Grid, VelocityField};
use drift_grid::interp::{bilinear_by, nearest_layer, vertical_stencil};
use indexmap::IndexMap;
use tracing::{debug, info, Span};

use crate::codec::{ForcingFile, ForcingFrame, ForcingLayout};
use crate::error::ForcingError;
use crate::index::FrameIndex;

/// Where forcing comes from and which scalar fields must be held.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ForcingConfig {
    /// Forcing files, in time order.
    pub sources: Vec<PathBuf>,
    /// Scalar fields consumed by the behavior module.
    pub fields: Vec<String>,
}

struct OpenSource {
    index: usize,
    file: ForcingFile<BufReader<File>>,
}

#[derive(Clone, Copy, Debug)]
struct Window {
    lower: usize,
    upper: Option<usize>,
    lower_step: f64,
    upper_step: f64,
}

/// Velocity and scalar fields for the current model step.
pub struct Forcing {
    grid: Arc<dyn Grid>,
    sources: Vec<PathBuf>,
    layout: ForcingLayout,
    index: FrameIndex,
    fields: Vec<String>,
    open: Option<OpenSource>,
    furthest_source: usize,
    u_mask: Vec<bool>,
    v_mask: Vec<bool>,
    window: Window,
    u0: Vec<f64>,
    v0: Vec<f64>,
    u1: Vec<f64>,
    v1: Vec<f64>,
    du: Vec<f64>,
    dv: Vec<f64>,
    u: Vec<f64>,
    v: Vec<f64>,
    scalars: IndexMap<String, Vec<f64>>,
    next_scalars: IndexMap<String, Vec<f64>>,
    current: Option<u64>,
    span: Span,
}

impl Forcing {
    /// Index every source, check it against `grid` and `clock`, and
    /// seed the window from the latest frame at or before the start.
    ///
    /// # Errors
    ///
    /// [`ForcingError::Data`] for unreadable sources and
    /// [`ForcingError::Config`] for shape mismatches, non-increasing or
    /// duplicate frame times, missing consumed fields, or frames that do
    /// not cover the simulation window.
    pub fn new(
        config: &ForcingConfig,
        grid: Arc<dyn Grid>,
        clock: &Clock,
        span: Span,
    ) -> Result<Self, ForcingError> {
        let mut layout: Option<ForcingLayout> = None;
        let mut per_source = Vec::with_capacity(config.sources.len());
        for path in &config.sources {
            let file = ForcingFile::open_path(path)?;
            match &layout {
                None => layout = Some(file.layout().clone()),
                Some(first) if first != file.layout() => {
                    return Err(ForcingError::config(format!(
                        "{} does not have the layout of the first forcing source",
                        path.display()
                    )));
                }
                Some(_) => {}
            }
            debug!(
                parent: &span,
                path = %path.display(),
                frames = file.frame_count(),
                "indexed forcing source"
            );
            per_source.push(file.times().to_vec());
        }
        let layout = layout.ok_or_else(|| ForcingError::config("no forcing sources configured"))?;

        let (imax, jmax) = grid.shape();
        if (layout.imax, layout.jmax, layout.layers) != (imax, jmax, grid.layer_count()) {
            return Err(ForcingError::config(format!(
                "forcing shape {}x{}x{} does not match grid shape {imax}x{jmax}x{}",
                layout.imax,
                layout.jmax,
                layout.layers,
                grid.layer_count()
            )));
        }
        if let Some(missing) = config.fields.iter().find(|f| !layout.scalars.contains(f)) {
            return Err(ForcingError::config(format!(
                "field '{missing}' is consumed by the behavior module but absent from the forcing"
            )));
        }

        let index = FrameIndex::build(&per_source, clock)?;
        index.check_coverage(clock)?;
        let lower = index
            .initial()
            .ok_or_else(|| ForcingError::config("no forcing frame at or before the start"))?;

        let (u_mask, v_mask) = edge_masks(grid.as_ref(), imax, jmax);
        let mut forcing = Self {
            grid,
            sources: config.sources.clone(),
            layout,
            index,
            fields: config.fields.clone(),
            open: None,
            furthest_source: 0,
            u_mask,
            v_mask,
            window: Window {
                lower,
                upper: None,
                lower_step: 0.0,
                upper_step: f64::INFINITY,
            },
            u0: Vec::new(),
            v0: Vec::new(),
            u1: Vec::new(),
            v1: Vec::new(),
            du: Vec::new(),
            dv: Vec::new(),
            u: Vec::new(),
            v: Vec::new(),
            scalars: IndexMap::new(),
            next_scalars: IndexMap::new(),
            current: None,
            span,
        };
        forcing.seed(lower)?;
        info!(
            parent: &forcing.span,
            sources = forcing.sources.len(),
            frames = forcing.index.len(),
            lower_step = forcing.window.lower_step,
            upper_step = forcing.window.upper_step,
            "forcing ready"
        );
        Ok(forcing)
    }

    /// Load the initial window and the fields valid at step 0.
    fn seed(&mut self, lower: usize) -> Result<(), ForcingError> {
        let frame = self.read_frame(lower)?;
        self.window.lower_step = self.step_of(lower);
        self.u0 = frame.u;
        self.v0 = frame.v;
        self.scalars = self.registered(frame.scalars);
        self.du = vec![0.0; self.u0.len()];
        self.dv = vec![0.0; self.v0.len()];
        self.load_upper(lower + 1)?;
        self.u = self.u0.clone();
        self.v = self.v0.clone();
        extrapolate(&mut self.u, &self.u0, &self.du, -self.window.lower_step);
        extrapolate(&mut self.v, &self.v0, &self.dv, -self.window.lower_step);
        Ok(())
    }

    /// Advance the held fields to model step `step`.
    ///
    /// At a step that coincides with a forcing frame the held fields are
    /// that frame exactly. Reaching the window's upper bound reads the
    /// next frame, opening the next source if needed. Consecutive steps
    /// inside a window add one derivative increment; a jump of several
    /// steps recomputes the fields from the lower frame.
    ///
    /// # Errors
    ///
    /// [`ForcingError::Rewind`] if `step` precedes the current step,
    /// [`ForcingError::Exhausted`] if it lies past the last frame, and
    /// [`ForcingError::Data`] if a frame cannot be read. Repeating the
    /// current step is a no-op.
    pub fn update(&mut self, step: u64) -> Result<(), ForcingError> {
        if let Some(current) = self.current {
            if step < current {
                return Err(ForcingError::Rewind {
                    current,
                    requested: step,
                });
            }
            if step == current {
                return Ok(());
            }
        }
        let t = step as f64;
        if self.index.entries().last().is_some_and(|e| t > e.step) {
            return Err(ForcingError::Exhausted { step });
        }

        let mut shifted = false;
        while t >= self.window.upper_step {
            self.shift()?;
            shifted = true;
        }

        if t == self.window.lower_step {
            self.u.copy_from_slice(&self.u0);
            self.v.copy_from_slice(&self.v0);
        } else if !shifted && self.current.is_some_and(|c| c + 1 == step) {
            add_scaled(&mut self.u, &self.du, 1.0);
            add_scaled(&mut self.v, &self.dv, 1.0);
        } else {
            let lag = t - self.window.lower_step;
            extrapolate(&mut self.u, &self.u0, &self.du, lag);
            extrapolate(&mut self.v, &self.v0, &self.dv, lag);
        }
        self.current = Some(step);
        Ok(())
    }

    /// Move the window forward by one frame.
    fn shift(&mut self) -> Result<(), ForcingError> {
        let Some(upper) = self.window.upper else {
            return Ok(());
        };
        mem::swap(&mut self.u0, &mut self.u1);
        mem::swap(&mut self.v0, &mut self.v1);
        self.scalars = mem::take(&mut self.next_scalars);
        self.window.lower = upper;
        self.window.lower_step = self.window.upper_step;
        self.load_upper(upper + 1)?;
        debug!(
            parent: &self.span,
            frame = self.window.lower,
            lower_step = self.window.lower_step,
            upper_step = self.window.upper_step,
            "forcing window shifted"
        );
        Ok(())
    }

    /// Read frame `n` as the window's upper frame, or close the window
    /// on the last frame when `n` is past the end.
    fn load_upper(&mut self, n: usize) -> Result<(), ForcingError> {
        if n >= self.index.len() {
            self.window.upper = None;
            self.window.upper_step = f64::INFINITY;
            self.du.fill(0.0);
            self.dv.fill(0.0);
            return Ok(());
        }
        let frame = self.read_frame(n)?;
        self.u1 = frame.u;
        self.v1 = frame.v;
        self.next_scalars = self.registered(frame.scalars);
        self.window.upper = Some(n);
        self.window.upper_step = self.step_of(n);

        let span = self.window.upper_step - self.window.lower_step;
        derivative(&mut self.du, &self.u0, &self.u1, span);
        derivative(&mut self.dv, &self.v0, &self.v1, span);
        Ok(())
    }

    fn step_of(&self, n: usize) -> f64 {
        self.index.get(n).map_or(f64::INFINITY, |e| e.step)
    }

    fn registered(&self, mut scalars: IndexMap<String, Vec<f64>>) -> IndexMap<String, Vec<f64>> {
        scalars.retain(|name, _| self.fields.contains(name));
        scalars
    }

    /// Read indexed frame `n`, switching sources forward as needed, and
    /// zero velocities on edges that touch land.
    fn read_frame(&mut self, n: usize) -> Result<ForcingFrame, ForcingError> {
        let entry = *self
            .index
            .get(n)
            .ok_or_else(|| ForcingError::config(format!("forcing frame {n} is not indexed")))?;
        if entry.source < self.furthest_source {
            return Err(ForcingError::config(format!(
                "forcing source {} would be reopened after source {}",
                entry.source, self.furthest_source
            )));
        }
        if self.open.as_ref().map(|o| o.index) != Some(entry.source) {
            let path = &self.sources[entry.source];
            info!(parent: &self.span, path = %path.display(), "opening forcing source");
            self.open = Some(OpenSource {
                index: entry.source,
                file: ForcingFile::open_path(path)?,
            });
            self.furthest_source = entry.source;
        }
        let Some(open) = self.open.as_mut() else {
            return Err(ForcingError::config("forcing source is not open"));
        };
        let mut frame = open.file.read_frame(entry.local)?;
        apply_mask(&mut frame.u, &self.u_mask);
        apply_mask(&mut frame.v, &self.v_mask);
        Ok(frame)
    }

    /// Release the open source file. A later update reopens sources as
    /// needed, never one earlier than the last opened.
    pub fn close(&mut self) {
        if self.open.take().is_some() {
            debug!(parent: &self.span, "forcing source closed");
        }
    }

    /// Whether a source file is currently open.
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// The step most recently passed to [`update`](Forcing::update).
    pub fn current_step(&self) -> Option<u64> {
        self.current
    }

    /// Model steps `(T0, T1)` of the window's frames; `T1` is infinite
    /// once the last frame is held.
    pub fn window(&self) -> (f64, f64) {
        (self.window.lower_step, self.window.upper_step)
    }

    /// The held `(U, V)` arrays for the current step.
    pub fn held_velocity(&self) -> (&[f64], &[f64]) {
        (&self.u, &self.v)
    }

    /// The global frame index.
    pub fn frame_index(&self) -> &FrameIndex {
        &self.index
    }

    /// Array shape and scalar inventory of the sources.
    pub fn layout(&self) -> &ForcingLayout {
        &self.layout
    }

    /// Scalar fields held for the behavior module.
    pub fn registered_fields(&self) -> &[String] {
        &self.fields
    }

    /// One layer of a staggered component at fractional array position
    /// `(fx, fy)`, extrapolated by `tstep` steps along the derivative.
    #[allow(clippy::too_many_arguments)]
    fn sample_layer(
        held: &[f64],
        deriv: &[f64],
        nx: usize,
        ny: usize,
        layer: usize,
        fx: f64,
        fy: f64,
        tstep: f64,
    ) -> f64 {
        let base = layer * nx * ny;
        bilinear_by(nx, ny, fx, fy, |n| {
            held[base + n] + tstep * deriv[base + n]
        })
    }
}

impl VelocityField for Forcing {
    fn velocity(&self, x: f64, y: f64, z: f64, tstep: f64) -> (f64, f64) {
        let (imax, jmax) = (self.layout.imax, self.layout.jmax);
        let column = self
            .grid
            .layer_depths(nearest_index(x, imax), nearest_index(y, jmax));
        let (lo, hi, w) = vertical_stencil(column, z);

        let u_at = |k| Self::sample_layer(&self.u, &self.du, imax - 1, jmax, k, x - 0.5, y, tstep);
        let v_at = |k| Self::sample_layer(&self.v, &self.dv, imax, jmax - 1, k, x, y - 0.5, tstep);
        if lo == hi {
            (u_at(lo), v_at(lo))
        } else {
            (
                w * u_at(lo) + (1.0 - w) * u_at(hi),
                w * v_at(lo) + (1.0 - w) * v_at(hi),
            )
        }
    }

    fn field(&self, x: f64, y: f64, z: f64, name: &str) -> Result<f64, FieldError> {
        let values = self
            .scalars
            .get(name)
            .ok_or_else(|| FieldError::UnknownField {
                name: name.to_string(),
            })?;
        let (imax, jmax) = (self.layout.imax, self.layout.jmax);
        let (i, j) = (nearest_index(x, imax), nearest_index(y, jmax));
        let k = nearest_layer(self.grid.layer_depths(i, j), z);
        Ok(values[(k * jmax + j) * imax + i])
    }
}

// ── Array helpers ───────────────────────────────────────────────

/// Sea masks of the u-points and v-points: an edge is wet only when
/// both rho cells it separates are sea.
fn edge_masks(grid: &dyn Grid, imax: usize, jmax: usize) -> (Vec<bool>, Vec<bool>) {
    let mut u_mask = Vec::with_capacity(jmax * (imax - 1));
    for j in 0..jmax {
        for i in 0..imax - 1 {
            u_mask.push(grid.is_sea_cell(i, j) && grid.is_sea_cell(i + 1, j));
        }
    }
    let mut v_mask = Vec::with_capacity((jmax - 1) * imax);
    for j in 0..jmax - 1 {
        for i in 0..imax {
            v_mask.push(grid.is_sea_cell(i, j) && grid.is_sea_cell(i, j + 1));
        }
    }
    (u_mask, v_mask)
}

/// Zero every layer's values on dry edges.
fn apply_mask(values: &mut [f64], mask: &[bool]) {
    for layer in values.chunks_mut(mask.len()) {
        for (v, &wet) in layer.iter_mut().zip(mask) {
            if !wet {
                *v = 0.0;
            }
        }
    }
}

fn derivative(out: &mut Vec<f64>, from: &[f64], to: &[f64], steps: f64) {
    out.clear();
    out.extend(from.iter().zip(to).map(|(a, b)| (b - a) / steps));
}

fn add_scaled(values: &mut [f64], deriv: &[f64], factor: f64) {
    for (v, d) in values.iter_mut().zip(deriv) {
        *v += factor * d;
    }
}

fn extrapolate(out: &mut [f64], base: &[f64], deriv: &[f64], lag: f64) {
    for ((o, b), d) in out.iter_mut().zip(base).zip(deriv) {
        *o = b + lag * d;
    }
}
