//! Benchmark profiles and utilities for the Drift particle-tracking engine.
//!
//! - [`reference_grid`]: 200x200 grid with a square island
//! - [`EddyField`]: an analytic, time-varying eddy
//! - [`seed_batch`]: deterministic particle placement via seed
//! - [`reference_state`]: an ensemble holding a seeded batch

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use chrono::NaiveDate;
use drift_core::{Clock, FieldError, Grid, ParticleBatch, Pid, VelocityField};
use drift_grid::RectGrid;
use drift_state::{State, StateConfig};
use indexmap::IndexMap;
use tracing::Span;

/// Side length of [`reference_grid`].
pub const GRID_SIZE: usize = 200;

/// Build the reference grid: 200x200 cells of 500 m, 80 m deep, five
/// sigma layers, with a 20x20 island in the middle.
pub fn reference_grid() -> RectGrid {
    let n = GRID_SIZE * GRID_SIZE;
    let island = 90..110;
    let sea = (0..n)
        .map(|k| {
            let (i, j) = (k % GRID_SIZE, k / GRID_SIZE);
            !(island.contains(&i) && island.contains(&j))
        })
        .collect();
    RectGrid::builder(GRID_SIZE, GRID_SIZE)
        .uniform_depth(80.0)
        .sea_mask(sea)
        .spacing(500.0, 500.0)
        .sigma_layers(vec![0.1, 0.3, 0.5, 0.7, 0.9])
        .build()
        .unwrap()
}

/// Solid-body eddy around the grid centre whose speed pulses with the
/// fractional step.
#[derive(Clone, Copy, Debug)]
pub struct EddyField {
    /// Peak speed at the grid edge, m/s.
    pub speed: f64,
}

impl VelocityField for EddyField {
    fn velocity(&self, x: f64, y: f64, _z: f64, tstep: f64) -> (f64, f64) {
        let c = GRID_SIZE as f64 / 2.0;
        let (dx, dy) = ((x - c) / c, (y - c) / c);
        let pulse = 1.0 + 0.1 * tstep;
        (-dy * self.speed * pulse, dx * self.speed * pulse)
    }

    fn field(&self, _x: f64, _y: f64, _z: f64, name: &str) -> Result<f64, FieldError> {
        Err(FieldError::UnknownField {
            name: name.to_string(),
        })
    }
}

/// Place `n` particles deterministically at sea on `grid`, starting at
/// pid `first`.
pub fn seed_batch(grid: &dyn Grid, n: usize, first: u64, seed: u64) -> ParticleBatch {
    let extent = grid.extent();
    let mut batch = ParticleBatch {
        pid: Vec::with_capacity(n),
        x: Vec::with_capacity(n),
        y: Vec::with_capacity(n),
        z: Vec::with_capacity(n),
        attributes: IndexMap::new(),
    };
    let mut h = seed;
    let mut next = || {
        h = h
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (h >> 11) as f64 / (1u64 << 53) as f64
    };
    while batch.len() < n {
        let x = extent.xmin + next() * (extent.xmax - extent.xmin);
        let y = extent.ymin + next() * (extent.ymax - extent.ymin);
        let z = next() * 40.0;
        if grid.atsea(x, y) {
            batch.pid.push(Pid(first + batch.len() as u64));
            batch.x.push(x);
            batch.y.push(y);
            batch.z.push(z);
        }
    }
    batch
}

/// The clock of every benchmark: one day of 10-minute steps.
pub fn reference_clock() -> Clock {
    let start = NaiveDate::from_ymd_opt(2015, 4, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    Clock::new(start, start + chrono::Duration::days(1), 600).unwrap()
}

/// An ensemble of `n` seeded particles with one instance variable.
pub fn reference_state(grid: &dyn Grid, n: usize, seed: u64) -> State {
    let config = StateConfig {
        instance_variables: vec!["age".into()],
        ..StateConfig::default()
    };
    let mut state = State::new(&config, reference_clock(), Span::none());
    state.append(seed_batch(grid, n, 0, seed)).unwrap();
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_particles_are_at_sea_and_deterministic() {
        let grid = reference_grid();
        let a = seed_batch(&grid, 500, 10, 42);
        let b = seed_batch(&grid, 500, 10, 42);
        assert_eq!(a, b);
        assert_eq!(a.pid.first(), Some(&Pid(10)));
        assert_eq!(a.pid.last(), Some(&Pid(509)));
        assert!(a.x.iter().zip(&a.y).all(|(&x, &y)| grid.atsea(x, y)));
    }

    #[test]
    fn reference_state_holds_the_batch() {
        let grid = reference_grid();
        let state = reference_state(&grid, 1000, 7);
        assert_eq!(state.len(), 1000);
        assert_eq!(state.next_pid(), Pid(1000));
        assert_eq!(state.instance("age").unwrap().len(), 1000);
    }

    #[test]
    fn eddy_turns_around_the_centre() {
        let field = EddyField { speed: 0.5 };
        let c = GRID_SIZE as f64 / 2.0;
        assert_eq!(field.velocity(c, c, 0.0, 0.0), (0.0, 0.0));
        let (u, v) = field.velocity(2.0 * c, c, 0.0, 0.0);
        assert_eq!((u, v), (0.0, 0.5));
    }
}
