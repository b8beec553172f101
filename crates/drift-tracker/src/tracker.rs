//! One-step particle advection with boundary handling.

use drift_core::{ConfigError, Grid, VelocityField};
use tracing::{debug, Span};

use crate::diffusion::Diffusion;
use crate::scheme::Scheme;

/// Tracker settings.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackerConfig {
    /// Integration scheme.
    pub scheme: Scheme,
    /// Model time step in seconds.
    pub dt: f64,
    /// Horizontal diffusivity in m²/s; zero disables diffusion.
    pub diffusivity: f64,
    /// Seed of the diffusion random stream.
    pub seed: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            dt: 3600.0,
            diffusivity: 0.0,
            seed: 0,
        }
    }
}

impl TrackerConfig {
    /// Reject non-positive time steps and negative or non-finite
    /// diffusivity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "dt".into(),
                reason: format!("must be finite and > 0, got {}", self.dt),
            });
        }
        if !self.diffusivity.is_finite() || self.diffusivity < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "diffusivity".into(),
                reason: format!("must be finite and >= 0, got {}", self.diffusivity),
            });
        }
        Ok(())
    }
}

/// Mutable view of the per-particle arrays the tracker touches.
///
/// All slices have one entry per particle.
pub struct Particles<'a> {
    /// X positions (grid coordinates).
    pub x: &'a mut [f64],
    /// Y positions (grid coordinates).
    pub y: &'a mut [f64],
    /// Depths, positive down.
    pub z: &'a [f64],
    /// Alive flags; cleared for particles that leave the grid.
    pub alive: &'a mut [bool],
}

/// Outcome counts of one advection step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Particles moved to their new position.
    pub moved: usize,
    /// Particles held in place because the new position is on land.
    pub blocked: usize,
    /// Particles held in place and marked dead because the new
    /// position is outside the grid.
    pub killed: usize,
}

/// Advances particle positions through one model step.
#[derive(Debug)]
pub struct Tracker {
    scheme: Scheme,
    dt: f64,
    diffusion: Option<Diffusion>,
    span: Span,
}

impl Tracker {
    /// Build a tracker, validating `config`.
    pub fn new(config: &TrackerConfig, span: Span) -> Result<Self, ConfigError> {
        config.validate()?;
        let diffusion =
            (config.diffusivity > 0.0).then(|| Diffusion::new(config.diffusivity, config.dt, config.seed));
        debug!(
            parent: &span,
            scheme = %config.scheme,
            dt = config.dt,
            diffusivity = config.diffusivity,
            "tracker ready"
        );
        Ok(Self {
            scheme: config.scheme,
            dt: config.dt,
            diffusion,
            span,
        })
    }

    /// The integration scheme.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Time step in seconds.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Diffusion settings, if enabled.
    pub fn diffusion(&self) -> Option<&Diffusion> {
        self.diffusion.as_ref()
    }

    /// Advance every alive particle by one step of `dt`.
    ///
    /// The metric is sampled once at each particle's start position.
    /// The boundary policy applies to the final candidate position only:
    /// outside the grid the particle stays put and is marked dead, on
    /// land it stays put and stays alive, otherwise it moves. Particles
    /// already marked dead are left untouched.
    pub fn advance(
        &self,
        grid: &dyn Grid,
        field: &dyn VelocityField,
        step: u64,
        particles: Particles<'_>,
    ) -> AdvanceReport {
        let Particles { x, y, z, alive } = particles;
        let mut rng = self.diffusion.as_ref().map(|d| d.rng(step));
        let mut report = AdvanceReport::default();

        for (((x, y), &z), alive) in x.iter_mut().zip(y.iter_mut()).zip(z).zip(alive.iter_mut()) {
            if !*alive {
                continue;
            }
            let (dx, dy) = grid.metric(*x, *y);
            let (sx, sy) = (self.dt / dx, self.dt / dy);
            let (mut u, mut v) = self.scheme.velocity(grid, field, *x, *y, z, sx, sy);
            if let (Some(d), Some(rng)) = (&self.diffusion, rng.as_mut()) {
                let (du, dv) = d.sample(rng);
                u += du;
                v += dv;
            }

            let (xn, yn) = (*x + u * sx, *y + v * sy);
            if !grid.ingrid(xn, yn) {
                *alive = false;
                report.killed += 1;
            } else if !grid.atsea(xn, yn) {
                report.blocked += 1;
            } else {
                *x = xn;
                *y = yn;
                report.moved += 1;
            }
        }

        debug!(
            parent: &self.span,
            step,
            moved = report.moved,
            blocked = report.blocked,
            killed = report.killed,
            "advected"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use drift_test_utils::{MockGrid, UniformField};
    use proptest::prelude::*;

    const ALL: [Scheme; 3] = [Scheme::EulerForward, Scheme::Heun, Scheme::Rk4];

    fn tracker(scheme: Scheme, dt: f64) -> Tracker {
        let config = TrackerConfig {
            scheme,
            dt,
            ..TrackerConfig::default()
        };
        Tracker::new(&config, Span::none()).unwrap()
    }

    struct Ensemble {
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
        alive: Vec<bool>,
    }

    impl Ensemble {
        fn new(points: &[(f64, f64)]) -> Self {
            Self {
                x: points.iter().map(|p| p.0).collect(),
                y: points.iter().map(|p| p.1).collect(),
                z: vec![5.0; points.len()],
                alive: vec![true; points.len()],
            }
        }

        fn advance(&mut self, t: &Tracker, grid: &MockGrid, field: &UniformField) -> AdvanceReport {
            t.advance(
                grid,
                field,
                0,
                Particles {
                    x: &mut self.x,
                    y: &mut self.y,
                    z: &self.z,
                    alive: &mut self.alive,
                },
            )
        }
    }

    #[test]
    fn config_rejects_bad_values() {
        let bad_dt = TrackerConfig {
            dt: 0.0,
            ..TrackerConfig::default()
        };
        assert!(bad_dt.validate().is_err());
        let bad_d = TrackerConfig {
            diffusivity: -1.0,
            ..TrackerConfig::default()
        };
        assert!(Tracker::new(&bad_d, Span::none()).is_err());
        let nan_d = TrackerConfig {
            diffusivity: f64::NAN,
            ..TrackerConfig::default()
        };
        assert!(nan_d.validate().is_err());
    }

    #[test]
    fn constant_current_moves_by_u_dt_over_dx() {
        let grid = MockGrid::open_box(20, 20).with_spacing(2000.0, 500.0);
        let field = UniformField::new(0.1, -0.05);
        for s in ALL {
            let mut e = Ensemble::new(&[(5.0, 10.0), (12.25, 7.5)]);
            let report = e.advance(&tracker(s, 3600.0), &grid, &field);
            assert_eq!(report.moved, 2);
            assert_relative_eq!(e.x[0], 5.0 + 0.1 * 3600.0 / 2000.0, epsilon = 1e-12);
            assert_relative_eq!(e.y[0], 10.0 - 0.05 * 3600.0 / 500.0, epsilon = 1e-12);
            assert_relative_eq!(e.x[1], 12.25 + 0.18, epsilon = 1e-12);
        }
    }

    #[test]
    fn leaving_the_grid_kills_without_moving() {
        let grid = MockGrid::open_box(10, 10);
        let field = UniformField::new(1.0, 0.0);
        for s in ALL {
            let mut e = Ensemble::new(&[(7.9, 5.0), (3.0, 5.0)]);
            let report = e.advance(&tracker(s, 600.0), &grid, &field);
            assert_eq!(e.x[0], 7.9);
            assert!(!e.alive[0]);
            assert!(e.alive[1]);
            assert_eq!(
                report,
                AdvanceReport {
                    moved: 1,
                    blocked: 0,
                    killed: 1
                }
            );
        }
    }

    #[test]
    fn land_blocks_but_keeps_alive() {
        let grid = MockGrid::open_box(10, 10).with_land(&[(5, 5)]);
        let field = UniformField::new(1.0, 0.0);
        for s in ALL {
            let mut e = Ensemble::new(&[(4.0, 5.0)]);
            let report = e.advance(&tracker(s, 1000.0), &grid, &field);
            assert_eq!((e.x[0], e.y[0]), (4.0, 5.0));
            assert!(e.alive[0]);
            assert_eq!(report.blocked, 1);
        }
    }

    #[test]
    fn particle_on_the_boundary_is_killed_by_every_scheme() {
        let grid = MockGrid::open_box(10, 10);
        let field = UniformField::still();
        for s in ALL {
            let mut e = Ensemble::new(&[(1.0, 4.0), (4.0, 8.0)]);
            let report = e.advance(&tracker(s, 3600.0), &grid, &field);
            assert_eq!(e.alive, vec![false, false], "{s}");
            assert_eq!(report.killed, 2);
        }
    }

    #[test]
    fn dead_particles_are_skipped() {
        let grid = MockGrid::open_box(10, 10);
        let field = UniformField::new(1.0, 1.0);
        let mut e = Ensemble::new(&[(4.0, 4.0)]);
        e.alive[0] = false;
        let report = e.advance(&tracker(Scheme::Rk4, 100.0), &grid, &field);
        assert_eq!(report, AdvanceReport::default());
        assert_eq!(e.x[0], 4.0);
    }

    #[test]
    fn diffusion_is_reproducible_per_step() {
        let grid = MockGrid::open_box(50, 50);
        let field = UniformField::still();
        let config = TrackerConfig {
            scheme: Scheme::EulerForward,
            dt: 600.0,
            diffusivity: 10.0,
            seed: 11,
        };
        let t = Tracker::new(&config, Span::none()).unwrap();
        let run = |step| {
            let mut x = vec![25.0; 4];
            let mut y = vec![25.0; 4];
            let mut alive = vec![true; 4];
            t.advance(
                &grid,
                &field,
                step,
                Particles {
                    x: &mut x,
                    y: &mut y,
                    z: &[0.0; 4],
                    alive: &mut alive,
                },
            );
            (x, y)
        };
        assert_eq!(run(3), run(3));
        assert_ne!(run(3), run(4));
        let (x, _) = run(3);
        assert!(x.iter().any(|&x| x != 25.0));
    }

    proptest! {
        #[test]
        fn zero_velocity_gives_zero_displacement(
            dt in 1.0f64..86_400.0,
            x in 1.01f64..17.99,
            y in 1.01f64..17.99,
        ) {
            let grid = MockGrid::open_box(20, 20);
            let field = UniformField::still();
            for s in ALL {
                let mut e = Ensemble::new(&[(x, y)]);
                e.advance(&tracker(s, dt), &grid, &field);
                prop_assert_eq!((e.x[0], e.y[0]), (x, y));
                prop_assert!(e.alive[0]);
            }
        }

        #[test]
        fn boundary_policy_is_total(
            x in 0.0f64..15.0,
            y in 0.0f64..15.0,
            u in -2.0f64..2.0,
            v in -2.0f64..2.0,
        ) {
            let grid = MockGrid::open_box(15, 15).with_land(&[(6, 6), (6, 7), (7, 6), (7, 7)]);
            let field = UniformField::new(u, v);
            for s in ALL {
                let mut e = Ensemble::new(&[(x, y)]);
                e.advance(&tracker(s, 3600.0), &grid, &field);
                let (xn, yn) = (e.x[0], e.y[0]);
                let unchanged = xn == x && yn == y;
                let valid = grid.ingrid(xn, yn) && grid.atsea(xn, yn);
                prop_assert!(unchanged || valid);
            }
        }
    }
}
