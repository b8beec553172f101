//! Integration schemes.

use std::fmt;
use std::str::FromStr;

use drift_core::{ConfigError, Grid, VelocityField};

/// Time integration scheme for advection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// One sample at the start of the step.
    EulerForward,
    /// Heun's midpoint method: a half-step estimate, then a second
    /// sample at the half step whose velocity is used for the step.
    Heun,
    /// Classical fourth-order Runge-Kutta.
    #[default]
    Rk4,
}

impl Scheme {
    /// Step velocity `(u, v)` of a particle at `(x, y, z)`.
    ///
    /// `sx = dt / dx` and `sy = dt / dy` convert velocity into a
    /// grid-coordinate displacement. Intermediate stage positions are
    /// clamped onto the grid before sampling.
    #[allow(clippy::too_many_arguments)]
    pub fn velocity(
        self,
        grid: &dyn Grid,
        field: &dyn VelocityField,
        x: f64,
        y: f64,
        z: f64,
        sx: f64,
        sy: f64,
    ) -> (f64, f64) {
        let stage = |u: f64, v: f64, frac: f64, tstep: f64| {
            let (xs, ys) = grid.clamp(x + frac * u * sx, y + frac * v * sy);
            field.velocity(xs, ys, z, tstep)
        };
        let (u1, v1) = field.velocity(x, y, z, 0.0);
        match self {
            Self::EulerForward => (u1, v1),
            Self::Heun => stage(u1, v1, 0.5, 0.5),
            Self::Rk4 => {
                let (u2, v2) = stage(u1, v1, 0.5, 0.5);
                let (u3, v3) = stage(u2, v2, 0.5, 0.5);
                let (u4, v4) = stage(u3, v3, 1.0, 1.0);
                (
                    (u1 + 2.0 * (u2 + u3) + u4) / 6.0,
                    (v1 + 2.0 * (v2 + v3) + v4) / 6.0,
                )
            }
        }
    }

    /// Short configuration name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EulerForward => "EF",
            Self::Heun => "RK2",
            Self::Rk4 => "RK4",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EF" | "EULER" | "EULERFORWARD" | "EULER_FORWARD" => Ok(Self::EulerForward),
            "RK2" | "HEUN" => Ok(Self::Heun),
            "RK4" => Ok(Self::Rk4),
            _ => Err(ConfigError::InvalidParameter {
                name: "scheme".into(),
                reason: format!("unknown advection scheme '{s}' (expected EF, RK2 or RK4)"),
            }),
        }
    }
}
