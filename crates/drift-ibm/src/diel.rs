//! Diel vertical migration.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDateTime, Timelike};
use drift_core::{Grid, VelocityField};
use drift_state::{BehaviorHook, HookError, State};

use crate::config::IbmConfig;

/// Solar elevation in degrees above the horizon at `time` (UTC) for a
/// point at `lon`, `lat` degrees.
///
/// Uses a cosine approximation of the declination and local solar time
/// from longitude alone, good to about a degree.
pub fn solar_elevation(time: NaiveDateTime, lon: f64, lat: f64) -> f64 {
    let day = f64::from(time.ordinal());
    let hours = f64::from(time.hour())
        + f64::from(time.minute()) / 60.0
        + f64::from(time.second()) / 3600.0;
    let declination = (-23.44f64).to_radians() * (2.0 * PI / 365.0 * (day + 10.0)).cos();
    let hour_angle = (15.0 * (hours + lon / 15.0 - 12.0)).to_radians();
    let lat = lat.to_radians();
    let sin_elevation =
        lat.sin() * declination.sin() + lat.cos() * declination.cos() * hour_angle.cos();
    sin_elevation.clamp(-1.0, 1.0).asin().to_degrees()
}

/// Places particles at a day depth while the sun is up at their
/// position and at a night depth otherwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Diel {
    day_depth: f64,
    night_depth: f64,
}

impl Diel {
    /// Migrate between `day_depth` and `night_depth` metres.
    pub fn new(day_depth: f64, night_depth: f64) -> Self {
        Self {
            day_depth,
            night_depth,
        }
    }

    /// Build from configuration (required `day_depth` and `night_depth`,
    /// both non-negative).
    pub fn from_config(config: &IbmConfig) -> Result<Self, HookError> {
        let day = config.require("day_depth")?;
        let night = config.require("night_depth")?;
        for (key, depth) in [("day_depth", day), ("night_depth", night)] {
            if depth < 0.0 {
                return Err(config
                    .invalid(key, format!("must not be negative, got {depth}"))
                    .into());
            }
        }
        Ok(Self::new(day, night))
    }
}

impl BehaviorHook for Diel {
    fn name(&self) -> &str {
        "diel"
    }

    fn update(
        &mut self,
        grid: &dyn Grid,
        state: &mut State,
        _field: &dyn VelocityField,
    ) -> Result<(), HookError> {
        let time = state.time();
        let (x, y, z) = state.positions_mut();
        for ((z, &x), &y) in z.iter_mut().zip(x.iter()).zip(y.iter()) {
            let (lon, lat) = grid.lonlat(x, y);
            *z = if solar_elevation(time, lon, lat) > 0.0 {
                self.day_depth
            } else {
                self.night_depth
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::age::tests::state_with;
    use drift_test_utils::{ts, MockGrid, UniformField};

    #[test]
    fn sun_is_high_at_equatorial_noon_and_down_at_midnight() {
        assert!(solar_elevation(ts("2015-03-21T12"), 0.0, 0.0) > 85.0);
        assert!(solar_elevation(ts("2015-03-21T00"), 0.0, 0.0) < -85.0);
        // Local noon at 90 E is 06 UTC.
        assert!(solar_elevation(ts("2015-03-21T06"), 90.0, 0.0) > 85.0);
    }

    #[test]
    fn polar_summer_has_midnight_sun() {
        assert!(solar_elevation(ts("2015-06-21T00"), 0.0, 85.0) > 0.0);
        assert!(solar_elevation(ts("2015-12-21T12"), 0.0, 85.0) < 0.0);
    }

    #[test]
    fn particles_follow_the_sun() {
        // Particles sit near (0.04 E, 0.04 N); the state clock is at
        // 2015-04-01T00, which is night there.
        let grid = MockGrid::open_box(10, 10);
        let mut state = state_with(&[], 2);
        let mut hook = Diel::new(50.0, 5.0);
        hook.update(&grid, &mut state, &UniformField::still()).unwrap();
        assert_eq!(state.z(), &[5.0, 5.0]);
    }

    #[test]
    fn depths_must_not_be_negative() {
        let config = IbmConfig::new("diel")
            .with_param("day_depth", -1.0)
            .with_param("night_depth", 5.0);
        assert!(Diel::from_config(&config).is_err());
        assert!(Diel::from_config(&IbmConfig::new("diel")).is_err());
    }
}
