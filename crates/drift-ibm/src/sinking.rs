//! Constant vertical velocity.

use drift_core::{Grid, VelocityField};
use drift_state::{BehaviorHook, HookError, State};

use crate::config::IbmConfig;

/// Moves every particle vertically at a fixed speed in m/s, positive
/// down. The ensemble's depth corrections keep particles in the water
/// column afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sinking {
    speed: f64,
}

impl Sinking {
    /// Sink at `speed` m/s; negative values rise.
    pub fn new(speed: f64) -> Self {
        Self { speed }
    }

    /// Build from configuration (required `speed`).
    pub fn from_config(config: &IbmConfig) -> Result<Self, HookError> {
        Ok(Self::new(config.require("speed")?))
    }

    /// Vertical speed in m/s.
    pub fn speed(&self) -> f64 {
        self.speed
    }
}

impl BehaviorHook for Sinking {
    fn name(&self) -> &str {
        "sinking"
    }

    fn update(
        &mut self,
        _grid: &dyn Grid,
        state: &mut State,
        _field: &dyn VelocityField,
    ) -> Result<(), HookError> {
        let dz = self.speed * state.clock().dt();
        let (_, _, z) = state.positions_mut();
        for z in z.iter_mut() {
            *z += dz;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::age::tests::state_with;
    use approx::assert_relative_eq;
    use drift_test_utils::{MockGrid, UniformField};

    #[test]
    fn particles_move_by_speed_times_dt() {
        let grid = MockGrid::open_box(10, 10);
        let mut state = state_with(&[], 3);
        let mut hook = Sinking::from_config(&IbmConfig::new("sinking").with_param("speed", 0.001))
            .unwrap();
        hook.update(&grid, &mut state, &UniformField::still()).unwrap();
        for &z in state.z() {
            assert_relative_eq!(z, 13.6, epsilon = 1e-12);
        }
    }

    #[test]
    fn speed_is_required() {
        assert!(matches!(
            Sinking::from_config(&IbmConfig::new("sinking")),
            Err(HookError::Config(_))
        ));
    }
}
