//! Mortality by age.

use drift_core::{Grid, VelocityField};
use drift_state::{BehaviorHook, HookError, State};
use tracing::debug;

use crate::age::{Age, AGE};
use crate::config::IbmConfig;

/// Ages particles in seconds and kills those older than `max_age`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lifespan {
    max_age: f64,
    age: Age,
}

impl Lifespan {
    /// Kill particles once their age exceeds `max_age` seconds.
    pub fn new(max_age: f64) -> Self {
        Self {
            max_age,
            age: Age::seconds(),
        }
    }

    /// Build from configuration (required positive `max_age`).
    pub fn from_config(config: &IbmConfig) -> Result<Self, HookError> {
        let max_age = config.require("max_age")?;
        if max_age <= 0.0 {
            return Err(config
                .invalid("max_age", format!("must be positive, got {max_age}"))
                .into());
        }
        Ok(Self::new(max_age))
    }
}

impl BehaviorHook for Lifespan {
    fn name(&self) -> &str {
        "lifespan"
    }

    fn instance_variables(&self) -> Vec<String> {
        vec![AGE.to_string()]
    }

    fn update(
        &mut self,
        _grid: &dyn Grid,
        state: &mut State,
        field: &dyn VelocityField,
    ) -> Result<(), HookError> {
        self.age.advance("lifespan", state, field)?;
        let expired: Vec<bool> = state
            .instance(AGE)
            .unwrap_or_default()
            .iter()
            .map(|&a| a > self.max_age)
            .collect();
        let mut killed = 0;
        for (alive, expired) in state.alive_mut().iter_mut().zip(expired) {
            if expired && *alive {
                *alive = false;
                killed += 1;
            }
        }
        if killed > 0 {
            debug!(step = state.step(), killed, "particles exceeded their lifespan");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::age::tests::state_with;
    use drift_test_utils::{MockGrid, UniformField};

    #[test]
    fn old_particles_are_marked_dead() {
        let grid = MockGrid::open_box(10, 10);
        let mut state = state_with(&[AGE], 3);
        state.instance_mut(AGE).unwrap()[1] = 10_000.0;
        let mut hook = Lifespan::new(5_000.0);
        hook.update(&grid, &mut state, &UniformField::still()).unwrap();
        assert_eq!(state.alive(), &[true, false, true]);
        assert_eq!(state.instance(AGE).unwrap(), &[3600.0, 13_600.0, 3600.0]);

        hook.update(&grid, &mut state, &UniformField::still()).unwrap();
        assert_eq!(state.alive(), &[false, false, false]);
        assert_eq!(state.compact(), 3);
    }

    #[test]
    fn max_age_must_be_positive() {
        let config = IbmConfig::new("lifespan").with_param("max_age", 0.0);
        assert!(matches!(
            Lifespan::from_config(&config),
            Err(HookError::Config(_))
        ));
    }
}
