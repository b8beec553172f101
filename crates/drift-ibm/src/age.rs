//! Particle age, in seconds or degree-days.

use drift_core::{Grid, VelocityField};
use drift_state::{BehaviorHook, HookError, State};

use crate::config::IbmConfig;

/// Name of the age instance variable.
pub const AGE: &str = "age";

/// Name of the temperature forcing field used for degree-days.
pub const TEMPERATURE: &str = "temp";

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Advances the `age` instance variable every step.
///
/// In seconds by default. With `degree_days` set, each step adds
/// `temp * dt / 86400`, sampling `temp` at the particle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Age {
    degree_days: bool,
}

impl Age {
    /// Age in seconds.
    pub fn seconds() -> Self {
        Self { degree_days: false }
    }

    /// Age in degree-days.
    pub fn degree_days() -> Self {
        Self { degree_days: true }
    }

    /// Build from configuration (`degree_days` flag).
    pub fn from_config(config: &IbmConfig) -> Result<Self, HookError> {
        Ok(Self {
            degree_days: config.flag("degree_days"),
        })
    }

    /// Add one step of age to every particle of `state`.
    pub(crate) fn advance(
        &self,
        module: &str,
        state: &mut State,
        field: &dyn VelocityField,
    ) -> Result<(), HookError> {
        let dt = state.clock().dt();
        let increments = if self.degree_days {
            field
                .sample_field(state.x(), state.y(), state.z(), TEMPERATURE)?
                .into_iter()
                .map(|temp| temp * dt / SECONDS_PER_DAY)
                .collect()
        } else {
            vec![dt; state.len()]
        };
        let age = state
            .instance_mut(AGE)
            .ok_or_else(|| HookError::MissingVariable {
                module: module.to_string(),
                name: AGE.to_string(),
            })?;
        for (a, inc) in age.iter_mut().zip(increments) {
            *a += inc;
        }
        Ok(())
    }
}

impl BehaviorHook for Age {
    fn name(&self) -> &str {
        "age"
    }

    fn consumed_fields(&self) -> Vec<String> {
        if self.degree_days {
            vec![TEMPERATURE.to_string()]
        } else {
            Vec::new()
        }
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
        self.advance("age", state, field)
    }
}
