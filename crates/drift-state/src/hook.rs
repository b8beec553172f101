//! The behavior-module call contract.

use drift_core::{Grid, VelocityField};

use crate::error::HookError;
use crate::state::State;

/// A per-step rule set applied to the ensemble after advection.
///
/// Hooks are selected by name at configuration time (see the
/// `drift-ibm` registry) or injected directly. A hook may read and
/// write any per-particle array of the [`State`], including the alive
/// mask; compaction runs after it.
pub trait BehaviorHook {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Scalar forcing fields this hook samples. The model registers
    /// them with the forcing provider, which must then supply them.
    fn consumed_fields(&self) -> Vec<String> {
        Vec::new()
    }

    /// Instance variables this hook reads or writes. The model adds
    /// them to the ensemble configuration.
    fn instance_variables(&self) -> Vec<String> {
        Vec::new()
    }

    /// Apply the rule set for the step the ensemble has just advanced
    /// to.
    fn update(
        &mut self,
        grid: &dyn Grid,
        state: &mut State,
        field: &dyn VelocityField,
    ) -> Result<(), HookError>;
}

/// The identity hook.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoBehavior;

impl BehaviorHook for NoBehavior {
    fn name(&self) -> &str {
        "none"
    }

    fn update(
        &mut self,
        _grid: &dyn Grid,
        _state: &mut State,
        _field: &dyn VelocityField,
    ) -> Result<(), HookError> {
        Ok(())
    }
}
