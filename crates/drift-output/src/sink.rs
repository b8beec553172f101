//! The output collaborator contract.

use drift_core::Grid;
use drift_state::State;

use crate::error::OutputError;

/// Receives ensemble snapshots at the output cadence.
///
/// `write` is only ever called with a compacted ensemble.
pub trait OutputSink {
    /// Record the ensemble at its current time.
    fn write(&mut self, state: &State, grid: &dyn Grid) -> Result<(), OutputError>;

    /// Close the output once the run is over.
    fn finish(&mut self, _state: &State) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Discards every snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn write(&mut self, _state: &State, _grid: &dyn Grid) -> Result<(), OutputError> {
        Ok(())
    }
}
