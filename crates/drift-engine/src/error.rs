//! Engine errors: every fatal condition of a run.

use std::error::Error;
use std::fmt;

use drift_core::ConfigError;
use drift_forcing::ForcingError;
use drift_output::OutputError;
use drift_release::ReleaseError;
use drift_state::StateError;

/// A run could not be set up or could not continue.
#[derive(Debug)]
pub enum EngineError {
    /// The model configuration is invalid.
    Config(ConfigError),
    /// The forcing could not be set up or advanced.
    Forcing(ForcingError),
    /// The release table could not be loaded or scheduled.
    Release(ReleaseError),
    /// The ensemble rejected a batch, a warm start or a hook failed.
    State(StateError),
    /// Output could not be written, or the warm-start file read.
    Output(OutputError),
    /// `step()` was called after the last step.
    Finished {
        /// Number of advection steps of the run.
        nsteps: u64,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::Forcing(e) => write!(f, "forcing: {e}"),
            Self::Release(e) => write!(f, "release: {e}"),
            Self::State(e) => write!(f, "particles: {e}"),
            Self::Output(e) => write!(f, "output: {e}"),
            Self::Finished { nsteps } => {
                write!(f, "the run already completed all {nsteps} steps")
            }
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Forcing(e) => Some(e),
            Self::Release(e) => Some(e),
            Self::State(e) => Some(e),
            Self::Output(e) => Some(e),
            Self::Finished { .. } => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ForcingError> for EngineError {
    fn from(e: ForcingError) -> Self {
        Self::Forcing(e)
    }
}

impl From<ReleaseError> for EngineError {
    fn from(e: ReleaseError) -> Self {
        Self::Release(e)
    }
}

impl From<StateError> for EngineError {
    fn from(e: StateError) -> Self {
        Self::State(e)
    }
}

impl From<OutputError> for EngineError {
    fn from(e: OutputError) -> Self {
        Self::Output(e)
    }
}
