//! Errors raised while mutating the particle ensemble.

use std::error::Error;
use std::fmt;

use drift_core::{BatchError, ConfigError, FieldError};

/// A behavior module failed during its per-step update.
#[derive(Clone, Debug, PartialEq)]
pub enum HookError {
    /// A forcing field the module needs could not be sampled.
    Field(FieldError),
    /// The module was configured with invalid parameters.
    Config(ConfigError),
    /// A state variable the module needs is not configured.
    MissingVariable {
        /// Name of the behavior module.
        module: String,
        /// Name of the missing variable.
        name: String,
    },
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(e) => write!(f, "{e}"),
            Self::Config(e) => write!(f, "{e}"),
            Self::MissingVariable { module, name } => {
                write!(f, "behavior module '{module}' needs variable '{name}'")
            }
        }
    }
}

impl Error for HookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Field(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::MissingVariable { .. } => None,
        }
    }
}

impl From<FieldError> for HookError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}

impl From<ConfigError> for HookError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Errors from [`State`](crate::State) operations.
#[derive(Clone, Debug, PartialEq)]
pub enum StateError {
    /// A release batch is inconsistent or breaks pid continuity.
    Batch(BatchError),
    /// A warm-start variable is absent from the snapshot.
    MissingVariable {
        /// The variable name.
        name: String,
    },
    /// The warm-start snapshot is internally inconsistent.
    WarmStart {
        /// What is wrong.
        reason: String,
    },
    /// The behavior hook failed.
    Hook {
        /// Name of the hook.
        name: String,
        /// The underlying error.
        source: HookError,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batch(e) => write!(f, "cannot append release batch: {e}"),
            Self::MissingVariable { name } => {
                write!(f, "warm-start variable '{name}' is absent from the snapshot")
            }
            Self::WarmStart { reason } => write!(f, "invalid warm-start snapshot: {reason}"),
            Self::Hook { name, source } => write!(f, "behavior hook '{name}' failed: {source}"),
        }
    }
}

impl Error for StateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Batch(e) => Some(e),
            Self::Hook { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<BatchError> for StateError {
    fn from(e: BatchError) -> Self {
        Self::Batch(e)
    }
}
