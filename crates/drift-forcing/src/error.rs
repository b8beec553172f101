//! Errors raised by the forcing provider.

use std::error::Error;
use std::fmt;

use drift_core::{DataError, FieldError};

/// Failures while opening, indexing or advancing forcing data.
///
/// Every variant is fatal to a run.
#[derive(Debug)]
pub enum ForcingError {
    /// The forcing sources are inconsistent with each other or with the
    /// simulation window.
    Config {
        /// What is wrong.
        reason: String,
    },
    /// A forcing source could not be read or decoded.
    Data(DataError),
    /// `update` was called with a step earlier than the current one.
    Rewind {
        /// The step most recently applied.
        current: u64,
        /// The earlier step that was requested.
        requested: u64,
    },
    /// A step lies beyond the last available forcing frame.
    Exhausted {
        /// The requested step.
        step: u64,
    },
    /// A scalar field lookup failed.
    Field(FieldError),
}

impl ForcingError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ForcingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "forcing configuration error: {reason}"),
            Self::Data(e) => write!(f, "forcing data error: {e}"),
            Self::Rewind { current, requested } => write!(
                f,
                "forcing cannot step backwards from step {current} to step {requested}"
            ),
            Self::Exhausted { step } => {
                write!(f, "no forcing frame available for step {step}")
            }
            Self::Field(e) => write!(f, "{e}"),
        }
    }
}

impl Error for ForcingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Data(e) => Some(e),
            Self::Field(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DataError> for ForcingError {
    fn from(e: DataError) -> Self {
        Self::Data(e)
    }
}

impl From<FieldError> for ForcingError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewind_message_names_both_steps() {
        let e = ForcingError::Rewind {
            current: 7,
            requested: 3,
        };
        let msg = e.to_string();
        assert!(msg.contains('7') && msg.contains('3'));
    }

    #[test]
    fn data_error_is_chained() {
        let e: ForcingError = DataError::malformed("short frame").into();
        assert!(e.source().is_some());
    }
}
