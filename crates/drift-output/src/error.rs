//! Output errors.

use std::error::Error;
use std::fmt;

use drift_core::DataError;

/// Failures while writing or reading particle output.
#[derive(Debug)]
pub enum OutputError {
    /// The file could not be written, read or decoded.
    Data(DataError),
    /// A variable to be written is not in the ensemble.
    MissingVariable {
        /// The variable name.
        name: String,
    },
    /// The writer was already finished.
    Closed,
    /// The file holds no time frame to warm start from.
    NoFrames,
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(e) => write!(f, "{e}"),
            Self::MissingVariable { name } => {
                write!(f, "output variable '{name}' is not in the ensemble")
            }
            Self::Closed => write!(f, "output writer is already finished"),
            Self::NoFrames => write!(f, "output file contains no time frames"),
        }
    }
}

impl Error for OutputError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Data(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DataError> for OutputError {
    fn from(e: DataError) -> Self {
        Self::Data(e)
    }
}
