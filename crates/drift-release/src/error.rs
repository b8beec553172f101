//! Release errors.

use std::error::Error;
use std::fmt;

use drift_core::DataError;

/// Failures while reading a release table or building a schedule.
#[derive(Debug)]
pub enum ReleaseError {
    /// The release file could not be read.
    Data(DataError),
    /// The release configuration is unusable.
    Config {
        /// What is wrong.
        reason: String,
    },
    /// A line of the release file could not be parsed.
    Malformed {
        /// One-based line number.
        line: usize,
        /// What is wrong with it.
        reason: String,
    },
    /// No particles remain to be released after filtering.
    Empty,
}

impl fmt::Display for ReleaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(e) => write!(f, "cannot read release file: {e}"),
            Self::Config { reason } => write!(f, "release configuration error: {reason}"),
            Self::Malformed { line, reason } => {
                write!(f, "malformed release record on line {line}: {reason}")
            }
            Self::Empty => write!(f, "no particles to release in the simulation window"),
        }
    }
}

impl Error for ReleaseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Data(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DataError> for ReleaseError {
    fn from(e: DataError) -> Self {
        Self::Data(e)
    }
}
