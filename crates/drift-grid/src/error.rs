//! Error types for grid construction and grid files.

use std::error::Error;
use std::fmt;

use drift_core::DataError;

/// Errors arising from grid construction or grid file I/O.
#[derive(Debug)]
pub enum GridError {
    /// The grid is too small to have a non-empty navigable domain.
    TooSmall {
        /// Number of X points.
        imax: usize,
        /// Number of Y points.
        jmax: usize,
    },
    /// An array does not match the grid shape.
    ShapeMismatch {
        /// Array name.
        array: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        found: usize,
    },
    /// A value is outside its physical range.
    InvalidValue {
        /// Array or parameter name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// The grid file could not be read or written.
    Data(DataError),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSmall { imax, jmax } => {
                write!(f, "grid {imax}x{jmax} is too small (need at least 4x4)")
            }
            Self::ShapeMismatch {
                array,
                expected,
                found,
            } => write!(f, "array '{array}' has {found} values, expected {expected}"),
            Self::InvalidValue { name, reason } => write!(f, "invalid '{name}': {reason}"),
            Self::Data(e) => write!(f, "grid file: {e}"),
        }
    }
}

impl Error for GridError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Data(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DataError> for GridError {
    fn from(e: DataError) -> Self {
        Self::Data(e)
    }
}
