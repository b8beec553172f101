//! Error types shared across the Drift workspace.
//!
//! Configuration problems and unreadable data are fatal to a run; they
//! are surfaced as these enums and turned into a process exit only at
//! the command-line boundary. Per-particle conditions (leaving the
//! grid, hitting the coast) are not errors and never appear here.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::id::Pid;

// ── ConfigError ────────────────────────────────────────────────────

/// Invalid or inconsistent run configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The model time step is zero or negative.
    InvalidTimestep {
        /// The configured time step in seconds.
        seconds: i64,
    },
    /// The simulation stop time is not after the start time.
    EmptyWindow {
        /// Start time, formatted.
        start: String,
        /// Stop time, formatted.
        stop: String,
    },
    /// A duration is not a whole multiple of the model time step.
    NotStepMultiple {
        /// What the duration describes (e.g. `"output_period"`).
        what: &'static str,
        /// The duration in seconds.
        seconds: i64,
        /// The model time step in seconds.
        dt: i64,
    },
    /// A parameter has an invalid value.
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// A required parameter is absent.
    MissingParameter {
        /// Parameter name.
        name: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimestep { seconds } => {
                write!(f, "time step must be positive, got {seconds} s")
            }
            Self::EmptyWindow { start, stop } => {
                write!(f, "stop time {stop} is not after start time {start}")
            }
            Self::NotStepMultiple { what, seconds, dt } => {
                write!(
                    f,
                    "{what} of {seconds} s is not a positive multiple of the time step {dt} s"
                )
            }
            Self::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter '{name}': {reason}")
            }
            Self::MissingParameter { name } => write!(f, "missing parameter '{name}'"),
        }
    }
}

impl Error for ConfigError {}

// ── DataError ──────────────────────────────────────────────────────

/// A data file could not be opened, read or decoded.
#[derive(Debug)]
pub enum DataError {
    /// An I/O error, optionally tagged with the file it concerns.
    Io {
        /// The file being accessed, if known.
        path: Option<PathBuf>,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The file does not start with the expected magic bytes.
    InvalidMagic {
        /// The magic the reader expected.
        expected: [u8; 4],
        /// What was found instead.
        found: [u8; 4],
    },
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the file.
        found: u8,
    },
    /// The content could not be decoded (truncated or inconsistent).
    Malformed {
        /// Human-readable description of what went wrong.
        detail: String,
    },
}

impl DataError {
    /// Attach a file path to an I/O error that does not yet carry one.
    pub fn at(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::Io { path: None, source } => Self::Io {
                path: Some(path.into()),
                source,
            },
            other => other,
        }
    }

    /// Shorthand for a [`DataError::Malformed`] value.
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                path: Some(path),
                source,
            } => write!(f, "I/O error on {}: {source}", path.display()),
            Self::Io { path: None, source } => write!(f, "I/O error: {source}"),
            Self::InvalidMagic { expected, found } => write!(
                f,
                "invalid magic bytes {:?} (expected {:?})",
                String::from_utf8_lossy(found),
                String::from_utf8_lossy(expected)
            ),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::Malformed { detail } => write!(f, "malformed data: {detail}"),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for DataError {
    fn from(e: io::Error) -> Self {
        Self::Io {
            path: None,
            source: e,
        }
    }
}

// ── FieldError ─────────────────────────────────────────────────────

/// A scalar forcing field could not be sampled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// The field was never registered as consumed by the behavior module.
    UnknownField {
        /// The requested field name.
        name: String,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField { name } => {
                write!(f, "forcing field '{name}' is not registered")
            }
        }
    }
}

impl Error for FieldError {}

// ── BatchError ─────────────────────────────────────────────────────

/// A particle batch is internally inconsistent or out of pid order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchError {
    /// A column does not have one entry per particle.
    LengthMismatch {
        /// Column name.
        column: String,
        /// Number of particles in the batch.
        expected: usize,
        /// Length of the offending column.
        found: usize,
    },
    /// The batch pids do not continue the ensemble's pid sequence.
    PidOrder {
        /// The next pid the ensemble expects.
        expected: Pid,
        /// The pid found in the batch.
        found: Pid,
    },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch {
                column,
                expected,
                found,
            } => write!(
                f,
                "column '{column}' has {found} entries, expected {expected}"
            ),
            Self::PidOrder { expected, found } => {
                write!(f, "pid {found} out of order, expected {expected}")
            }
        }
    }
}

impl Error for BatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_error_at_tags_io_only() {
        let err = DataError::from(io::Error::new(io::ErrorKind::NotFound, "gone")).at("a.drfc");
        assert!(err.to_string().contains("a.drfc"));
        assert!(err.source().is_some());

        let err = DataError::malformed("short read").at("b.drfc");
        assert_eq!(err.to_string(), "malformed data: short read");
    }

    #[test]
    fn config_error_messages_name_the_problem() {
        let err = ConfigError::NotStepMultiple {
            what: "output_period",
            seconds: 900,
            dt: 600,
        };
        assert!(err.to_string().contains("output_period"));
        assert!(err.to_string().contains("600"));
    }
}
