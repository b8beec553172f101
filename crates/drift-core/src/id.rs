//! Strongly-typed identifiers for particles and model steps.

use std::fmt;

/// Identifies a particle for the whole lifetime of a run.
///
/// Pids are assigned in release order starting from zero (or from the
/// warm-start offset) and are never reused: once a particle dies its
/// pid does not reappear.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(pub u64);

impl Pid {
    /// The pid that follows this one in release order.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// The pid as an array index (particle variables are indexed by pid).
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Pid {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Monotonically increasing model step counter.
///
/// Step `n` corresponds to `start_time + n * dt`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StepIndex(pub u64);

impl StepIndex {
    /// The step as a float, for arithmetic against forcing step numbers.
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

impl fmt::Display for StepIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepIndex {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
