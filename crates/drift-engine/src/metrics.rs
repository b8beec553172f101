//! Per-step and per-run counters.

/// Counts and timings collected during one model step.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// The model step this describes.
    pub step: u64,
    /// Particles appended by release.
    pub released: usize,
    /// Whether an output frame was written.
    pub written: bool,
    /// Particles that moved.
    pub moved: usize,
    /// Particles held back by the coast.
    pub blocked: usize,
    /// Particles that left the grid during advection.
    pub killed: usize,
    /// Particles removed by compaction.
    pub removed: usize,
    /// Particles alive after the step.
    pub remaining: usize,
    /// Time spent updating the forcing.
    pub forcing_us: u64,
    /// Time spent writing output.
    pub output_us: u64,
    /// Time spent in the ensemble update.
    pub update_us: u64,
    /// Wall-clock time of the whole step.
    pub total_us: u64,
}

/// Totals of a completed run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Steps executed, including the final output-only step.
    pub steps: u64,
    /// Particles released over the run.
    pub released: usize,
    /// Output frames written.
    pub frames: u64,
    /// Particles alive at the end.
    pub remaining: usize,
    /// Wall-clock time of the run in microseconds.
    pub elapsed_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.step, 0);
        assert_eq!(m.released, 0);
        assert!(!m.written);
        assert_eq!(m.total_us, 0);
        assert_eq!(RunSummary::default().frames, 0);
    }
}
