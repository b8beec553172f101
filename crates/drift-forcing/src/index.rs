//! Global time axis over the frames of every forcing source.

use chrono::NaiveDateTime;
use drift_core::Clock;

use crate::error::ForcingError;

/// Where one forcing frame lives and which model step it maps to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameEntry {
    /// Frame time.
    pub time: NaiveDateTime,
    /// Index of the source in the configured source list.
    pub source: usize,
    /// Frame position within that source.
    pub local: usize,
    /// `(time - start) / dt`; may be negative or fractional.
    pub step: f64,
}

/// Every available frame across all sources, in increasing time.
#[derive(Clone, Debug)]
pub struct FrameIndex {
    entries: Vec<FrameEntry>,
}

impl FrameIndex {
    /// Build the index from each source's frame times, in source order.
    ///
    /// Fails unless times increase strictly across the concatenation of
    /// all sources.
    pub fn build(per_source: &[Vec<NaiveDateTime>], clock: &Clock) -> Result<Self, ForcingError> {
        let mut entries: Vec<FrameEntry> = Vec::new();
        for (source, times) in per_source.iter().enumerate() {
            for (local, &time) in times.iter().enumerate() {
                if let Some(prev) = entries.last() {
                    if time == prev.time {
                        return Err(ForcingError::config(format!(
                            "duplicate forcing time {time} (source {source}, frame {local})"
                        )));
                    }
                    if time < prev.time {
                        return Err(ForcingError::config(format!(
                            "forcing times are not increasing: {time} (source {source}, frame {local}) follows {}",
                            prev.time
                        )));
                    }
                }
                entries.push(FrameEntry {
                    time,
                    source,
                    local,
                    step: clock.step_of(time),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Check that the frames bracket the whole simulation window.
    pub fn check_coverage(&self, clock: &Clock) -> Result<(), ForcingError> {
        let (first, last) = match (self.entries.first(), self.entries.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Err(ForcingError::config("forcing sources contain no frames")),
        };
        if first.step > 0.0 {
            return Err(ForcingError::config(format!(
                "first forcing time {} is after the simulation start {}",
                first.time,
                clock.start()
            )));
        }
        if last.step < clock.nsteps() as f64 {
            return Err(ForcingError::config(format!(
                "last forcing time {} is before the simulation stop {}",
                last.time,
                clock.stop()
            )));
        }
        Ok(())
    }

    /// Position of the latest frame at or before step 0.
    pub fn initial(&self) -> Option<usize> {
        self.entries
            .partition_point(|e| e.step <= 0.0)
            .checked_sub(1)
    }

    /// Number of indexed frames.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no frames are indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at position `n`.
    pub fn get(&self, n: usize) -> Option<&FrameEntry> {
        self.entries.get(n)
    }

    /// All entries in time order.
    pub fn entries(&self) -> &[FrameEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2015, 4, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn clock() -> Clock {
        // 2015-04-01T00 .. 2015-04-02T00 at one hour.
        Clock::new(at(1, 0), at(2, 0), 3600).unwrap()
    }

    #[test]
    fn frames_map_to_fractional_steps_across_sources() {
        let sources = vec![vec![at(1, 0), at(1, 6)], vec![at(1, 13), at(2, 0)]];
        let index = FrameIndex::build(&sources, &clock()).unwrap();
        let steps: Vec<f64> = index.entries().iter().map(|e| e.step).collect();
        assert_eq!(steps, vec![0.0, 6.0, 13.0, 24.0]);
        assert_eq!(index.get(2).map(|e| (e.source, e.local)), Some((1, 0)));
        index.check_coverage(&clock()).unwrap();
    }

    #[test]
    fn initial_frame_is_latest_not_after_start() {
        let t0 = at(1, 0);
        let sources = vec![
            vec![
                t0 - chrono::Duration::hours(5),
                t0 - chrono::Duration::minutes(30),
                at(1, 2),
            ],
            vec![at(2, 1)],
        ];
        let index = FrameIndex::build(&sources, &clock()).unwrap();
        assert_eq!(index.initial(), Some(1));
        assert_eq!(index.get(1).unwrap().step, -0.5);
    }

    #[test]
    fn duplicate_times_across_sources_are_rejected() {
        let sources = vec![vec![at(1, 0), at(1, 6)], vec![at(1, 6), at(2, 0)]];
        let err = FrameIndex::build(&sources, &clock()).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn decreasing_times_are_rejected() {
        let sources = vec![vec![at(1, 12), at(2, 0)], vec![at(1, 0)]];
        assert!(matches!(
            FrameIndex::build(&sources, &clock()),
            Err(ForcingError::Config { .. })
        ));
    }

    #[test]
    fn coverage_requires_both_ends() {
        let late = FrameIndex::build(&[vec![at(1, 1), at(2, 0)]], &clock()).unwrap();
        assert!(late.check_coverage(&clock()).is_err());
        assert_eq!(late.initial(), None);

        let short = FrameIndex::build(&[vec![at(1, 0), at(1, 23)]], &clock()).unwrap();
        assert!(short.check_coverage(&clock()).is_err());

        let empty = FrameIndex::build(&[vec![]], &clock()).unwrap();
        assert!(empty.is_empty());
        assert!(empty.check_coverage(&clock()).is_err());
    }
}
