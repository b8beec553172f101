//! The model clock: mapping between calendar time and model steps.
//!
//! The simulation runs `nsteps` fixed steps of `dt` seconds from `start`
//! to `stop`. Forcing frames and release records are placed on this
//! axis by [`Clock::step_of`], which may return negative or fractional
//! step numbers for times that do not fall on the step grid.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};

use crate::error::ConfigError;

/// Fixed-step model clock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clock {
    start: NaiveDateTime,
    stop: NaiveDateTime,
    dt: i64,
    nsteps: u64,
}

impl Clock {
    /// Build a clock for the window `[start, stop]` with step `dt_seconds`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `dt_seconds <= 0`, if `stop <= start`, or if the
    /// window is not a whole number of steps.
    pub fn new(
        start: NaiveDateTime,
        stop: NaiveDateTime,
        dt_seconds: i64,
    ) -> Result<Self, ConfigError> {
        if dt_seconds <= 0 {
            return Err(ConfigError::InvalidTimestep {
                seconds: dt_seconds,
            });
        }
        if stop <= start {
            return Err(ConfigError::EmptyWindow {
                start: start.to_string(),
                stop: stop.to_string(),
            });
        }
        let window = (stop - start).num_seconds();
        if window % dt_seconds != 0 {
            return Err(ConfigError::NotStepMultiple {
                what: "simulation window",
                seconds: window,
                dt: dt_seconds,
            });
        }
        Ok(Self {
            start,
            stop,
            dt: dt_seconds,
            nsteps: (window / dt_seconds) as u64,
        })
    }

    /// Simulation start time (step 0).
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Simulation stop time (step `nsteps`).
    pub fn stop(&self) -> NaiveDateTime {
        self.stop
    }

    /// Model time step in whole seconds.
    pub fn dt_seconds(&self) -> i64 {
        self.dt
    }

    /// Model time step in seconds, as a float for physics.
    pub fn dt(&self) -> f64 {
        self.dt as f64
    }

    /// Number of advection steps between start and stop.
    pub fn nsteps(&self) -> u64 {
        self.nsteps
    }

    /// Calendar time of model step `step`.
    pub fn time_of(&self, step: u64) -> NaiveDateTime {
        self.start + TimeDelta::seconds(self.dt * step as i64)
    }

    /// Fractional model step of `time`: `(time - start) / dt`.
    pub fn step_of(&self, time: NaiveDateTime) -> f64 {
        (time - self.start).num_seconds() as f64 / self.dt as f64
    }

    /// The model step nearest to `time` (halves round away from zero).
    pub fn nearest_step(&self, time: NaiveDateTime) -> i64 {
        self.step_of(time).round() as i64
    }

    /// Convert a period in seconds to a whole number of steps.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotStepMultiple`] if `seconds` is not a
    /// positive multiple of `dt`.
    pub fn steps_in(&self, what: &'static str, seconds: i64) -> Result<u64, ConfigError> {
        if seconds <= 0 || seconds % self.dt != 0 {
            return Err(ConfigError::NotStepMultiple {
                what,
                seconds,
                dt: self.dt,
            });
        }
        Ok((seconds / self.dt) as u64)
    }
}

/// Seconds since the Unix epoch (times are treated as UTC).
pub fn epoch_seconds(time: NaiveDateTime) -> i64 {
    time.and_utc().timestamp()
}

/// Inverse of [`epoch_seconds`]. `None` if out of chrono's range.
pub fn from_epoch_seconds(seconds: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(seconds, 0).map(|t| t.naive_utc())
}

/// Parse an ISO-like timestamp.
///
/// Accepts `YYYY-MM-DD`, optionally followed by `T` (or a space) and
/// `HH`, `HH:MM` or `HH:MM:SS`. Returns `None` on anything else.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    let (date, time) = match text.find(['T', ' ']) {
        Some(pos) => (&text[..pos], text[pos + 1..].trim()),
        None => (text, ""),
    };
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    if time.is_empty() {
        return date.and_hms_opt(0, 0, 0);
    }
    let mut parts = time.split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    let second: u32 = match parts.next() {
        Some(s) => s.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    date.and_hms_opt(hour, minute, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn parses_every_supported_shape() {
        let midnight = ts("2015-04-01");
        assert_eq!(ts("2015-04-01T00"), midnight);
        assert_eq!(ts("2015-04-01T00:00"), midnight);
        assert_eq!(ts("2015-04-01 00:00:00"), midnight);
        assert_eq!(
            ts("2015-04-01T06:30:15") - midnight,
            TimeDelta::seconds(6 * 3600 + 30 * 60 + 15)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("2015-13-01").is_none());
        assert!(parse_timestamp("2015-04-01T25").is_none());
        assert!(parse_timestamp("2015-04-01T01:02:03:04").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn clock_counts_steps() {
        let clock = Clock::new(ts("2015-04-01"), ts("2015-04-02"), 3600).unwrap();
        assert_eq!(clock.nsteps(), 24);
        assert_eq!(clock.time_of(6), ts("2015-04-01T06"));
        assert_eq!(clock.step_of(ts("2015-03-31T22")), -2.0);
        assert_eq!(clock.step_of(ts("2015-04-01T00:30")), 0.5);
        assert_eq!(clock.nearest_step(ts("2015-04-01T02:40")), 3);
    }

    #[test]
    fn clock_rejects_bad_windows() {
        let start = ts("2015-04-01");
        assert!(matches!(
            Clock::new(start, start, 600),
            Err(ConfigError::EmptyWindow { .. })
        ));
        assert!(matches!(
            Clock::new(start, ts("2015-04-02"), 0),
            Err(ConfigError::InvalidTimestep { seconds: 0 })
        ));
        assert!(matches!(
            Clock::new(start, ts("2015-04-01T01"), 7 * 60),
            Err(ConfigError::NotStepMultiple { .. })
        ));
    }

    #[test]
    fn steps_in_requires_multiple() {
        let clock = Clock::new(ts("2015-04-01"), ts("2015-04-02"), 600).unwrap();
        assert_eq!(clock.steps_in("output_period", 3600).unwrap(), 6);
        assert!(clock.steps_in("output_period", 900).is_err());
        assert!(clock.steps_in("output_period", 0).is_err());
    }

    proptest! {
        #[test]
        fn epoch_roundtrip(secs in -2_000_000_000i64..4_000_000_000i64) {
            let t = from_epoch_seconds(secs).unwrap();
            prop_assert_eq!(epoch_seconds(t), secs);
        }
    }
}
