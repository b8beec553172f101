//! Run configuration and its validation.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use drift_core::{Clock, ConfigError};
use drift_release::ReleaseMode;
use drift_tracker::{Scheme, TrackerConfig};

/// Resuming from the output of an earlier run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WarmStartConfig {
    /// Output file of the earlier run; its last frame is the initial
    /// ensemble.
    pub source: PathBuf,
    /// Variables restored from that frame.
    pub variables: Vec<String>,
}

/// Complete configuration of a model run.
///
/// Built by hand or by the command-line front end from a run file.
/// [`validate()`](ModelConfig::validate) checks everything that can be
/// checked without opening a file.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelConfig {
    /// Simulation start time.
    pub start: NaiveDateTime,
    /// Simulation stop time.
    pub stop: NaiveDateTime,
    /// Model time step in seconds.
    pub dt_seconds: i64,
    /// Interval between output frames in seconds; a multiple of the
    /// time step.
    pub output_period_seconds: i64,
    /// Forcing files in time order.
    pub forcing_sources: Vec<PathBuf>,
    /// Scalar forcing fields to hold in addition to those the behavior
    /// hook consumes.
    pub forcing_fields: Vec<String>,
    /// Integration scheme.
    pub scheme: Scheme,
    /// Horizontal diffusivity in m²/s.
    pub diffusivity: f64,
    /// Seed of the diffusion noise.
    pub seed: u64,
    /// Release table; required unless warm starting.
    pub release_file: Option<PathBuf>,
    /// Column names of the release table.
    pub release_format: Vec<String>,
    /// Discrete or continuous release.
    pub release_mode: ReleaseMode,
    /// Instance variables recorded at every output time.
    pub instance_variables: Vec<String>,
    /// Particle variables recorded once per particle.
    pub particle_variables: Vec<String>,
    /// Resume from an earlier run instead of starting empty.
    pub warm_start: Option<WarmStartConfig>,
}

impl ModelConfig {
    /// A configuration for the window `[start, stop]` at `dt_seconds`,
    /// writing every step, with no inputs yet.
    pub fn new(start: NaiveDateTime, stop: NaiveDateTime, dt_seconds: i64) -> Self {
        Self {
            start,
            stop,
            dt_seconds,
            output_period_seconds: dt_seconds,
            forcing_sources: Vec::new(),
            forcing_fields: Vec::new(),
            scheme: Scheme::default(),
            diffusivity: 0.0,
            seed: 0,
            release_file: None,
            release_format: ["mult", "release_time", "X", "Y", "Z"]
                .into_iter()
                .map(String::from)
                .collect(),
            release_mode: ReleaseMode::Discrete,
            instance_variables: Vec::new(),
            particle_variables: Vec::new(),
            warm_start: None,
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `stop <= start`, `dt_seconds <= 0`, or the window is not a
    ///   whole number of steps
    /// - the output period is not a positive multiple of the step
    /// - the diffusivity is negative or not finite
    /// - no forcing source is configured
    /// - a continuous release has a non-positive frequency
    /// - a cold start has no release file
    pub fn validate(&self) -> Result<(), ConfigError> {
        let clock = self.clock()?;
        clock.steps_in("output_period", self.output_period_seconds)?;
        self.tracker_config(&clock).validate()?;
        if self.forcing_sources.is_empty() {
            return Err(ConfigError::MissingParameter {
                name: "forcing_sources".into(),
            });
        }
        if let ReleaseMode::Continuous { frequency_seconds } = self.release_mode {
            if frequency_seconds <= 0 {
                return Err(ConfigError::InvalidParameter {
                    name: "release_frequency".into(),
                    reason: format!("must be positive, got {frequency_seconds} s"),
                });
            }
        }
        if self.warm_start.is_none() && self.release_file.is_none() {
            return Err(ConfigError::MissingParameter {
                name: "release_file".into(),
            });
        }
        Ok(())
    }

    /// The model clock of this run.
    pub fn clock(&self) -> Result<Clock, ConfigError> {
        Clock::new(self.start, self.stop, self.dt_seconds)
    }

    pub(crate) fn tracker_config(&self, clock: &Clock) -> TrackerConfig {
        TrackerConfig {
            scheme: self.scheme,
            dt: clock.dt(),
            diffusivity: self.diffusivity,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_core::parse_timestamp;

    fn valid() -> ModelConfig {
        let mut config = ModelConfig::new(
            parse_timestamp("2015-04-01").unwrap(),
            parse_timestamp("2015-04-02").unwrap(),
            3600,
        );
        config.forcing_sources = vec!["ocean.frc".into()];
        config.release_file = Some("drift.rls".into());
        config
    }

    #[test]
    fn valid_config_passes() {
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn window_and_step_are_checked() {
        let mut c = valid();
        c.stop = c.start;
        assert!(matches!(c.validate(), Err(ConfigError::EmptyWindow { .. })));

        let mut c = valid();
        c.dt_seconds = 0;
        assert_eq!(
            c.validate(),
            Err(ConfigError::InvalidTimestep { seconds: 0 })
        );
    }

    #[test]
    fn output_period_must_be_a_step_multiple() {
        let mut c = valid();
        c.output_period_seconds = 5400;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::NotStepMultiple {
                what: "output_period",
                ..
            })
        ));
        c.output_period_seconds = 0;
        assert!(c.validate().is_err());
        c.output_period_seconds = 3 * 3600;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn diffusivity_must_be_finite_and_non_negative() {
        for d in [-1.0, f64::NAN, f64::INFINITY] {
            let mut c = valid();
            c.diffusivity = d;
            assert!(
                matches!(c.validate(), Err(ConfigError::InvalidParameter { .. })),
                "{d}"
            );
        }
    }

    #[test]
    fn inputs_are_required() {
        let mut c = valid();
        c.forcing_sources.clear();
        assert_eq!(
            c.validate(),
            Err(ConfigError::MissingParameter {
                name: "forcing_sources".into()
            })
        );

        let mut c = valid();
        c.release_file = None;
        assert!(c.validate().is_err());
        c.warm_start = Some(WarmStartConfig {
            source: "previous.out".into(),
            variables: Vec::new(),
        });
        assert!(c.validate().is_ok());
    }

    #[test]
    fn continuous_release_needs_a_frequency() {
        let mut c = valid();
        c.release_mode = ReleaseMode::Continuous {
            frequency_seconds: 0,
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }
}
