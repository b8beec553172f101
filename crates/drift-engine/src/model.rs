//! The synchronous model step loop.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use drift_core::{Clock, Grid};
use drift_forcing::{Forcing, ForcingConfig};
use drift_output::{OutputSink, RaggedReader};
use drift_release::{ReleaseConfig, ReleaseError, ReleaseScheduler};
use drift_state::{BehaviorHook, State, StateConfig};
use drift_tracker::Tracker;
use tracing::{info, info_span, warn, Span};

use crate::config::ModelConfig;
use crate::error::EngineError;
use crate::metrics::{RunSummary, StepMetrics};

/// A configured run, stepped one model step at a time.
///
/// The model exclusively owns the forcing, the ensemble and the
/// schedule. The grid is shared read-only with the forcing provider.
pub struct Model {
    clock: Clock,
    grid: Arc<dyn Grid>,
    forcing: Forcing,
    scheduler: Option<ReleaseScheduler>,
    state: State,
    tracker: Tracker,
    hook: Box<dyn BehaviorHook>,
    sink: Box<dyn OutputSink>,
    output_every: u64,
    next_step: u64,
    released: usize,
    frames: u64,
    last_metrics: StepMetrics,
    span: Span,
}

impl Model {
    /// Set up a run: validate `config`, index the forcing, load the
    /// warm start if any and build the release schedule.
    ///
    /// Scalar fields consumed by `hook` are registered with the forcing
    /// and its instance variables added to the ensemble.
    ///
    /// # Errors
    ///
    /// Any fatal setup condition: invalid configuration, unreadable or
    /// insufficient forcing, an unreadable or inconsistent warm start,
    /// or a malformed or empty release table on a cold start.
    pub fn new(
        config: ModelConfig,
        grid: Arc<dyn Grid>,
        hook: Box<dyn BehaviorHook>,
        sink: Box<dyn OutputSink>,
        span: Span,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let clock = config.clock()?;
        let output_every = clock.steps_in("output_period", config.output_period_seconds)?;

        let mut fields = config.forcing_fields.clone();
        merge_names(&mut fields, hook.consumed_fields());
        let forcing = Forcing::new(
            &ForcingConfig {
                sources: config.forcing_sources.clone(),
                fields,
            },
            Arc::clone(&grid),
            &clock,
            info_span!(parent: &span, "forcing"),
        )?;

        let mut instance_variables = config.instance_variables.clone();
        merge_names(&mut instance_variables, hook.instance_variables());
        let state_config = StateConfig {
            instance_variables,
            particle_variables: config.particle_variables.clone(),
            warm_start_variables: config
                .warm_start
                .as_ref()
                .map(|w| w.variables.clone())
                .unwrap_or_default(),
        };
        let state_span = info_span!(parent: &span, "state");
        let state = match &config.warm_start {
            Some(warm) => {
                let snapshot = RaggedReader::open_path(&warm.source)?
                    .last_frame_warm_start(&state_config.warm_start_variables)?;
                if snapshot.time != clock.start() {
                    warn!(
                        parent: &span,
                        snapshot = %snapshot.time,
                        start = %clock.start(),
                        "warm-start frame time differs from the simulation start"
                    );
                }
                State::from_warm_start(
                    &state_config,
                    clock.clone(),
                    snapshot,
                    grid.as_ref(),
                    state_span,
                )?
            }
            None => State::new(&state_config, clock.clone(), state_span),
        };

        let scheduler = match &config.release_file {
            Some(path) => {
                let release = ReleaseConfig {
                    format: config.release_format.clone(),
                    mode: config.release_mode,
                    warm_start: config.warm_start.is_some(),
                    pid_offset: state.next_pid(),
                };
                match ReleaseScheduler::from_path(
                    path,
                    &release,
                    &clock,
                    Some(grid.as_ref()),
                    info_span!(parent: &span, "release"),
                ) {
                    Ok(scheduler) => Some(scheduler),
                    Err(ReleaseError::Empty) if config.warm_start.is_some() => {
                        info!(parent: &span, "no releases left after the warm start");
                        None
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            None => None,
        };

        let tracker = Tracker::new(
            &config.tracker_config(&clock),
            info_span!(parent: &span, "tracker"),
        )?;

        info!(
            parent: &span,
            start = %clock.start(),
            stop = %clock.stop(),
            nsteps = clock.nsteps(),
            scheme = %tracker.scheme(),
            hook = hook.name(),
            scheduled = scheduler.as_ref().map_or(0, |s| s.total_particle_count()),
            warm = state.len(),
            "model ready"
        );
        Ok(Self {
            clock,
            grid,
            forcing,
            scheduler,
            state,
            tracker,
            hook,
            sink,
            output_every,
            next_step: 0,
            released: 0,
            frames: 0,
            last_metrics: StepMetrics::default(),
            span,
        })
    }

    /// Run the next model step.
    ///
    /// Steps `0..nsteps` advect; step `nsteps` only releases and writes
    /// the final output.
    ///
    /// # Errors
    ///
    /// [`EngineError::Finished`] once every step has run; otherwise any
    /// forcing, ensemble or output failure, all of which are fatal.
    pub fn step(&mut self) -> Result<&StepMetrics, EngineError> {
        let nsteps = self.clock.nsteps();
        let t = self.next_step;
        if t > nsteps {
            return Err(EngineError::Finished { nsteps });
        }
        let started = Instant::now();
        let mut metrics = StepMetrics {
            step: t,
            ..StepMetrics::default()
        };

        let phase = Instant::now();
        self.forcing.update(t)?;
        metrics.forcing_us = elapsed_us(phase);

        if let Some(batch) = self.scheduler.as_mut().and_then(|s| s.release(t)) {
            metrics.released = self.state.append(batch)?;
            self.released += metrics.released;
        }

        if t % self.output_every == 0 {
            let phase = Instant::now();
            self.sink.write(&self.state, self.grid.as_ref())?;
            self.frames += 1;
            metrics.written = true;
            metrics.output_us = elapsed_us(phase);
        }

        if t < nsteps {
            let phase = Instant::now();
            let report = self.state.update(
                self.grid.as_ref(),
                &self.forcing,
                &self.tracker,
                self.hook.as_mut(),
            )?;
            metrics.update_us = elapsed_us(phase);
            metrics.moved = report.advance.moved;
            metrics.blocked = report.advance.blocked;
            metrics.killed = report.advance.killed;
            metrics.removed = report.removed;
        }
        metrics.remaining = self.state.len();
        metrics.total_us = elapsed_us(started);

        self.next_step = t + 1;
        self.last_metrics = metrics;
        Ok(&self.last_metrics)
    }

    /// Run every remaining step, then finish the output and close the
    /// forcing.
    pub fn run(&mut self) -> Result<RunSummary, EngineError> {
        let started = Instant::now();
        let first = self.next_step;
        while !self.is_finished() {
            self.step()?;
        }
        self.sink.finish(&self.state)?;
        self.forcing.close();

        let summary = RunSummary {
            steps: self.next_step - first,
            released: self.released,
            frames: self.frames,
            remaining: self.state.len(),
            elapsed_us: elapsed_us(started),
        };
        info!(
            parent: &self.span,
            steps = summary.steps,
            released = summary.released,
            frames = summary.frames,
            remaining = summary.remaining,
            elapsed_ms = summary.elapsed_us / 1000,
            "run complete"
        );
        Ok(summary)
    }

    /// Whether every step, including the final output step, has run.
    pub fn is_finished(&self) -> bool {
        self.next_step > self.clock.nsteps()
    }

    /// The next step [`step()`](Model::step) will run.
    pub fn next_step(&self) -> u64 {
        self.next_step
    }

    /// The particle ensemble.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// The model clock.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// The forcing provider.
    pub fn forcing(&self) -> &Forcing {
        &self.forcing
    }

    /// The release schedule, absent when nothing is left to release.
    pub fn scheduler(&self) -> Option<&ReleaseScheduler> {
        self.scheduler.as_ref()
    }

    /// Metrics of the most recent step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("start", &self.clock.start())
            .field("nsteps", &self.clock.nsteps())
            .field("next_step", &self.next_step)
            .field("particles", &self.state.len())
            .field("hook", &self.hook.name())
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

/// Append the names of `extra` not already in `names`.
fn merge_names(names: &mut Vec<String>, extra: Vec<String>) {
    for name in extra {
        if !names.contains(&name) {
            names.push(name);
        }
    }
}

fn elapsed_us(since: Instant) -> u64 {
    since.elapsed().as_micros() as u64
}
