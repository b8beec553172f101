//! Turning a release table into per-step particle batches.
//!
//! The whole schedule is built at construction: records are filtered
//! against the simulation window and the grid, grouped by model step,
//! expanded by multiplicity and numbered. [`ReleaseScheduler::release`]
//! then hands out one batch per step.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{NaiveDateTime, TimeDelta};
use drift_core::clock::epoch_seconds;
use drift_core::{Clock, Grid, ParticleBatch, Pid};
use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, warn, Span};

use crate::error::ReleaseError;
use crate::table::{ReleaseRecord, ReleaseTable};

/// Name of the attribute carrying each particle's release time, in
/// seconds since the Unix epoch.
pub const RELEASE_TIME: &str = "release_time";

/// How release records are turned into release events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Every record fires once, at the model step nearest its time.
    #[default]
    Discrete,
    /// The table is resampled every `frequency_seconds`, forward-filling
    /// the latest record.
    Continuous {
        /// Spacing of the synthetic release times.
        frequency_seconds: i64,
    },
}

/// Release settings of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct ReleaseConfig {
    /// Column names of the release file.
    pub format: Vec<String>,
    /// Discrete or continuous release.
    pub mode: ReleaseMode,
    /// Whether the run resumes from a warm start, which already holds
    /// every particle released up to the start time.
    pub warm_start: bool,
    /// First pid to assign.
    pub pid_offset: Pid,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            format: ["mult", "release_time", "X", "Y", "Z"]
                .into_iter()
                .map(String::from)
                .collect(),
            mode: ReleaseMode::Discrete,
            warm_start: false,
            pid_offset: Pid(0),
        }
    }
}

/// Record indices released together at one step, in file order.
type Group = SmallVec<[usize; 4]>;

/// Pre-computed release schedule.
#[derive(Debug)]
pub struct ReleaseScheduler {
    batches: BTreeMap<u64, ParticleBatch>,
    steps: Vec<u64>,
    total: usize,
    next_pid: Pid,
    span: Span,
}

impl ReleaseScheduler {
    /// Read the release file at `path` and build its schedule.
    pub fn from_path(
        path: impl AsRef<Path>,
        config: &ReleaseConfig,
        clock: &Clock,
        grid: Option<&dyn Grid>,
        span: Span,
    ) -> Result<Self, ReleaseError> {
        let table = ReleaseTable::read(path, &config.format, grid)?;
        Self::new(table, config, clock, grid, span)
    }

    /// Build the schedule for `table`.
    ///
    /// When `grid` is given, records outside its navigable domain are
    /// dropped with a warning.
    ///
    /// # Errors
    ///
    /// [`ReleaseError::Config`] for a non-positive continuous frequency
    /// and [`ReleaseError::Empty`] if no particle is left to release.
    pub fn new(
        table: ReleaseTable,
        config: &ReleaseConfig,
        clock: &Clock,
        grid: Option<&dyn Grid>,
        span: Span,
    ) -> Result<Self, ReleaseError> {
        let records = filter_records(&table, config, clock, grid, &span);
        let groups = match config.mode {
            ReleaseMode::Discrete => discrete_groups(&records, clock),
            ReleaseMode::Continuous { frequency_seconds } => {
                if frequency_seconds <= 0 {
                    return Err(ReleaseError::Config {
                        reason: format!(
                            "continuous release frequency must be positive, got {frequency_seconds} s"
                        ),
                    });
                }
                continuous_groups(&records, config.warm_start, clock, frequency_seconds, &span)
            }
        };

        let mut next_pid = config.pid_offset;
        let mut batches = BTreeMap::new();
        for (step, group) in groups {
            let batch = build_batch(
                &records,
                &group,
                table.extra_names(),
                epoch_seconds(clock.time_of(step)) as f64,
                &mut next_pid,
            );
            if !batch.is_empty() {
                batches.insert(step, batch);
            }
        }
        let total = (next_pid.0 - config.pid_offset.0) as usize;
        if total == 0 {
            return Err(ReleaseError::Empty);
        }

        let steps: Vec<u64> = batches.keys().copied().collect();
        debug!(
            parent: &span,
            records = records.len(),
            batches = steps.len(),
            particles = total,
            first_pid = config.pid_offset.0,
            "release schedule built"
        );
        Ok(Self {
            batches,
            steps,
            total,
            next_pid,
            span,
        })
    }

    /// Take the batch due at `step`, if any.
    ///
    /// Each batch is handed out once; asking again returns `None`.
    pub fn release(&mut self, step: u64) -> Option<ParticleBatch> {
        let batch = self.batches.remove(&step)?;
        debug!(parent: &self.span, step, count = batch.len(), "releasing particles");
        Some(batch)
    }

    /// Every step with a release, increasing.
    pub fn steps(&self) -> &[u64] {
        &self.steps
    }

    /// Number of particles released over the whole schedule.
    pub fn total_particle_count(&self) -> usize {
        self.total
    }

    /// Number of batches not yet released.
    pub fn pending(&self) -> usize {
        self.batches.len()
    }

    /// First pid after the whole schedule.
    pub fn next_pid(&self) -> Pid {
        self.next_pid
    }
}

/// Apply the time-window and grid filters, keeping time order.
///
/// In continuous mode records before the start stay: they may still be
/// the active record at the first ticks.
fn filter_records<'a>(
    table: &'a ReleaseTable,
    config: &ReleaseConfig,
    clock: &Clock,
    grid: Option<&dyn Grid>,
    span: &Span,
) -> Vec<&'a ReleaseRecord> {
    let (start, stop) = (clock.start(), clock.stop());
    let continuous = matches!(config.mode, ReleaseMode::Continuous { .. });
    let mut kept = Vec::with_capacity(table.len());
    for record in table.records() {
        if record.time > stop {
            debug!(parent: span, line = record.line, time = %record.time, "release after stop dropped");
            continue;
        }
        if !continuous {
            if config.warm_start && record.time <= start {
                debug!(
                    parent: span,
                    line = record.line,
                    time = %record.time,
                    "release covered by warm start dropped"
                );
                continue;
            }
            if record.time < start {
                warn!(
                    parent: span,
                    line = record.line,
                    time = %record.time,
                    start = %start,
                    "release before simulation start dropped"
                );
                continue;
            }
        }
        if let Some(grid) = grid {
            if !grid.ingrid(record.x, record.y) {
                warn!(
                    parent: span,
                    line = record.line,
                    x = record.x,
                    y = record.y,
                    "release outside the grid dropped"
                );
                continue;
            }
        }
        kept.push(record);
    }
    kept
}

fn discrete_groups(records: &[&ReleaseRecord], clock: &Clock) -> Vec<(u64, Group)> {
    let mut groups: Vec<(u64, Group)> = Vec::new();
    for (k, record) in records.iter().enumerate() {
        let Ok(step) = u64::try_from(clock.nearest_step(record.time)) else {
            continue;
        };
        match groups.last_mut() {
            Some((last, group)) if *last == step => group.push(k),
            _ => groups.push((step, smallvec::smallvec![k])),
        }
    }
    groups
}

fn continuous_groups(
    records: &[&ReleaseRecord],
    warm_start: bool,
    clock: &Clock,
    frequency_seconds: i64,
    span: &Span,
) -> Vec<(u64, Group)> {
    let (start, stop) = (clock.start(), clock.stop());
    let Some(first_record) = records.first() else {
        return Vec::new();
    };
    let first = if first_record.time < start {
        if !warm_start {
            warn!(
                parent: span,
                time = %first_record.time,
                start = %start,
                "continuous release table begins before the simulation start"
            );
        }
        start
    } else {
        first_record.time
    };

    let step_by = TimeDelta::seconds(frequency_seconds);
    let mut groups: Vec<(u64, Group)> = Vec::new();
    let mut tick: NaiveDateTime = first;
    while tick < stop {
        let due = tick;
        tick += step_by;
        if warm_start && due <= start {
            continue;
        }
        let latest = records.partition_point(|r| r.time <= due);
        let Some(active) = latest.checked_sub(1).map(|k| records[k].time) else {
            continue;
        };
        let Ok(step) = u64::try_from(clock.nearest_step(due)) else {
            continue;
        };
        let from = records[..latest].partition_point(|r| r.time < active);
        match groups.last_mut() {
            Some((last, group)) if *last == step => group.extend(from..latest),
            _ => groups.push((step, (from..latest).collect())),
        }
    }
    groups
}

fn build_batch(
    records: &[&ReleaseRecord],
    group: &Group,
    extra_names: &[String],
    release_time: f64,
    next_pid: &mut Pid,
) -> ParticleBatch {
    let count: usize = group.iter().map(|&k| records[k].mult as usize).sum();
    let mut batch = ParticleBatch {
        pid: Vec::with_capacity(count),
        x: Vec::with_capacity(count),
        y: Vec::with_capacity(count),
        z: Vec::with_capacity(count),
        attributes: IndexMap::new(),
    };
    let mut extras: Vec<Vec<f64>> = vec![Vec::with_capacity(count); extra_names.len()];
    for &k in group {
        let record = records[k];
        for _ in 0..record.mult {
            batch.pid.push(*next_pid);
            *next_pid = next_pid.next();
            batch.x.push(record.x);
            batch.y.push(record.y);
            batch.z.push(record.z);
            for (column, &value) in extras.iter_mut().zip(&record.extras) {
                column.push(value);
            }
        }
    }
    for (name, values) in extra_names.iter().zip(extras) {
        batch.attributes.insert(name.clone(), values);
    }
    batch
        .attributes
        .insert(RELEASE_TIME.to_string(), vec![release_time; count]);
    batch
}
