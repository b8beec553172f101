//! [`State`]: the struct-of-arrays particle ensemble.

use chrono::NaiveDateTime;
use drift_core::{BatchError, Clock, Grid, ParticleBatch, Pid, VelocityField};
use drift_tracker::{AdvanceReport, Particles, Tracker};
use indexmap::IndexMap;
use tracing::{debug, Span};

use crate::error::StateError;
use crate::hook::BehaviorHook;

/// Which variables the ensemble carries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateConfig {
    /// Per-particle values that change over time, one per live particle.
    pub instance_variables: Vec<String>,
    /// Values fixed at release, one per pid ever released.
    pub particle_variables: Vec<String>,
    /// Instance or particle variables that a warm start must restore.
    pub warm_start_variables: Vec<String>,
}

/// Outcome of one [`State::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// The step the ensemble advanced to.
    pub step: u64,
    /// Particles already outside the grid before advection.
    pub outside: usize,
    /// Tracker outcome counts.
    pub advance: AdvanceReport,
    /// Particles removed by compaction.
    pub removed: usize,
    /// Particles left after compaction.
    pub remaining: usize,
}

/// The particle ensemble.
///
/// Index `n` of every per-particle array refers to the same particle.
/// Pids increase strictly along the arrays and are never reused.
/// Compaction rewrites every array, so no slice borrowed from a
/// `State` survives a mutating call.
#[derive(Debug)]
pub struct State {
    pub(crate) clock: Clock,
    pub(crate) step: u64,
    pub(crate) pid: Vec<Pid>,
    pub(crate) x: Vec<f64>,
    pub(crate) y: Vec<f64>,
    pub(crate) z: Vec<f64>,
    pub(crate) alive: Vec<bool>,
    pub(crate) instance: IndexMap<String, Vec<f64>>,
    pub(crate) particle: IndexMap<String, Vec<f64>>,
    pub(crate) next_pid: Pid,
    pub(crate) span: Span,
}

impl State {
    /// An empty ensemble at step 0 whose first pid will be 0.
    pub fn new(config: &StateConfig, clock: Clock, span: Span) -> Self {
        let column = |names: &[String]| {
            names
                .iter()
                .map(|n| (n.clone(), Vec::new()))
                .collect::<IndexMap<_, _>>()
        };
        Self {
            clock,
            step: 0,
            pid: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            alive: Vec::new(),
            instance: column(&config.instance_variables),
            particle: column(&config.particle_variables),
            next_pid: Pid(0),
            span,
        }
    }

    // ── Accessors ───────────────────────────────────────────────

    /// Number of live particles.
    pub fn len(&self) -> usize {
        self.pid.len()
    }

    /// Whether there are no live particles.
    pub fn is_empty(&self) -> bool {
        self.pid.is_empty()
    }

    /// Current model step.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Model time of the current step.
    pub fn time(&self) -> NaiveDateTime {
        self.clock.time_of(self.step)
    }

    /// The model clock.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// The pid the next released particle will receive.
    pub fn next_pid(&self) -> Pid {
        self.next_pid
    }

    /// Number of particles ever released, dead or alive.
    pub fn released_count(&self) -> usize {
        self.next_pid.index()
    }

    /// Particle ids.
    pub fn pid(&self) -> &[Pid] {
        &self.pid
    }

    /// X positions.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Y positions.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Depths.
    pub fn z(&self) -> &[f64] {
        &self.z
    }

    /// Alive flags.
    pub fn alive(&self) -> &[bool] {
        &self.alive
    }

    /// Mutable positions `(X, Y, Z)`.
    pub fn positions_mut(&mut self) -> (&mut [f64], &mut [f64], &mut [f64]) {
        (&mut self.x, &mut self.y, &mut self.z)
    }

    /// Mutable alive flags. Cleared particles are removed at the end of
    /// the step.
    pub fn alive_mut(&mut self) -> &mut [bool] {
        &mut self.alive
    }

    /// Instance variable `name`, one value per live particle.
    pub fn instance(&self, name: &str) -> Option<&[f64]> {
        self.instance.get(name).map(Vec::as_slice)
    }

    /// Mutable instance variable `name`.
    pub fn instance_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        self.instance.get_mut(name).map(Vec::as_mut_slice)
    }

    /// Particle variable `name`, indexed by pid.
    pub fn particle(&self, name: &str) -> Option<&[f64]> {
        self.particle.get(name).map(Vec::as_slice)
    }

    /// Mutable particle variable `name`, indexed by pid.
    pub fn particle_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        self.particle.get_mut(name).map(Vec::as_mut_slice)
    }

    /// Names of the instance variables, in configuration order.
    pub fn instance_names(&self) -> impl Iterator<Item = &str> {
        self.instance.keys().map(String::as_str)
    }

    /// Names of the particle variables, in configuration order.
    pub fn particle_names(&self) -> impl Iterator<Item = &str> {
        self.particle.keys().map(String::as_str)
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Append a release batch.
    ///
    /// Batch attributes fill the instance and particle variables of the
    /// same name; variables the batch does not carry are zero-filled.
    /// Returns the number of particles added.
    ///
    /// # Errors
    ///
    /// [`StateError::Batch`] if the batch is ragged or its first pid is
    /// not [`next_pid`](State::next_pid).
    pub fn append(&mut self, batch: ParticleBatch) -> Result<usize, StateError> {
        batch.validate()?;
        let Some(&first) = batch.pid.first() else {
            return Ok(0);
        };
        if first != self.next_pid {
            return Err(BatchError::PidOrder {
                expected: self.next_pid,
                found: first,
            }
            .into());
        }

        let n = batch.len();
        let ParticleBatch {
            pid,
            x,
            y,
            z,
            attributes,
        } = batch;
        for (name, column) in self.instance.iter_mut() {
            extend_or_zero(column, attributes.get(name), n);
        }
        for (name, column) in self.particle.iter_mut() {
            extend_or_zero(column, attributes.get(name), n);
        }
        self.pid.extend(pid);
        self.x.extend(x);
        self.y.extend(y);
        self.z.extend(z);
        self.alive.resize(self.pid.len(), true);
        self.next_pid = Pid(self.next_pid.0 + n as u64);

        debug!(
            parent: &self.span,
            step = self.step,
            released = n,
            first_pid = first.0,
            total = self.len(),
            "appended release batch"
        );
        Ok(n)
    }

    /// Remove every particle whose alive flag is clear from every
    /// per-particle array, keeping the survivors in order. Returns the
    /// number removed.
    pub fn compact(&mut self) -> usize {
        let before = self.len();
        if self.alive.iter().all(|&a| a) {
            return 0;
        }
        retain_marked(&mut self.pid, &self.alive);
        retain_marked(&mut self.x, &self.alive);
        retain_marked(&mut self.y, &self.alive);
        retain_marked(&mut self.z, &self.alive);
        for column in self.instance.values_mut() {
            retain_marked(column, &self.alive);
        }
        self.alive.retain(|&a| a);
        before - self.len()
    }

    /// Run one model step on the ensemble.
    ///
    /// In order: reset the alive mask to "inside the grid", advance the
    /// step counter, advect with `tracker`, run `hook`, reflect negative
    /// depths and lift particles below the bottom to `0.99 * H`, then
    /// compact.
    ///
    /// # Errors
    ///
    /// [`StateError::Hook`] if the behavior hook fails; the ensemble is
    /// then left uncompacted.
    pub fn update(
        &mut self,
        grid: &dyn Grid,
        field: &dyn VelocityField,
        tracker: &Tracker,
        hook: &mut dyn BehaviorHook,
    ) -> Result<StepReport, StateError> {
        for ((alive, &x), &y) in self.alive.iter_mut().zip(&self.x).zip(&self.y) {
            *alive = grid.ingrid(x, y);
        }
        let outside = self.alive.iter().filter(|&&a| !a).count();

        let from = self.step;
        self.step += 1;
        let advance = tracker.advance(
            grid,
            field,
            from,
            Particles {
                x: &mut self.x,
                y: &mut self.y,
                z: &self.z,
                alive: &mut self.alive,
            },
        );

        hook.update(grid, self, field)
            .map_err(|source| StateError::Hook {
                name: hook.name().to_string(),
                source,
            })?;

        self.correct_depths(grid);
        let removed = self.compact();
        let report = StepReport {
            step: self.step,
            outside,
            advance,
            removed,
            remaining: self.len(),
        };
        debug!(
            parent: &self.span,
            step = report.step,
            outside,
            removed,
            remaining = report.remaining,
            "ensemble updated"
        );
        Ok(report)
    }

    /// Reflect particles above the surface and lift particles below the
    /// bottom.
    fn correct_depths(&mut self, grid: &dyn Grid) {
        for ((z, &x), &y) in self.z.iter_mut().zip(&self.x).zip(&self.y) {
            if *z < 0.0 {
                *z = -*z;
            }
            let h = grid.depth(x, y);
            if *z > h {
                *z = 0.99 * h;
            }
        }
    }
}

fn extend_or_zero(column: &mut Vec<f64>, values: Option<&Vec<f64>>, n: usize) {
    match values {
        Some(values) => column.extend_from_slice(values),
        None => column.resize(column.len() + n, 0.0),
    }
}

/// Keep the entries whose flag in `keep` is set, preserving order.
pub(crate) fn retain_marked<T>(values: &mut Vec<T>, keep: &[bool]) {
    let mut flags = keep.iter();
    values.retain(|_| flags.next().copied().unwrap_or(false));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use drift_core::FieldError;
    use drift_test_utils::{ts, MockGrid, UniformField};
    use drift_tracker::{Scheme, TrackerConfig};
    use proptest::prelude::*;

    use crate::error::HookError;
    use crate::hook::NoBehavior;

    fn config() -> StateConfig {
        StateConfig {
            instance_variables: vec!["age".into(), "weight".into()],
            particle_variables: vec!["release_time".into(), "super".into()],
            warm_start_variables: Vec::new(),
        }
    }

    fn state() -> State {
        let clock = Clock::new(ts("2015-04-01T00"), ts("2015-04-02T00"), 3600).unwrap();
        State::new(&config(), clock, Span::none())
    }

    fn batch(first: u64, points: &[(f64, f64, f64)]) -> ParticleBatch {
        let n = points.len();
        let mut attributes = IndexMap::new();
        attributes.insert("super".to_string(), vec![7.0; n]);
        attributes.insert("weight".to_string(), vec![0.5; n]);
        attributes.insert("colour".to_string(), vec![1.0; n]);
        ParticleBatch {
            pid: (first..first + n as u64).map(Pid).collect(),
            x: points.iter().map(|p| p.0).collect(),
            y: points.iter().map(|p| p.1).collect(),
            z: points.iter().map(|p| p.2).collect(),
            attributes,
        }
    }

    fn tracker() -> Tracker {
        let config = TrackerConfig {
            scheme: Scheme::Rk4,
            dt: 3600.0,
            ..TrackerConfig::default()
        };
        Tracker::new(&config, Span::none()).unwrap()
    }

    struct FnHook<F>(F);

    impl<F: FnMut(&mut State)> BehaviorHook for FnHook<F> {
        fn name(&self) -> &str {
            "test"
        }

        fn update(
            &mut self,
            _grid: &dyn Grid,
            state: &mut State,
            _field: &dyn VelocityField,
        ) -> Result<(), HookError> {
            (self.0)(state);
            Ok(())
        }
    }

    #[test]
    fn append_fills_configured_variables() {
        let mut s = state();
        assert_eq!(s.append(batch(0, &[(3.0, 3.0, 1.0), (4.0, 4.0, 2.0)])).unwrap(), 2);
        assert_eq!(s.instance("weight").unwrap(), &[0.5, 0.5]);
        assert_eq!(s.instance("age").unwrap(), &[0.0, 0.0]);
        assert_eq!(s.particle("super").unwrap(), &[7.0, 7.0]);
        assert_eq!(s.particle("release_time").unwrap(), &[0.0, 0.0]);
        assert!(s.instance("colour").is_none());
        assert_eq!(s.next_pid(), Pid(2));
        assert_eq!(s.alive(), &[true, true]);
    }

    #[test]
    fn append_requires_pid_continuation() {
        let mut s = state();
        s.append(batch(0, &[(3.0, 3.0, 0.0)])).unwrap();
        let err = s.append(batch(5, &[(3.0, 3.0, 0.0)])).unwrap_err();
        assert_eq!(
            err,
            StateError::Batch(BatchError::PidOrder {
                expected: Pid(1),
                found: Pid(5)
            })
        );
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn append_rejects_ragged_batches() {
        let mut s = state();
        let mut b = batch(0, &[(3.0, 3.0, 0.0), (4.0, 4.0, 0.0)]);
        b.z.pop();
        assert!(matches!(
            s.append(b),
            Err(StateError::Batch(BatchError::LengthMismatch { .. }))
        ));
        assert!(s.is_empty());
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut s = state();
        assert_eq!(s.append(ParticleBatch::default()).unwrap(), 0);
        assert_eq!(s.next_pid(), Pid(0));
    }

    #[test]
    fn particle_variables_outlive_their_particles() {
        let mut s = state();
        s.append(batch(0, &[(3.0, 3.0, 0.0), (4.0, 4.0, 0.0)])).unwrap();
        s.alive_mut()[0] = false;
        assert_eq!(s.compact(), 1);
        s.append(batch(2, &[(5.0, 5.0, 0.0)])).unwrap();
        assert_eq!(s.pid(), &[Pid(1), Pid(2)]);
        assert_eq!(s.particle("super").unwrap().len(), 3);
        assert_eq!(s.instance("weight").unwrap().len(), 2);
        assert_eq!(s.released_count(), 3);
    }

    #[test]
    fn update_advects_and_advances_time() {
        let grid = MockGrid::open_box(20, 20);
        let field = UniformField::new(0.1, 0.0);
        let mut s = state();
        s.append(batch(0, &[(5.0, 5.0, 10.0)])).unwrap();
        let report = s.update(&grid, &field, &tracker(), &mut NoBehavior).unwrap();
        assert_eq!(report.step, 1);
        assert_eq!(s.time(), ts("2015-04-01T01"));
        assert_relative_eq!(s.x()[0], 5.36, epsilon = 1e-12);
        assert_eq!(report.advance.moved, 1);
    }

    #[test]
    fn update_removes_particles_outside_the_grid() {
        let grid = MockGrid::open_box(10, 10);
        let field = UniformField::new(0.2, 0.0);
        let mut s = state();
        // Outside already, leaving this step, staying inside.
        s.append(batch(0, &[(0.5, 5.0, 0.0), (7.5, 5.0, 0.0), (3.0, 5.0, 0.0)]))
            .unwrap();
        let report = s.update(&grid, &field, &tracker(), &mut NoBehavior).unwrap();
        assert_eq!(report.outside, 1);
        assert_eq!(report.advance.killed, 1);
        assert_eq!(report.removed, 2);
        assert_eq!(s.pid(), &[Pid(2)]);
        assert_eq!(s.alive(), &[true]);
    }

    #[test]
    fn hook_can_kill_and_depths_are_corrected_afterwards() {
        let grid = MockGrid::open_box(10, 10).with_depth(40.0, 2);
        let field = UniformField::still();
        let mut s = state();
        s.append(batch(0, &[(3.0, 3.0, 5.0), (4.0, 4.0, 5.0), (5.0, 5.0, 5.0)]))
            .unwrap();
        let mut hook = FnHook(|state: &mut State| {
            let (_, _, z) = state.positions_mut();
            z[0] = -3.0;
            z[2] = 55.0;
            state.alive_mut()[1] = false;
            if let Some(age) = state.instance_mut("age") {
                age.iter_mut().for_each(|a| *a += 1.0);
            }
        });
        let report = s.update(&grid, &field, &tracker(), &mut hook).unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(s.pid(), &[Pid(0), Pid(2)]);
        assert_eq!(s.z(), &[3.0, 0.99 * 40.0]);
        assert_eq!(s.instance("age").unwrap(), &[1.0, 1.0]);
    }

    #[test]
    fn hook_failure_is_reported_with_its_name() {
        struct Failing;
        impl BehaviorHook for Failing {
            fn name(&self) -> &str {
                "failing"
            }
            fn update(
                &mut self,
                _grid: &dyn Grid,
                _state: &mut State,
                _field: &dyn VelocityField,
            ) -> Result<(), HookError> {
                Err(FieldError::UnknownField {
                    name: "temp".into(),
                }
                .into())
            }
        }
        let grid = MockGrid::open_box(10, 10);
        let mut s = state();
        let err = s
            .update(&grid, &UniformField::still(), &tracker(), &mut Failing)
            .unwrap_err();
        assert!(matches!(err, StateError::Hook { ref name, .. } if name == "failing"));
    }

    proptest! {
        #[test]
        fn compaction_keeps_survivors_in_order(mask in prop::collection::vec(any::<bool>(), 0..64)) {
            let mut s = state();
            let points: Vec<_> = (0..mask.len()).map(|n| (n as f64, 0.0, 0.0)).collect();
            s.append(batch(0, &points)).unwrap();
            s.alive_mut().copy_from_slice(&mask);
            let removed = s.compact();

            let expected: Vec<Pid> = mask
                .iter()
                .enumerate()
                .filter(|(_, &keep)| keep)
                .map(|(n, _)| Pid(n as u64))
                .collect();
            prop_assert_eq!(removed, mask.len() - expected.len());
            prop_assert_eq!(s.pid(), expected.as_slice());
            let xs: Vec<f64> = expected.iter().map(|p| p.0 as f64).collect();
            prop_assert_eq!(s.x(), xs.as_slice());
            prop_assert_eq!(s.instance("weight").unwrap().len(), expected.len());
            prop_assert_eq!(s.z().len(), expected.len());
            prop_assert!(s.alive().iter().all(|&a| a));
            prop_assert_eq!(s.particle("super").unwrap().len(), mask.len());
        }
    }
}
