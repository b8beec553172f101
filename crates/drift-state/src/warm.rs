//! Resuming an ensemble from a persisted snapshot.

use chrono::NaiveDateTime;
use drift_core::{Clock, Grid, Pid};
use indexmap::IndexMap;
use tracing::{info, Span};

use crate::error::StateError;
use crate::state::{State, StateConfig};

/// The last time frame of a persisted ensemble.
///
/// Built by the output reader. Instance variables have one value per
/// particle of the frame; particle variables are indexed by pid and
/// cover every pid released before the snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct WarmStart {
    /// Time of the frame.
    pub time: NaiveDateTime,
    /// Particle ids of the frame, increasing.
    pub pid: Vec<Pid>,
    /// X positions.
    pub x: Vec<f64>,
    /// Y positions.
    pub y: Vec<f64>,
    /// Depths.
    pub z: Vec<f64>,
    /// Instance variables of the frame.
    pub instance: IndexMap<String, Vec<f64>>,
    /// Particle variables, indexed by pid.
    pub particle: IndexMap<String, Vec<f64>>,
    /// First pid not yet used by the previous run.
    pub next_pid: Pid,
}

impl WarmStart {
    /// Number of particles in the frame.
    pub fn len(&self) -> usize {
        self.pid.len()
    }

    /// Whether the frame holds no particles.
    pub fn is_empty(&self) -> bool {
        self.pid.is_empty()
    }

    /// Check column lengths and pid ordering.
    pub fn validate(&self) -> Result<(), StateError> {
        let n = self.len();
        let bad = |reason: String| Err(StateError::WarmStart { reason });
        for (name, len) in [("X", self.x.len()), ("Y", self.y.len()), ("Z", self.z.len())] {
            if len != n {
                return bad(format!("column {name} has {len} values for {n} particles"));
            }
        }
        for (name, column) in &self.instance {
            if column.len() != n {
                return bad(format!(
                    "instance variable {name} has {} values for {n} particles",
                    column.len()
                ));
            }
        }
        if self.pid.windows(2).any(|w| w[0] >= w[1]) {
            return bad("pids are not strictly increasing".into());
        }
        if self.pid.last().is_some_and(|&p| p >= self.next_pid) {
            return bad(format!("pids reach past next pid {}", self.next_pid));
        }
        for (name, column) in &self.particle {
            if column.len() != self.next_pid.index() {
                return bad(format!(
                    "particle variable {name} has {} values for {} pids",
                    column.len(),
                    self.next_pid
                ));
            }
        }
        Ok(())
    }
}

impl State {
    /// Restore an ensemble from the last frame of a previous run.
    ///
    /// Instance variables named in `warm_start_variables` are restored;
    /// other instance variables start at zero. Particle variables are
    /// restored where the snapshot has them. Particles outside `grid`
    /// are then dropped, so a run on a smaller subgrid never revives
    /// them. The pid sequence continues from the snapshot.
    ///
    /// # Errors
    ///
    /// [`StateError::MissingVariable`] if a warm-start variable is not
    /// in the snapshot and [`StateError::WarmStart`] if the snapshot is
    /// inconsistent.
    pub fn from_warm_start(
        config: &StateConfig,
        clock: Clock,
        mut warm: WarmStart,
        grid: &dyn Grid,
        span: Span,
    ) -> Result<Self, StateError> {
        warm.validate()?;
        for name in &config.warm_start_variables {
            let known = warm.instance.contains_key(name) || warm.particle.contains_key(name);
            if !known && !matches!(name.as_str(), "pid" | "X" | "Y" | "Z") {
                return Err(StateError::MissingVariable { name: name.clone() });
            }
        }

        let n = warm.len();
        let released = warm.next_pid.index();
        let mut state = State::new(config, clock, span);
        for (name, column) in state.instance.iter_mut() {
            let restored = config
                .warm_start_variables
                .contains(name)
                .then(|| warm.instance.swap_remove(name))
                .flatten();
            *column = restored.unwrap_or_else(|| vec![0.0; n]);
        }
        for (name, column) in state.particle.iter_mut() {
            *column = warm
                .particle
                .swap_remove(name)
                .unwrap_or_else(|| vec![0.0; released]);
        }
        state.alive = warm
            .x
            .iter()
            .zip(&warm.y)
            .map(|(&x, &y)| grid.ingrid(x, y))
            .collect();
        state.pid = warm.pid;
        state.x = warm.x;
        state.y = warm.y;
        state.z = warm.z;
        state.next_pid = warm.next_pid;
        let dropped = state.compact();

        info!(
            parent: &state.span,
            time = %warm.time,
            restored = state.len(),
            dropped,
            next_pid = state.next_pid.0,
            "warm start"
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_core::ParticleBatch;
    use drift_test_utils::{ts, MockGrid};

    fn snapshot() -> WarmStart {
        let mut instance = IndexMap::new();
        instance.insert("age".to_string(), vec![10.0, 20.0, 30.0]);
        let mut particle = IndexMap::new();
        particle.insert("super".to_string(), (0..6).map(f64::from).collect());
        WarmStart {
            time: ts("2015-04-03T00"),
            pid: vec![Pid(1), Pid(3), Pid(4)],
            x: vec![3.0, 0.5, 6.0],
            y: vec![3.0, 3.0, 6.0],
            z: vec![1.0, 2.0, 3.0],
            instance,
            particle,
            next_pid: Pid(6),
        }
    }

    fn config(warm: &[&str]) -> StateConfig {
        StateConfig {
            instance_variables: vec!["age".into(), "weight".into()],
            particle_variables: vec!["super".into()],
            warm_start_variables: warm.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn clock() -> Clock {
        Clock::new(ts("2015-04-03T00"), ts("2015-04-04T00"), 3600).unwrap()
    }

    #[test]
    fn restores_and_refilters_to_the_grid() {
        let grid = MockGrid::open_box(10, 10);
        let s = State::from_warm_start(&config(&["age"]), clock(), snapshot(), &grid, Span::none())
            .unwrap();
        // Pid 3 sits at X = 0.5, outside the navigable extent.
        assert_eq!(s.pid(), &[Pid(1), Pid(4)]);
        assert_eq!(s.z(), &[1.0, 3.0]);
        assert_eq!(s.instance("age").unwrap(), &[10.0, 30.0]);
        assert_eq!(s.instance("weight").unwrap(), &[0.0, 0.0]);
        assert_eq!(s.particle("super").unwrap().len(), 6);
        assert_eq!(s.next_pid(), Pid(6));
        assert_eq!(s.time(), ts("2015-04-03T00"));
    }

    #[test]
    fn unrequested_instance_variables_start_at_zero() {
        let grid = MockGrid::open_box(10, 10);
        let s = State::from_warm_start(&config(&[]), clock(), snapshot(), &grid, Span::none())
            .unwrap();
        assert_eq!(s.instance("age").unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn missing_warm_start_variable_is_fatal() {
        let grid = MockGrid::open_box(10, 10);
        let err =
            State::from_warm_start(&config(&["weight"]), clock(), snapshot(), &grid, Span::none())
                .unwrap_err();
        assert_eq!(
            err,
            StateError::MissingVariable {
                name: "weight".into()
            }
        );
    }

    #[test]
    fn inconsistent_snapshot_is_rejected() {
        let grid = MockGrid::open_box(10, 10);
        let mut bad = snapshot();
        bad.next_pid = Pid(4);
        assert!(matches!(
            State::from_warm_start(&config(&[]), clock(), bad, &grid, Span::none()),
            Err(StateError::WarmStart { .. })
        ));

        let mut unsorted = snapshot();
        unsorted.pid.swap(0, 1);
        assert!(unsorted.validate().is_err());
    }

    #[test]
    fn releases_continue_the_pid_sequence() {
        let grid = MockGrid::open_box(10, 10);
        let mut s = State::from_warm_start(&config(&[]), clock(), snapshot(), &grid, Span::none())
            .unwrap();
        let batch = ParticleBatch {
            pid: vec![Pid(6)],
            x: vec![4.0],
            y: vec![4.0],
            z: vec![0.0],
            attributes: IndexMap::new(),
        };
        s.append(batch).unwrap();
        assert_eq!(s.pid(), &[Pid(1), Pid(4), Pid(6)]);
        assert_eq!(s.particle("super").unwrap().len(), 7);
    }
}
