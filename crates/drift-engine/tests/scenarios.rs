//! Whole-run scenarios on a 20 x 20 box with uniform forcing.

use std::path::PathBuf;
use std::sync::Arc;

use approx::assert_relative_eq;
use drift_core::Grid;
use drift_engine::{EngineError, Model, ModelConfig, WarmStartConfig};
use drift_ibm::age::AGE;
use drift_ibm::{IbmConfig, IbmRegistry};
use drift_output::{NullSink, OutputSink, RaggedReader, RaggedWriter};
use drift_release::{ReleaseError, ReleaseMode};
use drift_state::{BehaviorHook, NoBehavior};
use drift_test_utils::fixtures::{write_text, write_uniform_forcing, UniformFrame};
use drift_test_utils::{ts, MockGrid};
use drift_tracker::Scheme;
use tempfile::TempDir;
use tracing::Span;

const SHAPE: (usize, usize, usize) = (20, 20, 1);

fn grid() -> Arc<dyn Grid> {
    Arc::new(MockGrid::open_box(20, 20))
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Uniform eastward current `u` at every hour from `from` to `to`.
fn steady(from: u32, to: u32, u: f64) -> Vec<UniformFrame> {
    (from..=to)
        .map(|h| UniformFrame::new(ts(&format!("2015-04-01T{h:02}")), u, 0.0))
        .collect()
}

struct Case {
    dir: TempDir,
}

impl Case {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// An Euler-forward hourly run over `[start, stop]` reading
    /// `frames` and the release table `release`.
    fn config(
        &self,
        start: &str,
        stop: &str,
        frames: &[UniformFrame],
        release: &str,
    ) -> ModelConfig {
        let forcing = write_uniform_forcing(&self.path("ocean.drfc"), SHAPE, frames);
        let release = write_text(self.dir.path(), "drift.rls", release);
        let mut config = ModelConfig::new(ts(start), ts(stop), 3600);
        config.forcing_sources = vec![forcing];
        config.release_file = Some(release);
        config.scheme = Scheme::EulerForward;
        config
    }

    fn writer(&self, name: &str, config: &ModelConfig) -> Box<dyn OutputSink> {
        Box::new(
            RaggedWriter::create(
                self.path(name),
                &config.instance_variables,
                &config.particle_variables,
                false,
                Span::none(),
            )
            .unwrap(),
        )
    }
}

fn model(config: ModelConfig, hook: Box<dyn BehaviorHook>, sink: Box<dyn OutputSink>) -> Model {
    Model::new(config, grid(), hook, sink, Span::none()).unwrap()
}

#[test]
fn released_particles_move_within_their_release_step() {
    let case = Case::new();
    // u ramps from 0 at T00 to 1 m/s at T02, so it is 0.5 m/s at T01.
    let frames = [
        UniformFrame::new(ts("2015-04-01T00"), 0.0, 0.0),
        UniformFrame::new(ts("2015-04-01T02"), 1.0, 0.0),
    ];
    let config = case.config(
        "2015-04-01T00",
        "2015-04-01T02",
        &frames,
        "1 2015-04-01T01 5 5 0\n",
    );
    let sink = case.writer("run.out", &config);
    let mut m = model(config, Box::new(NoBehavior), sink);

    let step0 = m.step().unwrap().clone();
    assert_eq!((step0.released, step0.remaining), (0, 0));
    assert!(step0.written);

    let step1 = m.step().unwrap().clone();
    assert_eq!(step1.released, 1);
    assert_eq!(step1.moved, 1);
    // 0.5 m/s * 3600 s over 1000 m cells.
    assert_relative_eq!(m.state().x()[0], 6.8, epsilon = 1e-9);

    let summary = m.run().unwrap();
    assert_eq!(summary.steps, 1);
    assert_eq!(summary.frames, 3);

    let out = RaggedReader::open_path(case.path("run.out")).unwrap();
    let frames = out.frames();
    assert_eq!(frames.len(), 3);
    assert!(frames[0].pid.is_empty());
    // Output at the release step precedes advection.
    assert_eq!(frames[1].x, vec![5.0]);
    assert_relative_eq!(frames[2].x[0], 6.8, epsilon = 1e-9);
    assert_eq!(frames[2].time, ts("2015-04-01T02"));
}

#[test]
fn output_follows_its_period() {
    let case = Case::new();
    let mut config = case.config(
        "2015-04-01T00",
        "2015-04-01T04",
        &steady(0, 4, 0.0),
        "1 2015-04-01 5 5 0\n",
    );
    config.output_period_seconds = 7200;
    let sink = case.writer("run.out", &config);
    let mut m = model(config, Box::new(NoBehavior), sink);

    let summary = m.run().unwrap();
    assert_eq!(summary.steps, 5);
    assert_eq!(summary.frames, 3);
    assert_eq!(summary.released, 1);

    let out = RaggedReader::open_path(case.path("run.out")).unwrap();
    let times: Vec<_> = out.frames().iter().map(|f| f.time).collect();
    assert_eq!(
        times,
        vec![ts("2015-04-01T00"), ts("2015-04-01T02"), ts("2015-04-01T04")]
    );
}

#[test]
fn stepping_past_the_end_is_an_error() {
    let case = Case::new();
    let config = case.config(
        "2015-04-01T00",
        "2015-04-01T01",
        &steady(0, 1, 0.0),
        "1 2015-04-01 5 5 0\n",
    );
    let mut m = model(config, Box::new(NoBehavior), Box::new(NullSink));
    m.run().unwrap();
    assert!(m.is_finished());
    assert_eq!(m.next_step(), 2);
    assert!(matches!(m.step(), Err(EngineError::Finished { nsteps: 1 })));
}

#[test]
fn particles_leaving_the_grid_are_removed() {
    let case = Case::new();
    // 2 m/s carries a particle 7.2 cells per step; X = 15 leaves at once.
    let config = case.config(
        "2015-04-01T00",
        "2015-04-01T02",
        &steady(0, 2, 2.0),
        "1 2015-04-01 15 5 0\n1 2015-04-01 3 5 0\n",
    );
    let mut m = model(config, Box::new(NoBehavior), Box::new(NullSink));
    let step0 = m.step().unwrap();
    assert_eq!(step0.released, 2);
    assert_eq!(step0.killed, 1);
    assert_eq!(step0.remaining, 1);
    assert_relative_eq!(m.state().x()[0], 10.2, epsilon = 1e-9);
}

#[test]
fn warm_start_continues_a_finished_run() {
    let case = Case::new();
    let frames = steady(0, 4, 0.5);
    let first = case.config(
        "2015-04-01T00",
        "2015-04-01T02",
        &frames,
        "2 2015-04-01 5 5 0\n",
    );
    let sink = case.writer("first.out", &first);
    let summary = model(first, Box::new(NoBehavior), sink).run().unwrap();
    assert_eq!(summary.remaining, 2);

    // The T00 record was already released by the first run.
    let mut second = case.config(
        "2015-04-01T02",
        "2015-04-01T04",
        &frames,
        "2 2015-04-01 5 5 0\n1 2015-04-01T03 5 5 0\n",
    );
    second.warm_start = Some(WarmStartConfig {
        source: case.path("first.out"),
        variables: Vec::new(),
    });
    let mut m = model(second, Box::new(NoBehavior), Box::new(NullSink));
    assert_eq!(m.state().len(), 2);
    assert_eq!(m.scheduler().unwrap().total_particle_count(), 1);
    m.run().unwrap();

    let pids: Vec<u64> = m.state().pid().iter().map(|p| p.0).collect();
    assert_eq!(pids, vec![0, 1, 2]);
    let x = m.state().x();
    assert_relative_eq!(x[0], 12.2, epsilon = 1e-9);
    assert_relative_eq!(x[1], 12.2, epsilon = 1e-9);
    assert_relative_eq!(x[2], 6.8, epsilon = 1e-9);
}

#[test]
fn warm_start_with_nothing_left_to_release_runs_without_a_schedule() {
    let case = Case::new();
    let frames = steady(0, 2, 0.0);
    let first = case.config(
        "2015-04-01T00",
        "2015-04-01T01",
        &frames,
        "1 2015-04-01 5 5 0\n",
    );
    let sink = case.writer("first.out", &first);
    model(first, Box::new(NoBehavior), sink).run().unwrap();

    let mut second = case.config(
        "2015-04-01T01",
        "2015-04-01T02",
        &frames,
        "1 2015-04-01 5 5 0\n",
    );
    second.warm_start = Some(WarmStartConfig {
        source: case.path("first.out"),
        variables: Vec::new(),
    });
    let mut m = model(second, Box::new(NoBehavior), Box::new(NullSink));
    assert!(m.scheduler().is_none());
    assert_eq!(m.run().unwrap().remaining, 1);
}

#[test]
fn cold_start_without_releases_is_fatal() {
    let case = Case::new();
    let config = case.config(
        "2015-04-01T02",
        "2015-04-01T03",
        &steady(0, 3, 0.0),
        "1 2015-04-01T00 5 5 0\n",
    );
    let err = Model::new(config, grid(), Box::new(NoBehavior), Box::new(NullSink), Span::none())
        .unwrap_err();
    assert!(matches!(err, EngineError::Release(ReleaseError::Empty)));
}

#[test]
fn forcing_that_ends_early_is_fatal() {
    let case = Case::new();
    let config = case.config(
        "2015-04-01T00",
        "2015-04-01T04",
        &steady(0, 2, 0.0),
        "1 2015-04-01 5 5 0\n",
    );
    let err = Model::new(config, grid(), Box::new(NoBehavior), Box::new(NullSink), Span::none())
        .unwrap_err();
    assert!(matches!(err, EngineError::Forcing(_)));
}

#[test]
fn continuous_release_repeats_every_period() {
    let case = Case::new();
    let mut config = case.config(
        "2015-04-01T00",
        "2015-04-01T04",
        &steady(0, 4, 0.0),
        "2 2015-04-01 5 5 0\n",
    );
    config.release_mode = ReleaseMode::Continuous {
        frequency_seconds: 7200,
    };
    let mut m = model(config, Box::new(NoBehavior), Box::new(NullSink));
    let released: Vec<usize> = (0..=4).map(|_| m.step().unwrap().released).collect();
    assert_eq!(released, vec![2, 0, 2, 0, 0]);
    assert_eq!(m.state().len(), 4);
}

#[test]
fn registry_modules_drive_the_ensemble() {
    let case = Case::new();
    let config = case.config(
        "2015-04-01T00",
        "2015-04-01T04",
        &steady(0, 4, 0.0),
        "1 2015-04-01 5 5 0\n",
    );
    let registry = IbmRegistry::with_defaults();
    let hook = registry
        .build(&IbmConfig::new("lifespan").with_param("max_age", 5400.0))
        .unwrap();
    let mut m = model(config, hook, Box::new(NullSink));
    assert_eq!(m.state().instance(AGE), Some(&[][..]));

    m.step().unwrap();
    assert_eq!(m.state().instance(AGE).unwrap(), &[3600.0]);
    let step1 = m.step().unwrap();
    assert_eq!((step1.removed, step1.remaining), (1, 0));

    let case = Case::new();
    let config = case.config(
        "2015-04-01T00",
        "2015-04-01T02",
        &steady(0, 2, 0.0),
        "1 2015-04-01 5 5 10\n",
    );
    let hook = registry
        .build(&IbmConfig::new("sinking").with_param("speed", 0.001))
        .unwrap();
    let mut m = model(config, hook, Box::new(NullSink));
    m.run().unwrap();
    assert_relative_eq!(m.state().z()[0], 17.2, epsilon = 1e-9);
}

#[test]
fn consumed_fields_are_read_from_the_forcing() {
    let case = Case::new();
    let frames: Vec<_> = steady(0, 1, 0.0)
        .into_iter()
        .map(|f| f.with_scalar("temp", 12.0))
        .collect();
    let mut config = case.config(
        "2015-04-01T00",
        "2015-04-01T01",
        &frames,
        "1 2015-04-01 5 5 0\n",
    );
    config.instance_variables = names(&[AGE]);
    let hook = IbmRegistry::with_defaults()
        .build(&IbmConfig::new("age").with_param("degree_days", 1.0))
        .unwrap();
    let mut m = model(config, hook, Box::new(NullSink));
    assert!(m.forcing().registered_fields().iter().any(|f| f == "temp"));
    m.run().unwrap();
    assert_relative_eq!(m.state().instance(AGE).unwrap()[0], 0.5, epsilon = 1e-12);
}
