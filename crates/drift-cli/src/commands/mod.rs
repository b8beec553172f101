//! Subcommands.

pub mod info;
pub mod run;
pub mod validate;

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use drift_engine::Model;
use drift_grid::RectGrid;
use drift_ibm::IbmRegistry;
use drift_output::{NullSink, OutputSink, RaggedWriter};
use tracing::Span;

use crate::run_file::LoadedRun;

/// Build a model from a run file: open the grid, build the behavior
/// module and the output sink, then set up the run.
///
/// With `write_output` false nothing is written.
pub(crate) fn build_model(run: &LoadedRun, write_output: bool, span: &Span) -> Result<Model> {
    let config = run.model_config()?;
    if let (Some(out), Some(warm)) = (run.output_path(), &config.warm_start) {
        if write_output && same_file(&out, &warm.source) {
            bail!(
                "output {} would overwrite the warm-start source",
                out.display()
            );
        }
    }

    let grid_path = run.grid_path();
    let grid = RectGrid::open(&grid_path)
        .with_context(|| format!("cannot load grid {}", grid_path.display()))?;

    let ibm = run.ibm_config();
    let hook = IbmRegistry::with_defaults()
        .build(&ibm)
        .with_context(|| format!("cannot build behavior module '{}'", ibm.name))?;

    let sink: Box<dyn OutputSink> = match run.output_path().filter(|_| write_output) {
        Some(path) => {
            let mut instance = config.instance_variables.clone();
            for name in hook.instance_variables() {
                if !instance.contains(&name) {
                    instance.push(name);
                }
            }
            Box::new(
                RaggedWriter::create(
                    &path,
                    &instance,
                    &config.particle_variables,
                    run.file.output.lonlat,
                    tracing::info_span!(parent: span, "output"),
                )
                .with_context(|| format!("cannot create output {}", path.display()))?,
            )
        }
        None => Box::new(NullSink),
    };

    let model = Model::new(config, Arc::new(grid), hook, sink, span.clone())?;
    Ok(model)
}

/// Whether `a` and `b` name the same file. Paths that cannot be
/// canonicalized are compared without their `.` components.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => lexical(a) == lexical(b),
    }
}

fn lexical(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_output::RaggedReader;
    use drift_test_utils::fixtures::{write_text, write_uniform_forcing, UniformFrame};
    use drift_test_utils::ts;
    use std::path::Path;

    /// A 20 x 20 grid, two days of 0.1 m/s eastward forcing and a
    /// release of three particles, all next to `run.json`.
    fn inputs(dir: &Path, extra: &str) -> LoadedRun {
        RectGrid::builder(20, 20)
            .build()
            .unwrap()
            .save(dir.join("grid.drgr"))
            .unwrap();
        let frames: Vec<_> = ["2015-04-01", "2015-04-02", "2015-04-03"]
            .iter()
            .map(|t| UniformFrame::new(ts(t), 0.1, 0.0))
            .collect();
        write_uniform_forcing(&dir.join("ocean.drfc"), (20, 20, 1), &frames);
        write_text(dir, "drift.rls", "3 2015-04-01T06 5 5 10\n");
        let path = write_text(
            dir,
            "run.json",
            &format!(
                r#"{{ "start": "2015-04-01", "stop": "2015-04-02", "dt": 3600,
                      "output_period": 21600, "grid": "grid.drgr",
                      "forcing": ["ocean.drfc"], "release": {{ "file": "drift.rls" }},
                      "ibm": {{ "name": "age" }} {extra} }}"#
            ),
        );
        LoadedRun::load(&path).unwrap()
    }

    #[test]
    fn run_file_drives_a_whole_run() {
        let dir = tempfile::tempdir().unwrap();
        let run = inputs(dir.path(), r#", "output": { "file": "drift.out", "lonlat": true }"#);
        let mut model = build_model(&run, true, &Span::none()).unwrap();
        let summary = model.run().unwrap();
        assert_eq!(summary.released, 3);
        assert_eq!(summary.frames, 5);

        let out = RaggedReader::open_path(dir.path().join("drift.out")).unwrap();
        assert!(out.has_lonlat());
        assert_eq!(out.instance_names(), &["age".to_string()]);
        let last = out.last_frame().unwrap();
        assert_eq!(last.pid.len(), 3);
        // Released at 06:00 and aged every step until the end of the day.
        assert_eq!(last.instance["age"], vec![18.0 * 3600.0; 3]);
    }

    #[test]
    fn validation_builds_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let run = inputs(dir.path(), r#", "output": { "file": "drift.out" }"#);
        let model = build_model(&run, false, &Span::none()).unwrap();
        assert_eq!(model.scheduler().unwrap().total_particle_count(), 3);
        assert!(!dir.path().join("drift.out").exists());
    }

    #[test]
    fn output_may_not_replace_the_warm_start_source() {
        let dir = tempfile::tempdir().unwrap();
        let run = inputs(
            dir.path(),
            r#", "output": { "file": "prev.out" }, "warm_start": { "file": "prev.out" }"#,
        );
        let err = build_model(&run, true, &Span::none()).unwrap_err();
        assert!(err.to_string().contains("warm-start"));

        let run = inputs(
            dir.path(),
            r#", "output": { "file": "./prev.out" }, "warm_start": { "file": "prev.out" }"#,
        );
        let err = build_model(&run, true, &Span::none()).unwrap_err();
        assert!(err.to_string().contains("warm-start"));
    }

    #[test]
    fn same_file_sees_through_spelling() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_text(dir.path(), "prev.out", "");
        let dotted = dir.path().join(".").join("prev.out");
        assert!(same_file(&file, &dotted));
        assert!(same_file(Path::new("./a/b.out"), Path::new("a/./b.out")));
        assert!(!same_file(&file, &dir.path().join("next.out")));
    }
}
