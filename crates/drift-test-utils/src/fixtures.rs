//! On-disk input fixtures.
//!
//! - [`write_uniform_forcing`]: a forcing file of spatially uniform
//!   frames, sized for a given grid shape.
//! - [`write_text`]: a plain-text file such as a release table.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use drift_forcing::{ForcingFileWriter, ForcingFrame, ForcingLayout};
use indexmap::IndexMap;

/// One spatially uniform forcing frame.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformFrame {
    pub time: NaiveDateTime,
    pub u: f64,
    pub v: f64,
    /// Constant scalar values, stored in the file in this order.
    pub scalars: Vec<(String, f64)>,
}

impl UniformFrame {
    pub fn new(time: NaiveDateTime, u: f64, v: f64) -> Self {
        Self {
            time,
            u,
            v,
            scalars: Vec::new(),
        }
    }

    pub fn with_scalar(mut self, name: &str, value: f64) -> Self {
        self.scalars.push((name.to_string(), value));
        self
    }
}

/// Write `frames` to `path` as a forcing file for an
/// `imax x jmax x layers` grid. Scalar names come from the first frame.
pub fn write_uniform_forcing(
    path: &Path,
    (imax, jmax, layers): (usize, usize, usize),
    frames: &[UniformFrame],
) -> PathBuf {
    let layout = ForcingLayout {
        imax,
        jmax,
        layers,
        scalars: frames
            .first()
            .map(|f| f.scalars.iter().map(|(n, _)| n.clone()).collect())
            .unwrap_or_default(),
    };
    let file = File::create(path).expect("create forcing fixture");
    let mut writer = ForcingFileWriter::new(file, layout.clone()).expect("forcing header");
    for frame in frames {
        let scalars: IndexMap<String, Vec<f64>> = frame
            .scalars
            .iter()
            .map(|(name, value)| (name.clone(), vec![*value; layout.scalar_len()]))
            .collect();
        writer
            .write_frame(&ForcingFrame {
                time: frame.time,
                u: vec![frame.u; layout.u_len()],
                v: vec![frame.v; layout.v_len()],
                scalars,
            })
            .expect("forcing frame");
    }
    writer.finish().expect("flush forcing fixture");
    path.to_path_buf()
}

/// Write `contents` to `dir/name` and return the path.
pub fn write_text(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).expect("create text fixture");
    file.write_all(contents.as_bytes())
        .expect("write text fixture");
    path
}
