//! Reading particle output back, for analysis and warm starts.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDateTime;
use drift_core::clock::from_epoch_seconds;
use drift_core::codec::{
    read_exact_or_eof, read_f64_vec, read_i64_le, read_preamble, read_str, read_u32_le,
    read_u64_le, read_u8,
};
use drift_core::{DataError, Pid};
use drift_state::WarmStart;
use indexmap::IndexMap;

use crate::error::OutputError;
use crate::{FORMAT_VERSION, FRAME_TAG, MAGIC, TRAILER_TAG};

/// One output time.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputFrame {
    /// Model time of the snapshot.
    pub time: NaiveDateTime,
    /// Pids of the particles alive at that time.
    pub pid: Vec<Pid>,
    /// X positions.
    pub x: Vec<f64>,
    /// Y positions.
    pub y: Vec<f64>,
    /// Depths.
    pub z: Vec<f64>,
    /// Longitude and latitude, when the file records them.
    pub lonlat: Option<(Vec<f64>, Vec<f64>)>,
    /// Instance variables by name.
    pub instance: IndexMap<String, Vec<f64>>,
}

impl OutputFrame {
    /// Number of particles in the frame.
    pub fn len(&self) -> usize {
        self.pid.len()
    }

    /// Whether the frame holds no particles.
    pub fn is_empty(&self) -> bool {
        self.pid.is_empty()
    }
}

/// A fully decoded output file.
#[derive(Clone, Debug)]
pub struct RaggedReader {
    instance_names: Vec<String>,
    particle_names: Vec<String>,
    with_lonlat: bool,
    frames: Vec<OutputFrame>,
    next_pid: Option<Pid>,
    particle: IndexMap<String, Vec<f64>>,
}

impl RaggedReader {
    /// Decode the output file at `path`.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DataError::from(e).at(path))?;
        Self::open(BufReader::new(file))
    }

    /// Decode an output stream.
    ///
    /// A stream without a trailer (an interrupted run) is accepted; its
    /// particle variables are then empty.
    pub fn open<R: Read>(mut reader: R) -> Result<Self, OutputError> {
        let r: &mut dyn Read = &mut reader;
        read_preamble(r, MAGIC, FORMAT_VERSION)?;
        let with_lonlat = read_u8(r)? != 0;
        let instance_names = read_names(r)?;
        let particle_names = read_names(r)?;

        let mut frames = Vec::new();
        let mut next_pid = None;
        let mut particle = IndexMap::new();
        let mut tag = [0u8];
        while read_exact_or_eof(r, &mut tag)? {
            if next_pid.is_some() {
                return Err(DataError::malformed("data after the output trailer").into());
            }
            match tag[0] {
                FRAME_TAG => frames.push(read_frame(r, with_lonlat, &instance_names)?),
                TRAILER_TAG => {
                    let released = read_u64_le(r)?;
                    let count = usize::try_from(released).map_err(|_| {
                        DataError::malformed(format!("trailer count {released} is too large"))
                    })?;
                    for name in &particle_names {
                        particle.insert(name.clone(), read_f64_vec(r, count)?);
                    }
                    next_pid = Some(Pid(released));
                }
                other => {
                    return Err(DataError::malformed(format!("unknown record tag {other}")).into())
                }
            }
        }
        Ok(Self {
            instance_names,
            particle_names,
            with_lonlat,
            frames,
            next_pid,
            particle,
        })
    }

    /// Names of the recorded instance variables.
    pub fn instance_names(&self) -> &[String] {
        &self.instance_names
    }

    /// Names of the recorded particle variables.
    pub fn particle_names(&self) -> &[String] {
        &self.particle_names
    }

    /// Whether frames carry longitude and latitude.
    pub fn has_lonlat(&self) -> bool {
        self.with_lonlat
    }

    /// Every frame in time order.
    pub fn frames(&self) -> &[OutputFrame] {
        &self.frames
    }

    /// The last frame, if any.
    pub fn last_frame(&self) -> Option<&OutputFrame> {
        self.frames.last()
    }

    /// Particle variable `name`, indexed by pid. `None` before the
    /// trailer or for unknown names.
    pub fn particle(&self, name: &str) -> Option<&[f64]> {
        self.particle.get(name).map(Vec::as_slice)
    }

    /// First pid not used by the run, from the trailer.
    pub fn next_pid(&self) -> Option<Pid> {
        self.next_pid
    }

    /// Build a warm start from the last frame.
    ///
    /// Instance variables listed in `names` are carried over along with
    /// every particle variable. Without a trailer the pid sequence
    /// resumes after the largest pid seen in any frame.
    pub fn last_frame_warm_start(&self, names: &[String]) -> Result<WarmStart, OutputError> {
        let last = self.last_frame().ok_or(OutputError::NoFrames)?;
        let next_pid = self.next_pid.unwrap_or_else(|| {
            self.frames
                .iter()
                .filter_map(|f| f.pid.last())
                .max()
                .map_or(Pid(0), |p| p.next())
        });
        let instance = last
            .instance
            .iter()
            .filter(|(name, _)| names.contains(*name))
            .map(|(name, values)| (name.clone(), values.clone()))
            .collect();
        Ok(WarmStart {
            time: last.time,
            pid: last.pid.clone(),
            x: last.x.clone(),
            y: last.y.clone(),
            z: last.z.clone(),
            instance,
            particle: self.particle.clone(),
            next_pid,
        })
    }
}

fn read_names(r: &mut dyn Read) -> Result<Vec<String>, DataError> {
    let n = read_u32_le(r)? as usize;
    (0..n).map(|_| read_str(r)).collect()
}

fn read_frame(
    r: &mut dyn Read,
    with_lonlat: bool,
    instance_names: &[String],
) -> Result<OutputFrame, DataError> {
    let seconds = read_i64_le(r)?;
    let time = from_epoch_seconds(seconds)
        .ok_or_else(|| DataError::malformed(format!("frame time {seconds} is out of range")))?;
    let n = read_u32_le(r)? as usize;
    let pid = (0..n)
        .map(|_| read_u64_le(r).map(Pid))
        .collect::<Result<Vec<_>, _>>()?;
    let x = read_f64_vec(r, n)?;
    let y = read_f64_vec(r, n)?;
    let z = read_f64_vec(r, n)?;
    let lonlat = if with_lonlat {
        Some((read_f64_vec(r, n)?, read_f64_vec(r, n)?))
    } else {
        None
    };
    let mut instance = IndexMap::with_capacity(instance_names.len());
    for name in instance_names {
        instance.insert(name.clone(), read_f64_vec(r, n)?);
    }
    Ok(OutputFrame {
        time,
        pid,
        x,
        y,
        z,
        lonlat,
        instance,
    })
}
