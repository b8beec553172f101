//! Forcing file reader and writer.
//!
//! A forcing file holds a fixed-shape header followed by equally sized
//! frames, so any frame can be reached with a single seek:
//!
//! ```text
//! "DRFC" | version: u8 | imax: u32 | jmax: u32 | layers: u32
//! nscalars: u32 | nscalars x (len: u32, utf-8 bytes)
//! frame*: time: i64 | U: f32[layers*jmax*(imax-1)]
//!                   | V: f32[layers*(jmax-1)*imax]
//!                   | scalar: f32[layers*jmax*imax] (per scalar, header order)
//! ```
//!
//! Times are seconds since the Unix epoch, UTC.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use chrono::NaiveDateTime;
use drift_core::clock::{epoch_seconds, from_epoch_seconds};
use drift_core::codec::{
    read_f32_vec, read_i64_le, read_preamble, read_str, read_u32_le, write_f32_slice,
    write_i64_le, write_len, write_preamble, write_str,
};
use drift_core::DataError;
use indexmap::IndexMap;

use crate::{FORMAT_VERSION, MAGIC};

// ── Layout ──────────────────────────────────────────────────────

/// Array shape and scalar inventory shared by every frame of a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForcingLayout {
    /// Number of rho points along X.
    pub imax: usize,
    /// Number of rho points along Y.
    pub jmax: usize,
    /// Number of vertical layers.
    pub layers: usize,
    /// Names of the scalar fields stored in each frame.
    pub scalars: Vec<String>,
}

impl ForcingLayout {
    /// Length of the U array (`layers * jmax * (imax - 1)`).
    pub fn u_len(&self) -> usize {
        self.layers * self.jmax * self.imax.saturating_sub(1)
    }

    /// Length of the V array (`layers * (jmax - 1) * imax`).
    pub fn v_len(&self) -> usize {
        self.layers * self.jmax.saturating_sub(1) * self.imax
    }

    /// Length of each scalar array (`layers * jmax * imax`).
    pub fn scalar_len(&self) -> usize {
        self.layers * self.jmax * self.imax
    }

    /// Encoded size of one frame in bytes.
    pub fn frame_bytes(&self) -> u64 {
        let values = self.u_len() + self.v_len() + self.scalars.len() * self.scalar_len();
        8 + 4 * values as u64
    }

    fn header_bytes(&self) -> u64 {
        let names: usize = self.scalars.iter().map(|s| 4 + s.len()).sum();
        (4 + 1 + 3 * 4 + 4 + names) as u64
    }

    fn check(&self) -> Result<(), DataError> {
        if self.imax < 2 || self.jmax < 2 || self.layers == 0 {
            return Err(DataError::malformed(format!(
                "forcing shape {}x{}x{} is too small",
                self.imax, self.jmax, self.layers
            )));
        }
        Ok(())
    }
}

/// One decoded forcing frame.
///
/// Values are widened to `f64` on read. Scalars are keyed by name in
/// the order the file declares them.
#[derive(Clone, Debug, PartialEq)]
pub struct ForcingFrame {
    /// Frame time (UTC).
    pub time: NaiveDateTime,
    /// Eastward velocity on u-points, `[layer][j][i]`.
    pub u: Vec<f64>,
    /// Northward velocity on v-points, `[layer][j][i]`.
    pub v: Vec<f64>,
    /// Scalar fields on rho points, `[layer][j][i]`.
    pub scalars: IndexMap<String, Vec<f64>>,
}

// ── Reader ──────────────────────────────────────────────────────

/// Random-access reader over one forcing file.
///
/// Frame times are scanned once on open; frame payloads are read on
/// demand.
pub struct ForcingFile<R: Read + Seek> {
    reader: R,
    layout: ForcingLayout,
    header_bytes: u64,
    times: Vec<NaiveDateTime>,
}

impl ForcingFile<BufReader<File>> {
    /// Open a forcing file on disk.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DataError::from(e).at(path))?;
        Self::open(BufReader::new(file)).map_err(|e| e.at(path))
    }
}

impl<R: Read + Seek> ForcingFile<R> {
    /// Read the header and scan every frame time.
    pub fn open(mut reader: R) -> Result<Self, DataError> {
        read_preamble(&mut reader, MAGIC, FORMAT_VERSION)?;
        let imax = read_u32_le(&mut reader)? as usize;
        let jmax = read_u32_le(&mut reader)? as usize;
        let layers = read_u32_le(&mut reader)? as usize;
        let nscalars = read_u32_le(&mut reader)? as usize;
        let scalars = (0..nscalars)
            .map(|_| read_str(&mut reader))
            .collect::<Result<Vec<_>, _>>()?;
        let layout = ForcingLayout {
            imax,
            jmax,
            layers,
            scalars,
        };
        layout.check()?;

        let header_bytes = layout.header_bytes();
        let total = reader.seek(SeekFrom::End(0))?;
        let payload = total.saturating_sub(header_bytes);
        let frame_bytes = layout.frame_bytes();
        if payload % frame_bytes != 0 {
            return Err(DataError::malformed(format!(
                "forcing payload of {payload} bytes is not a whole number of {frame_bytes}-byte frames"
            )));
        }

        let count = payload / frame_bytes;
        let mut times = Vec::with_capacity(count as usize);
        for k in 0..count {
            reader.seek(SeekFrom::Start(header_bytes + k * frame_bytes))?;
            let secs = read_i64_le(&mut reader)?;
            let time = from_epoch_seconds(secs)
                .ok_or_else(|| DataError::malformed(format!("frame {k} time {secs} out of range")))?;
            times.push(time);
        }

        Ok(Self {
            reader,
            layout,
            header_bytes,
            times,
        })
    }

    /// Shape and scalar names of the file.
    pub fn layout(&self) -> &ForcingLayout {
        &self.layout
    }

    /// Times of every frame, in file order.
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// Number of frames in the file.
    pub fn frame_count(&self) -> usize {
        self.times.len()
    }

    /// Decode frame `k`.
    pub fn read_frame(&mut self, k: usize) -> Result<ForcingFrame, DataError> {
        let time = *self.times.get(k).ok_or_else(|| {
            DataError::malformed(format!(
                "frame {k} requested from a file with {} frames",
                self.times.len()
            ))
        })?;
        let offset = self.header_bytes + k as u64 * self.layout.frame_bytes() + 8;
        self.reader.seek(SeekFrom::Start(offset))?;

        let widen = |v: Vec<f32>| v.into_iter().map(f64::from).collect::<Vec<_>>();
        let u = widen(read_f32_vec(&mut self.reader, self.layout.u_len())?);
        let v = widen(read_f32_vec(&mut self.reader, self.layout.v_len())?);
        let mut scalars = IndexMap::with_capacity(self.layout.scalars.len());
        for name in &self.layout.scalars {
            let values = widen(read_f32_vec(&mut self.reader, self.layout.scalar_len())?);
            scalars.insert(name.clone(), values);
        }
        Ok(ForcingFrame {
            time,
            u,
            v,
            scalars,
        })
    }
}

// ── Writer ──────────────────────────────────────────────────────

/// Writes forcing files frame by frame.
pub struct ForcingFileWriter<W: Write> {
    writer: W,
    layout: ForcingLayout,
    last_time: Option<NaiveDateTime>,
    frames_written: usize,
}

impl<W: Write> ForcingFileWriter<W> {
    /// Write the header for `layout` and return a writer for its frames.
    pub fn new(mut writer: W, layout: ForcingLayout) -> Result<Self, DataError> {
        layout.check()?;
        write_preamble(&mut writer, MAGIC, FORMAT_VERSION)?;
        write_len(&mut writer, layout.imax)?;
        write_len(&mut writer, layout.jmax)?;
        write_len(&mut writer, layout.layers)?;
        write_len(&mut writer, layout.scalars.len())?;
        for name in &layout.scalars {
            write_str(&mut writer, name)?;
        }
        Ok(Self {
            writer,
            layout,
            last_time: None,
            frames_written: 0,
        })
    }

    /// Append one frame.
    ///
    /// Frame times must increase strictly, array lengths must match the
    /// layout and every declared scalar must be present.
    pub fn write_frame(&mut self, frame: &ForcingFrame) -> Result<(), DataError> {
        if let Some(last) = self.last_time {
            if frame.time <= last {
                return Err(DataError::malformed(format!(
                    "frame time {} does not follow {last}",
                    frame.time
                )));
            }
        }
        let expect = |what: &str, found: usize, expected: usize| {
            if found == expected {
                Ok(())
            } else {
                Err(DataError::malformed(format!(
                    "{what} has {found} values, layout needs {expected}"
                )))
            }
        };
        expect("U", frame.u.len(), self.layout.u_len())?;
        expect("V", frame.v.len(), self.layout.v_len())?;

        write_i64_le(&mut self.writer, epoch_seconds(frame.time))?;
        let narrow = |v: &[f64]| v.iter().map(|&x| x as f32).collect::<Vec<_>>();
        write_f32_slice(&mut self.writer, &narrow(&frame.u))?;
        write_f32_slice(&mut self.writer, &narrow(&frame.v))?;
        for name in &self.layout.scalars {
            let values = frame
                .scalars
                .get(name)
                .ok_or_else(|| DataError::malformed(format!("frame lacks scalar '{name}'")))?;
            expect(name, values.len(), self.layout.scalar_len())?;
            write_f32_slice(&mut self.writer, &narrow(values))?;
        }

        self.last_time = Some(frame.time);
        self.frames_written += 1;
        Ok(())
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> Result<W, DataError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
