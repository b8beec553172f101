//! Ragged-array output writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use drift_core::clock::epoch_seconds;
use drift_core::codec::{
    write_f64_slice, write_i64_le, write_len, write_preamble, write_str, write_u64_le, write_u8,
};
use drift_core::{DataError, Grid};
use drift_state::State;
use tracing::{debug, info, Span};

use crate::error::OutputError;
use crate::sink::OutputSink;
use crate::{FORMAT_VERSION, FRAME_TAG, MAGIC, TRAILER_TAG};

/// Streams ensemble snapshots to a byte sink.
///
/// The header is written on construction, one frame per
/// [`write_frame`](RaggedWriter::write_frame) and the particle-variable
/// trailer on [`finish`](RaggedWriter::finish), after which the writer
/// rejects further frames.
pub struct RaggedWriter<W: Write> {
    writer: W,
    instance: Vec<String>,
    particle: Vec<String>,
    with_lonlat: bool,
    frames_written: u64,
    finished: bool,
    span: Span,
}

impl RaggedWriter<BufWriter<File>> {
    /// Create (or truncate) the output file at `path`.
    pub fn create(
        path: impl AsRef<Path>,
        instance: &[String],
        particle: &[String],
        with_lonlat: bool,
        span: Span,
    ) -> Result<Self, OutputError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| DataError::from(e).at(path))?;
        Self::new(BufWriter::new(file), instance, particle, with_lonlat, span)
    }
}

impl<W: Write> RaggedWriter<W> {
    /// Start an output stream recording the named instance and particle
    /// variables.
    pub fn new(
        mut writer: W,
        instance: &[String],
        particle: &[String],
        with_lonlat: bool,
        span: Span,
    ) -> Result<Self, OutputError> {
        write_preamble(&mut writer, MAGIC, FORMAT_VERSION)?;
        write_u8(&mut writer, u8::from(with_lonlat))?;
        for names in [instance, particle] {
            write_len(&mut writer, names.len())?;
            for name in names {
                write_str(&mut writer, name)?;
            }
        }
        Ok(Self {
            writer,
            instance: instance.to_vec(),
            particle: particle.to_vec(),
            with_lonlat,
            frames_written: 0,
            finished: false,
            span,
        })
    }

    /// Append one time frame holding every particle of `state`.
    pub fn write_frame(&mut self, state: &State, grid: &dyn Grid) -> Result<(), OutputError> {
        if self.finished {
            return Err(OutputError::Closed);
        }
        let columns = self
            .instance
            .iter()
            .map(|name| {
                state
                    .instance(name)
                    .ok_or_else(|| OutputError::MissingVariable { name: name.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let w = &mut self.writer;
        write_u8(w, FRAME_TAG)?;
        write_i64_le(w, epoch_seconds(state.time()))?;
        write_len(w, state.len())?;
        for pid in state.pid() {
            write_u64_le(w, pid.0)?;
        }
        write_f64_slice(w, state.x())?;
        write_f64_slice(w, state.y())?;
        write_f64_slice(w, state.z())?;
        if self.with_lonlat {
            let (lon, lat): (Vec<f64>, Vec<f64>) = state
                .x()
                .iter()
                .zip(state.y())
                .map(|(&x, &y)| grid.lonlat(x, y))
                .unzip();
            write_f64_slice(w, &lon)?;
            write_f64_slice(w, &lat)?;
        }
        for column in columns {
            write_f64_slice(w, column)?;
        }
        self.frames_written += 1;
        debug!(
            parent: &self.span,
            time = %state.time(),
            particles = state.len(),
            frame = self.frames_written,
            "output frame written"
        );
        Ok(())
    }

    /// Write the particle-variable trailer and flush.
    pub fn finish(&mut self, state: &State) -> Result<(), OutputError> {
        if self.finished {
            return Err(OutputError::Closed);
        }
        let released = state.next_pid();
        let w = &mut self.writer;
        write_u8(w, TRAILER_TAG)?;
        write_u64_le(w, released.0)?;
        for name in &self.particle {
            let column = state
                .particle(name)
                .ok_or_else(|| OutputError::MissingVariable { name: name.clone() })?;
            write_f64_slice(w, column)?;
        }
        self.writer.flush().map_err(DataError::from)?;
        self.finished = true;
        info!(
            parent: &self.span,
            frames = self.frames_written,
            released = released.0,
            "output finished"
        );
        Ok(())
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for RaggedWriter<W> {
    fn write(&mut self, state: &State, grid: &dyn Grid) -> Result<(), OutputError> {
        self.write_frame(state, grid)
    }

    fn finish(&mut self, state: &State) -> Result<(), OutputError> {
        RaggedWriter::finish(self, state)
    }
}
