//! Binary encode/decode of [`RectGrid`] files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use drift_core::codec::{
    read_f64_le, read_f64_vec, read_preamble, read_u32_le, write_f64_le, write_f64_slice,
    write_len, write_preamble,
};
use drift_core::DataError;

use crate::error::GridError;
use crate::rect::{Georeference, RectGrid, Subgrid};
use crate::{FORMAT_VERSION, MAGIC};

impl RectGrid {
    /// Encode the grid to a byte stream.
    pub fn write_to(&self, w: &mut dyn Write) -> Result<(), GridError> {
        write_preamble(w, MAGIC, FORMAT_VERSION)?;
        write_len(w, self.imax)?;
        write_len(w, self.jmax)?;
        write_len(w, self.sigma.len())?;
        write_f64_slice(w, &self.sigma)?;

        let g = &self.georef;
        for v in [g.lon0, g.lat0, g.dlon, g.dlat] {
            write_f64_le(w, v)?;
        }
        let s = &self.subgrid;
        for v in [s.i0, s.i1, s.j0, s.j1] {
            write_len(w, v)?;
        }

        write_f64_slice(w, &self.depth)?;
        let sea: Vec<u8> = self.sea.iter().map(|&s| u8::from(s)).collect();
        w.write_all(&sea).map_err(DataError::from)?;
        write_f64_slice(w, &self.dx)?;
        write_f64_slice(w, &self.dy)?;
        Ok(())
    }

    /// Decode a grid from a byte stream, validating it like the builder.
    pub fn read_from(r: &mut dyn Read) -> Result<Self, GridError> {
        read_preamble(r, MAGIC, FORMAT_VERSION)?;
        let imax = read_u32_le(r)? as usize;
        let jmax = read_u32_le(r)? as usize;
        let layers = read_u32_le(r)? as usize;
        let sigma = read_f64_vec(r, layers)?;
        let georef = Georeference {
            lon0: read_f64_le(r)?,
            lat0: read_f64_le(r)?,
            dlon: read_f64_le(r)?,
            dlat: read_f64_le(r)?,
        };
        let subgrid = Subgrid {
            i0: read_u32_le(r)? as usize,
            i1: read_u32_le(r)? as usize,
            j0: read_u32_le(r)? as usize,
            j1: read_u32_le(r)? as usize,
        };

        let n = imax
            .checked_mul(jmax)
            .ok_or_else(|| DataError::malformed(format!("grid shape {imax}x{jmax} overflows")))?;
        let depth = read_f64_vec(r, n)?;
        let mut sea = vec![0u8; n];
        r.read_exact(&mut sea).map_err(DataError::from)?;
        let dx = read_f64_vec(r, n)?;
        let dy = read_f64_vec(r, n)?;

        RectGrid::builder(imax, jmax)
            .depth(depth)
            .sea_mask(sea.into_iter().map(|s| s != 0).collect())
            .metrics(dx, dy)
            .sigma_layers(sigma)
            .georeference(georef)
            .subgrid(subgrid)
            .build()
    }

    /// Read a grid file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GridError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DataError::from(e).at(path))?;
        Self::read_from(&mut BufReader::new(file)).map_err(|e| match e {
            GridError::Data(d) => GridError::Data(d.at(path)),
            other => other,
        })
    }

    /// Write the grid to a file on disk, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GridError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| DataError::from(e).at(path))?;
        let mut w = BufWriter::new(file);
        self.write_to(&mut w)?;
        w.flush().map_err(|e| DataError::from(e).at(path))?;
        Ok(())
    }
}
