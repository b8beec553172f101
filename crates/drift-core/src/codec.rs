//! Little-endian binary primitives shared by the Drift file formats.
//!
//! Grid, forcing and particle output files all use the same layout
//! rules: 4 magic bytes, a version byte, then little-endian integers
//! and floats. Strings are length-prefixed with a `u32`. There is no
//! compression, alignment padding or self-describing schema.

use std::io::{self, ErrorKind, Read, Write};

use crate::error::DataError;

// ── Writers ─────────────────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), DataError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), DataError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), DataError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian i64.
pub fn write_i64_le(w: &mut dyn Write, v: i64) -> Result<(), DataError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f64.
pub fn write_f64_le(w: &mut dyn Write, v: f64) -> Result<(), DataError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a length-prefixed UTF-8 string (u32 length + bytes).
pub fn write_str(w: &mut dyn Write, s: &str) -> Result<(), DataError> {
    write_len(w, s.len())?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

/// Write a collection length as a u32.
pub fn write_len(w: &mut dyn Write, len: usize) -> Result<(), DataError> {
    let len = u32::try_from(len)
        .map_err(|_| DataError::malformed(format!("length {len} exceeds u32::MAX")))?;
    write_u32_le(w, len)
}

/// Write every value as a little-endian f32.
pub fn write_f32_slice(w: &mut dyn Write, values: &[f32]) -> Result<(), DataError> {
    let mut buf = Vec::with_capacity(values.len() * 4);
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    w.write_all(&buf)?;
    Ok(())
}

/// Write every value as a little-endian f64.
pub fn write_f64_slice(w: &mut dyn Write, values: &[f64]) -> Result<(), DataError> {
    let mut buf = Vec::with_capacity(values.len() * 8);
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    w.write_all(&buf)?;
    Ok(())
}

// ── Readers ─────────────────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, DataError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, DataError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, DataError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a little-endian i64.
pub fn read_i64_le(r: &mut dyn Read) -> Result<i64, DataError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

/// Read a little-endian f64.
pub fn read_f64_le(r: &mut dyn Read) -> Result<f64, DataError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Read `n` items of `width` bytes each.
///
/// The buffer grows with the bytes actually read, so a corrupt count
/// ends in an error at end of stream rather than a huge allocation.
pub fn read_bytes(r: &mut dyn Read, n: usize, width: usize) -> Result<Vec<u8>, DataError> {
    let len = n
        .checked_mul(width)
        .and_then(|len| u64::try_from(len).ok())
        .ok_or_else(|| DataError::malformed(format!("element count {n} is too large")))?;
    let mut buf = Vec::new();
    Read::take(&mut *r, len).read_to_end(&mut buf)?;
    if (buf.len() as u64) < len {
        return Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("expected {len} bytes, got {}", buf.len()),
        )
        .into());
    }
    Ok(buf)
}

/// Read a length-prefixed UTF-8 string.
pub fn read_str(r: &mut dyn Read) -> Result<String, DataError> {
    let len = read_u32_le(r)? as usize;
    let buf = read_bytes(r, len, 1)?;
    String::from_utf8(buf).map_err(|e| DataError::malformed(format!("invalid UTF-8 string: {e}")))
}

/// Read `n` little-endian f32 values.
pub fn read_f32_vec(r: &mut dyn Read, n: usize) -> Result<Vec<f32>, DataError> {
    let buf = read_bytes(r, n, 4)?;
    Ok(buf
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Read `n` little-endian f64 values.
pub fn read_f64_vec(r: &mut dyn Read, n: usize) -> Result<Vec<f64>, DataError> {
    let buf = read_bytes(r, n, 8)?;
    Ok(buf
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect())
}

// ── Headers ─────────────────────────────────────────────────────

/// Write magic bytes followed by a version byte.
pub fn write_preamble(w: &mut dyn Write, magic: [u8; 4], version: u8) -> Result<(), DataError> {
    w.write_all(&magic)?;
    write_u8(w, version)
}

/// Read and check magic bytes and version byte.
pub fn read_preamble(r: &mut dyn Read, magic: [u8; 4], version: u8) -> Result<(), DataError> {
    let mut found = [0u8; 4];
    r.read_exact(&mut found)?;
    if found != magic {
        return Err(DataError::InvalidMagic {
            expected: magic,
            found,
        });
    }
    let found = read_u8(r)?;
    if found != version {
        return Err(DataError::UnsupportedVersion { found });
    }
    Ok(())
}

/// Fill `buf` completely, or report a clean end of stream.
///
/// Returns `Ok(false)` if the stream ended before any byte was read and
/// an error if it ended part-way through `buf`.
pub fn read_exact_or_eof(r: &mut dyn Read, buf: &mut [u8]) -> Result<bool, DataError> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(DataError::malformed(format!(
                    "truncated record: got {filled} of {} bytes",
                    buf.len()
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_rejects_wrong_magic_and_version() {
        let mut buf = Vec::new();
        write_preamble(&mut buf, *b"DRFC", 1).unwrap();
        assert!(read_preamble(&mut buf.as_slice(), *b"DRFC", 1).is_ok());
        assert!(matches!(
            read_preamble(&mut buf.as_slice(), *b"DRGR", 1),
            Err(DataError::InvalidMagic { .. })
        ));
        assert!(matches!(
            read_preamble(&mut buf.as_slice(), *b"DRFC", 2),
            Err(DataError::UnsupportedVersion { found: 1 })
        ));
    }

    #[test]
    fn clean_eof_is_distinguished_from_truncation() {
        let mut empty: &[u8] = &[];
        let mut buf = [0u8; 8];
        assert!(!read_exact_or_eof(&mut empty, &mut buf).unwrap());

        let mut short: &[u8] = &[1, 2, 3];
        assert!(read_exact_or_eof(&mut short, &mut buf).is_err());
    }

    #[test]
    fn oversized_counts_are_errors() {
        let bytes = [0u8; 16];
        assert!(matches!(
            read_f64_vec(&mut bytes.as_slice(), usize::MAX / 4),
            Err(DataError::Malformed { .. })
        ));
        assert!(matches!(
            read_f32_vec(&mut bytes.as_slice(), 1 << 40),
            Err(DataError::Io { .. })
        ));

        let mut buf = Vec::new();
        write_u32_le(&mut buf, u32::MAX).unwrap();
        buf.extend_from_slice(b"abc");
        assert!(read_str(&mut buf.as_slice()).is_err());
    }

    #[test]
    fn float_vectors_keep_their_values() {
        let mut buf = Vec::new();
        write_f32_slice(&mut buf, &[1.5, -0.25]).unwrap();
        write_str(&mut buf, "temp").unwrap();
        let mut r = buf.as_slice();
        assert_eq!(read_f32_vec(&mut r, 2).unwrap(), vec![1.5, -0.25]);
        assert_eq!(read_str(&mut r).unwrap(), "temp");
    }
}
