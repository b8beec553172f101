//! Particle output for the Drift particle-tracking engine.
//!
//! Snapshots of the ensemble are written as a ragged array: each
//! output time is one record holding only the particles alive at that
//! time, keyed by pid. Particle variables, fixed at release, are
//! written once in a trailer indexed by pid. The same file is the
//! source of a warm start.
//!
//! # File layout (`DRPO`, little-endian)
//!
//! ```text
//! magic "DRPO", version u8, with_lonlat u8
//! instance names: u32 count, then length-prefixed strings
//! particle names: u32 count, then length-prefixed strings
//! frame*:  tag 1, time i64 (epoch s), count u32, pid u64[count],
//!          X f64[count], Y, Z, [lon, lat], each instance variable
//! trailer: tag 2, next_pid u64, each particle variable f64[next_pid]
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod reader;
pub mod sink;
pub mod writer;

pub use error::OutputError;
pub use reader::{OutputFrame, RaggedReader};
pub use sink::{NullSink, OutputSink};
pub use writer::RaggedWriter;

/// Magic bytes of a particle output file.
pub const MAGIC: [u8; 4] = *b"DRPO";

/// Current output format version.
pub const FORMAT_VERSION: u8 = 1;

pub(crate) const FRAME_TAG: u8 = 1;
pub(crate) const TRAILER_TAG: u8 = 2;
