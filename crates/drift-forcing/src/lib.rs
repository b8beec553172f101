//! Forcing for the Drift particle-tracking engine.
//!
//! Ocean model output arrives as a sequence of binary forcing files
//! ([`codec`]), each holding time-stamped frames of staggered velocity
//! and optional scalar fields. [`FrameIndex`] merges the frames of all
//! files onto one time axis expressed in model steps, and [`Forcing`]
//! walks that axis forward, holding the fields valid at the current
//! step and sampling them for the tracker and behavior modules through
//! [`VelocityField`](drift_core::VelocityField).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod forcing;
pub mod index;

pub use codec::{ForcingFile, ForcingFileWriter, ForcingFrame, ForcingLayout};
pub use error::ForcingError;
pub use forcing::{Forcing, ForcingConfig};
pub use index::{FrameEntry, FrameIndex};

/// Magic bytes at the start of every forcing file.
pub const MAGIC: [u8; 4] = *b"DRFC";

/// Current binary forcing format version.
pub const FORMAT_VERSION: u8 = 1;
