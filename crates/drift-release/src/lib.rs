//! Particle release for the Drift particle-tracking engine.
//!
//! A release table ([`ReleaseTable`]) is a whitespace-delimited text
//! file with one release record per line, its columns named by the run
//! configuration. The [`ReleaseScheduler`] turns the table into one
//! [`ParticleBatch`](drift_core::ParticleBatch) per model step that has
//! releases, in either discrete mode (every record fires once) or
//! continuous mode (the table is resampled at a fixed frequency).
//! Pids are assigned once, at construction, in release order.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod scheduler;
pub mod table;

pub use error::ReleaseError;
pub use scheduler::{ReleaseConfig, ReleaseMode, ReleaseScheduler};
pub use table::{ReleaseRecord, ReleaseTable};
