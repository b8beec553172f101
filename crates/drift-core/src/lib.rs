//! Core types and traits for the Drift particle-tracking engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the abstractions shared by the rest of the workspace: particle and
//! step identifiers, the model clock, the [`Grid`] and [`VelocityField`]
//! capability traits, the [`ParticleBatch`] release unit, and the
//! error types that cross crate boundaries.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod batch;
pub mod clock;
pub mod codec;
pub mod error;
pub mod extent;
pub mod field;
pub mod grid;
pub mod id;

pub use batch::ParticleBatch;
pub use clock::{parse_timestamp, Clock};
pub use error::{BatchError, ConfigError, DataError, FieldError};
pub use extent::Extent;
pub use field::VelocityField;
pub use grid::Grid;
pub use id::{Pid, StepIndex};
