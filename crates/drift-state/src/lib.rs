//! The particle ensemble of the Drift particle-tracking engine.
//!
//! [`State`] owns every per-particle array in struct-of-arrays layout:
//! `pid`, `X`, `Y`, `Z`, the transient `alive` mask, configured
//! instance variables (one value per live particle) and particle
//! variables (one value per pid ever released). It appends release
//! batches, runs one step of tracker and [`BehaviorHook`], applies the
//! vertical boundary corrections and compacts out dead particles.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod hook;
pub mod state;
pub mod warm;

pub use error::{HookError, StateError};
pub use hook::{BehaviorHook, NoBehavior};
pub use state::{State, StateConfig, StepReport};
pub use warm::WarmStart;
