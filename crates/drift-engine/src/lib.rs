//! The Drift simulation engine.
//!
//! [`Model`] wires the forcing provider, the release scheduler, the
//! particle ensemble, the tracker, a behavior hook and an output sink
//! into one synchronous step loop. Each [`step()`](Model::step) runs,
//! for model step `t`:
//!
//! 1. forcing update to `t`,
//! 2. release of the batch due at `t`,
//! 3. output, if `t` is on the output cadence,
//! 4. for `t < nsteps`, the ensemble update (advection, behavior hook,
//!    depth corrections, compaction).
//!
//! Particles released at `t` are therefore advected by the velocity
//! valid at `t` within the same step.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod model;

pub use config::{ModelConfig, WarmStartConfig};
pub use error::EngineError;
pub use metrics::{RunSummary, StepMetrics};
pub use model::Model;
