//! Particle advection for the Drift particle-tracking engine.
//!
//! A [`Tracker`] moves every live particle through one model step. The
//! integration scheme is a closed [`Scheme`] enum chosen when the
//! tracker is built; optional horizontal [`Diffusion`] adds a random
//! velocity to the advective one. Positions are in grid coordinates
//! and velocities in m/s, converted through the grid metric sampled at
//! the start of the step.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod diffusion;
pub mod scheme;
pub mod tracker;

pub use diffusion::Diffusion;
pub use scheme::Scheme;
pub use tracker::{AdvanceReport, Particles, Tracker, TrackerConfig};
