//! Reference behavior modules for the Drift particle-tracking engine.
//!
//! A behavior module ("IBM") is a [`BehaviorHook`](drift_state::BehaviorHook)
//! run once per step after advection. Modules are chosen by name from
//! an [`IbmRegistry`], each entry a plain factory function taking the
//! module's [`IbmConfig`].
//!
//! | Name | Module | Instance variables | Forcing fields |
//! |------|--------|--------------------|----------------|
//! | `none` | [`NoBehavior`](drift_state::NoBehavior) | | |
//! | `age` | [`Age`] | `age` | `temp` with `degree_days` |
//! | `sinking` | [`Sinking`] | | |
//! | `lifespan` | [`Lifespan`] | `age` | |
//! | `diel` | [`Diel`] | | |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod age;
pub mod config;
pub mod diel;
pub mod lifespan;
pub mod registry;
pub mod sinking;

pub use age::Age;
pub use config::IbmConfig;
pub use diel::{solar_elevation, Diel};
pub use lifespan::Lifespan;
pub use registry::{HookFactory, IbmRegistry};
pub use sinking::Sinking;
