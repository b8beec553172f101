//! Drift: Lagrangian particle tracking driven by gridded ocean-model
//! forcing.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Drift sub-crates. For most users, adding `drift` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use drift::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let grid = Arc::new(RectGrid::open("fjord.drgr")?);
//!
//!     let mut config = ModelConfig::new(
//!         parse_timestamp("2015-04-01").ok_or("bad start")?,
//!         parse_timestamp("2015-04-03").ok_or("bad stop")?,
//!         3600,
//!     );
//!     config.forcing_sources = vec!["ocean_2015-04.drfc".into()];
//!     config.release_file = Some("drift.rls".into());
//!     config.output_period_seconds = 3 * 3600;
//!
//!     let hook = IbmRegistry::with_defaults()
//!         .build(&IbmConfig::new("sinking").with_param("speed", 0.0005))?;
//!     let sink = RaggedWriter::create(
//!         "drift.out",
//!         &config.instance_variables,
//!         &config.particle_variables,
//!         true,
//!         tracing::Span::none(),
//!     )?;
//!
//!     let mut model = Model::new(config, grid, hook, Box::new(sink), tracing::Span::none())?;
//!     let summary = model.run()?;
//!     println!("{} particles remain", summary.remaining);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `drift-core` | Ids, clock, extents, batches, capability traits, errors |
//! | [`grid`] | `drift-grid` | The rectilinear C-grid backend and its file format |
//! | [`forcing`] | `drift-forcing` | Forcing files, the frame index and the time-windowed provider |
//! | [`tracker`] | `drift-tracker` | Integration schemes, diffusion and the tracker |
//! | [`state`] | `drift-state` | The particle ensemble, warm start and behavior hooks |
//! | [`release`] | `drift-release` | Release tables and the release scheduler |
//! | [`ibm`] | `drift-ibm` | Reference behavior modules and their registry |
//! | [`output`] | `drift-output` | Ragged-array output writer and reader |
//! | [`engine`] | `drift-engine` | Run configuration and the model step loop |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and ids (`drift-core`).
///
/// Contains the [`types::Clock`], [`types::ParticleBatch`], the error
/// enums and the capability traits [`types::Grid`] and
/// [`types::VelocityField`].
pub use drift_core as types;

/// The rectilinear grid backend (`drift-grid`).
pub use drift_grid as grid;

/// Forcing files and the forcing provider (`drift-forcing`).
///
/// [`forcing::Forcing`] holds the velocity and scalar fields valid at
/// the current model step, read lazily from a time-ordered list of
/// [`forcing::ForcingFile`]s.
pub use drift_forcing as forcing;

/// Integration schemes and the tracker (`drift-tracker`).
pub use drift_tracker as tracker;

/// The particle ensemble (`drift-state`).
///
/// The [`state::BehaviorHook`] trait is the extension point for
/// user-defined particle behavior.
pub use drift_state as state;

/// Release tables and scheduling (`drift-release`).
pub use drift_release as release;

/// Reference behavior modules (`drift-ibm`).
///
/// Includes [`ibm::Age`], [`ibm::Sinking`], [`ibm::Lifespan`] and
/// [`ibm::Diel`], built by name through an [`ibm::IbmRegistry`].
pub use drift_ibm as ibm;

/// Ragged-array output (`drift-output`).
pub use drift_output as output;

/// Run configuration and the step loop (`drift-engine`).
pub use drift_engine as engine;

/// Common imports for typical Drift usage.
///
/// ```rust
/// use drift::prelude::*;
/// ```
///
/// This imports the types needed to configure and run a model: the
/// configuration, the grid, behavior modules, output sinks and the
/// capability traits.
pub mod prelude {
    // Core types and traits
    pub use drift_core::{
        parse_timestamp, Clock, Extent, Grid, ParticleBatch, Pid, VelocityField,
    };

    // Errors
    pub use drift_core::{ConfigError, DataError, FieldError};
    pub use drift_engine::EngineError;

    // Grid and forcing
    pub use drift_forcing::{Forcing, ForcingConfig};
    pub use drift_grid::RectGrid;

    // Particles
    pub use drift_release::{ReleaseMode, ReleaseScheduler};
    pub use drift_state::{BehaviorHook, HookError, NoBehavior, State};
    pub use drift_tracker::Scheme;

    // Behavior
    pub use drift_ibm::{IbmConfig, IbmRegistry};

    // Output
    pub use drift_output::{NullSink, OutputSink, RaggedReader, RaggedWriter};

    // Engine
    pub use drift_engine::{Model, ModelConfig, RunSummary, StepMetrics, WarmStartConfig};
}
