//! Grid backends for the Drift particle-tracking engine.
//!
//! [`RectGrid`] is a rectilinear Arakawa C-grid with sigma layers, a
//! land mask, per-cell metrics and a regular geographic reference. It
//! implements the [`Grid`](drift_core::Grid) capability trait consumed
//! by the forcing provider, the tracker and the particle ensemble.
//!
//! # File format
//!
//! ```text
//! [MAGIC "DRGR"] [VERSION u8] [imax u32] [jmax u32] [layers u32]
//! [sigma f64 x layers] [lon0 lat0 dlon dlat f64] [i0 i1 j0 j1 u32]
//! [depth f64 x N] [sea u8 x N] [dx f64 x N] [dy f64 x N]
//! ```
//!
//! with `N = imax * jmax` in row-major (`j` outer) order.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod interp;
pub mod rect;

pub use error::GridError;
pub use rect::{Georeference, RectGrid, RectGridBuilder, Subgrid};

/// Magic bytes at the start of every grid file.
pub const MAGIC: [u8; 4] = *b"DRGR";

/// Current binary grid format version.
pub const FORMAT_VERSION: u8 = 1;
