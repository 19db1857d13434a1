//! Distributed grid decomposition for swirl.
//!
//! A periodic grid of 2 or 3 axes is split across a process group in
//! *pencils*: in pencil `p`, axis `p` is held entirely by every rank and the
//! remaining axes are block-distributed over an `(ndim - 1)`-dimensional
//! process grid. This crate computes every rank's local extents for each
//! pencil and representation, and the wavenumber tables the solver needs
//! for the spectral state.
//!
//! # Layout conventions
//!
//! - Spectral state lives in pencil 0; physical buffers live in pencil
//!   `ndim - 1`.
//! - Within pencil `p`, axis `p` varies fastest, followed by axes
//!   `p + 1, ..., ndim - 1, 0, ..., p - 1`.
//! - In the spectral representation the last axis holds `N/2 + 1` points.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod decomposition;
pub mod error;
pub mod grid;
pub mod layout;
pub mod process_grid;
pub mod waves;

pub use decomposition::Decomposition;
pub use error::DecompositionError;
pub use grid::GridSpec;
pub use layout::{block_extent, visit_box, PencilLayout};
pub use process_grid::ProcessGrid;
pub use waves::{wavenumber, ModeTable, WavenumberTable};
