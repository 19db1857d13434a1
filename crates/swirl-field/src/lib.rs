//! Field storage for swirl simulations.
//!
//! Each transported quantity owns a [`Field`]: a double-buffered spectral
//! state (committed and staged), one slope buffer per Runge–Kutta stage, a
//! physical-space buffer, and its diffusivity. A [`FieldStore`] keeps the
//! fields of a run in quantity order together with the shared two-thirds
//! [`DealiasMask`].
//!
//! # Step lifecycle
//!
//! ```text
//! begin_step()  committed ──copy──> staged      (step open)
//!   stages      staged rewritten from committed + slopes
//! promote()     swap(committed, staged)         (step closed)
//! ```
//!
//! After `promote()` the old committed buffer sits in the staged slot and
//! is never readable until the next `begin_step()` overwrites it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod mask;
pub mod store;
pub mod workspace;

pub use error::FieldError;
pub use field::{Field, StageParts};
pub use mask::DealiasMask;
pub use store::FieldStore;
pub use workspace::Workspace;
