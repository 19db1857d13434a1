//! Distributed spectral transforms for swirl.
//!
//! [`SpectralTransform`] converts a real field held in the physical
//! pencil to complex Fourier coefficients held in the spectral pencil and
//! back. Each direction is a chain of local 1-D FFTs, one per axis, with a
//! pencil-to-pencil [`TransposePlan`] between consecutive axes:
//!
//! ```text
//! forward:  physical (pencil n-1) --r2c axis n-1--> transpose --c2c axis n-2--> ... --c2c axis 0--> spectral (pencil 0)
//! backward: spectral (pencil 0) --c2c axis 0--> transpose --> ... --c2r axis n-1--> physical (pencil n-1)
//! ```
//!
//! The forward transform is normalized by `1 / ∏N`; the backward
//! transform is not. FFT and transpose plans are built on first use and
//! kept for the life of the transform.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod plan;
pub mod transform;
pub mod transpose;

pub use plan::TransformPlan;
pub use transform::SpectralTransform;
pub use transpose::TransposePlan;
