//! Core types and traits for the swirl spectral solver.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! vocabulary shared by every other crate in the workspace: per-axis
//! vectors, transported quantity ids, the error taxonomy, fallible buffer
//! allocation, and the collaborator traits through which the solver talks
//! to its process group, its parameter source, and its array store.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod alloc;
pub mod axis;
pub mod error;
pub mod quantity;
pub mod traits;

pub use alloc::zeroed;
pub use axis::{AxisVec, Representation, MAX_AXES, MIN_AXES};
pub use error::{
    AllocationError, CommError, ConfigError, Stage, StepError, StepFailure, StoreError,
    TransformError,
};
pub use quantity::Quantity;
pub use traits::{
    ArrayStore, ArrayView, ArrayViewMut, AxisExtent, Communicator, ParamSource, ReduceOp,
};

/// Double-precision complex number used for every spectral buffer.
pub use num_complex::Complex64;
