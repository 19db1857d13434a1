//! Swirl: a distributed pseudo-spectral solver for incompressible flow
//! carrying a passive scalar on a periodic grid.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all swirl sub-crates. For most users, adding `swirl` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use swirl::prelude::*;
//!
//! // A 16 x 16 grid on [0, 2π)², one rank.
//! let grid = GridSpec::cube(2, 16).unwrap();
//! let config = SolverConfig::new(100.0, 1.0);
//! let mut sim = Simulation::with_config(grid.clone(), config, SoloComm).unwrap();
//!
//! // Taylor–Green vortex: u = sin x cos y, v = -cos x sin y.
//! let layout = sim.decomposition().physical_layout().clone();
//! let mut u = Vec::new();
//! let mut v = Vec::new();
//! layout.for_each_point(|g| {
//!     let x = g[0] as f64 * grid.spacing(0);
//!     let y = g[1] as f64 * grid.spacing(1);
//!     u.push(x.sin() * y.cos());
//!     v.push(-x.cos() * y.sin());
//! });
//! sim.load_physical(Quantity::Velocity(0), &u).unwrap();
//! sim.load_physical(Quantity::Velocity(1), &v).unwrap();
//!
//! let report = sim.step().unwrap();
//! assert_eq!(report.step, 1);
//! let d = sim.diagnostics().unwrap();
//! assert!(d.max_divergence < 1e-12);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `swirl-core` | Errors, quantities, collaborator traits |
//! | [`domain`] | `swirl-domain` | Grid, process grid, pencil layouts, wavenumbers |
//! | [`comm`] | `swirl-comm` | Single-rank and in-process communicators |
//! | [`fft`] | `swirl-fft` | Distributed spectral transforms and transposes |
//! | [`field`] | `swirl-field` | Field buffers, dealiasing mask, scratch |
//! | [`engine`] | `swirl-engine` | Time integration, diagnostics, checkpoints, run loop |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, errors and collaborator traits (`swirl-core`).
///
/// Contains the [`types::Communicator`], [`types::ParamSource`] and
/// [`types::ArrayStore`] traits through which the solver reaches its
/// process group, configuration and storage.
pub use swirl_core as types;

/// Grid decomposition (`swirl-domain`).
///
/// [`domain::GridSpec`] describes the global grid; [`domain::Decomposition`]
/// splits it into pencils and carries the wavenumber tables.
pub use swirl_domain as domain;

/// Communicators (`swirl-comm`).
///
/// [`comm::SoloComm`] for a single rank, [`comm::ThreadGroup`] for a group
/// of ranks on threads of one process.
pub use swirl_comm as comm;

/// Distributed spectral transforms (`swirl-fft`).
pub use swirl_fft as fft;

/// Field storage (`swirl-field`).
pub use swirl_field as field;

/// Time integration and the simulation driver (`swirl-engine`).
///
/// [`engine::Simulation`] is the entry point for running a case.
pub use swirl_engine as engine;

/// Common imports for typical swirl usage.
///
/// ```rust
/// use swirl::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use swirl_core::{ArrayStore, Communicator, Complex64, ParamSource, Quantity};

    // Errors
    pub use swirl_core::{CommError, ConfigError, Stage, StepError, StoreError};
    pub use swirl_domain::DecompositionError;
    pub use swirl_engine::InitError;

    // Domain
    pub use swirl_domain::{Decomposition, GridSpec};

    // Communicators
    pub use swirl_comm::{SoloComm, ThreadComm, ThreadGroup};

    // Engine
    pub use swirl_engine::{
        Diagnostics, DiagnosticsSink, EnvParams, Flow, LogDiagnostics, MemoryStore, RunLimits,
        Simulation, SolverConfig, StepMetrics, StepObserver, StepReport, StoreCheckpoint,
    };
}
