//! Time integration and the simulation driver for swirl.
//!
//! [`TimeIntegrator`] advances the fields of one rank by a four-stage
//! Runge–Kutta step with exact exponential treatment of diffusion, a
//! CFL-limited step size, pseudo-spectral advection and a divergence-free
//! projection of the velocity slopes. [`Simulation`] wraps it with
//! initialization from a parameter source, initial conditions,
//! diagnostics, checkpoint/restart and a run loop.
//!
//! Every rank of a process group runs its own `Simulation` on its own
//! thread or process; all of them must call the same collective methods in
//! the same order.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cfl;
pub mod checkpoint;
pub mod config;
pub mod diagnostics;
pub mod integrator;
pub mod metrics;
pub mod params;
pub mod projection;
pub mod simulation;
pub mod store;
pub mod tableau;
pub mod update;

pub use checkpoint::{
    read_checkpoint, write_checkpoint, CheckpointHeader, CheckpointSink, CheckpointView,
    StoreCheckpoint,
};
pub use config::{InitError, RunLimits, SolverConfig};
pub use diagnostics::{Diagnostics, DiagnosticsSink, LogDiagnostics};
pub use integrator::TimeIntegrator;
pub use metrics::StepMetrics;
pub use params::EnvParams;
pub use simulation::{
    DiagnosticsEvery, Flow, RunSummary, Simulation, StepObserver, StepReport, StopReason,
};
pub use store::MemoryStore;
pub use tableau::{ButcherTableau, RK4, STAGES};
