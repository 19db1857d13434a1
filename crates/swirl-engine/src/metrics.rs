//! Per-step performance metrics for the time integrator.
//!
//! [`StepMetrics`] captures timing for a single step, split by stage
//! phase, plus the quantities that decided the step size.

/// Timing and step-size data collected during a single step.
///
/// All durations are in microseconds and summed over the four stages.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step.
    pub total_us: u64,
    /// Masking and inverse transforms of the staged state.
    pub reconstruct_us: u64,
    /// Local CFL scan and global reduction.
    pub step_size_us: u64,
    /// Products, forward transforms and derivative accumulation.
    pub slope_us: u64,
    /// Velocity slope projection.
    pub projection_us: u64,
    /// Exponential-integrator composition of the next stage.
    pub update_us: u64,
    /// Number of spectral transforms executed.
    pub transforms: u64,
    /// Global maximum of `Σ |u_j| / Δx_j`.
    pub cfl_max: f64,
    /// Step size used.
    pub dt: f64,
}
