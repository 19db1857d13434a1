//! The four-stage Runge–Kutta step.
//!
//! One [`TimeIntegrator::step`] runs, for stages `k = 0..4`:
//!
//! 1. physical reconstruction: mask every staged spectrum and inverse
//!    transform it into the field's physical buffer;
//! 2. step-size decision (stage 0 only): global CFL maximum and growth cap;
//! 3. slope evaluation: `-Σ_j i k_j F(u_j q)` per quantity;
//! 4. projection of the velocity slopes onto divergence-free modes;
//! 5. exponential-integrator composition of the next staged state.
//!
//! After the last stage the staged buffers are promoted to committed state.
//! Any failure is fatal for the step and leaves the fields mid-step.

use std::sync::Arc;
use std::time::Instant;

use swirl_core::{
    AllocationError, AxisVec, Communicator, Complex64, Quantity, Stage, StepError, StepFailure,
};
use swirl_domain::Decomposition;
use swirl_fft::SpectralTransform;
use swirl_field::{FieldError, FieldStore, Workspace};

use crate::cfl::{local_cfl_max, next_dt};
use crate::config::SolverConfig;
use crate::metrics::StepMetrics;
use crate::projection::project;
use crate::tableau::{ButcherTableau, RK4};
use crate::update::compose_stage;

/// Advances a [`FieldStore`] by one step.
///
/// Owns the nonlinear-term scratch, so independent integrators never share
/// buffers.
#[derive(Debug)]
pub struct TimeIntegrator {
    tableau: ButcherTableau,
    config: SolverConfig,
    decomp: Arc<Decomposition>,
    spacing: AxisVec<f64>,
    workspace: Workspace,
    metrics: StepMetrics,
}

impl TimeIntegrator {
    /// An integrator for fields laid out by `decomp`.
    pub fn new(decomp: Arc<Decomposition>, config: SolverConfig) -> Result<Self, AllocationError> {
        let grid = decomp.grid();
        let spacing = (0..grid.ndim()).map(|a| grid.spacing(a)).collect();
        let workspace = Workspace::allocate(&decomp)?;
        Ok(Self {
            tableau: RK4,
            config,
            decomp,
            spacing,
            workspace,
            metrics: StepMetrics::default(),
        })
    }

    /// The configuration this integrator steps with.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Metrics of the most recent step.
    pub fn metrics(&self) -> &StepMetrics {
        &self.metrics
    }

    /// Scratch buffers, for callers that reconstruct fields between steps.
    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    /// Advance `fields` by one step and return the step size used.
    ///
    /// Collective: every rank must call it with the same `prev_dt`.
    pub fn step(
        &mut self,
        comm: &dyn Communicator,
        transform: &mut SpectralTransform,
        fields: &mut FieldStore,
        prev_dt: f64,
    ) -> Result<f64, StepError> {
        let step_start = Instant::now();
        let calls_before = transform.calls();
        self.metrics = StepMetrics::default();
        let velocity = velocity_indices(fields, self.decomp.ndim())
            .map_err(|e| field_failure(Stage::PhysicalReconstruction, e))?;

        fields.begin_step();
        let mut dt = prev_dt;
        for k in 0..self.tableau.stages() {
            let t = Instant::now();
            self.reconstruct_physical(comm, transform, fields)?;
            self.metrics.reconstruct_us += t.elapsed().as_micros() as u64;

            if k == 0 {
                let t = Instant::now();
                dt = self.decide_dt(comm, fields, &velocity, prev_dt)?;
                self.metrics.step_size_us += t.elapsed().as_micros() as u64;
            }

            let t = Instant::now();
            self.evaluate_slopes(comm, transform, fields, &velocity, k)?;
            self.metrics.slope_us += t.elapsed().as_micros() as u64;

            let t = Instant::now();
            self.project(fields, k);
            self.metrics.projection_us += t.elapsed().as_micros() as u64;

            let t = Instant::now();
            self.update_fields(fields, k, dt);
            self.metrics.update_us += t.elapsed().as_micros() as u64;

            log::trace!("rank {}: stage {k} done, dt = {dt:e}", self.decomp.rank());
        }
        fields
            .promote()
            .map_err(|e| field_failure(Stage::FieldUpdate, e))?;

        self.metrics.transforms = transform.calls() - calls_before;
        self.metrics.dt = dt;
        self.metrics.total_us = step_start.elapsed().as_micros() as u64;
        log::trace!(
            "rank {}: step took {} us ({} transforms)",
            self.decomp.rank(),
            self.metrics.total_us,
            self.metrics.transforms
        );
        Ok(dt)
    }

    /// Mask every field's active spectrum and inverse-transform it into the
    /// field's physical buffer.
    pub fn reconstruct_physical(
        &mut self,
        comm: &dyn Communicator,
        transform: &mut SpectralTransform,
        fields: &mut FieldStore,
    ) -> Result<(), StepError> {
        let mask = Arc::clone(fields.mask());
        let masked = &mut self.workspace.masked;
        for field in fields.iter_mut() {
            mask.apply(field.active(), masked);
            transform
                .backward(comm, masked.as_slice(), field.physical_mut())
                .map_err(|e| StepError::new(Stage::PhysicalReconstruction, e))?;
        }
        Ok(())
    }

    /// Global CFL maximum from the reconstructed velocity, and the step
    /// size derived from it.
    fn decide_dt(
        &mut self,
        comm: &dyn Communicator,
        fields: &FieldStore,
        velocity: &[usize],
        prev_dt: f64,
    ) -> Result<f64, StepError> {
        let buffers: Vec<&[f64]> = velocity.iter().map(|&i| fields.at(i).physical()).collect();
        let local = local_cfl_max(&buffers, &self.spacing);
        let max = comm
            .all_reduce_max(local)
            .map_err(|e| StepError::new(Stage::StepSizeDecision, e))?;
        if !max.is_finite() {
            log::warn!(
                "rank {}: non-finite CFL maximum, velocity has blown up",
                self.decomp.rank()
            );
            return Err(StepError::new(
                Stage::StepSizeDecision,
                StepFailure::NonFinite { quantity: None },
            ));
        }
        self.metrics.cfl_max = max;
        let dt = next_dt(
            prev_dt,
            self.config.dt_growth,
            self.config.cfl,
            self.decomp.ndim(),
            max,
        );
        Ok(dt)
    }

    /// Write stage `k`'s slope `-Σ_j i k_j F(u_j q)` for every quantity.
    fn evaluate_slopes(
        &mut self,
        comm: &dyn Communicator,
        transform: &mut SpectralTransform,
        fields: &mut FieldStore,
        velocity: &[usize],
        k: usize,
    ) -> Result<(), StepError> {
        if !self.config.advection {
            for field in fields.iter_mut() {
                field.slope_mut(k).fill(Complex64::new(0.0, 0.0));
            }
            return Ok(());
        }

        let modes = self.decomp.modes();
        let ws = &mut self.workspace;
        for q in 0..fields.len() {
            ws.advection.fill(Complex64::new(0.0, 0.0));
            for (axis, &u) in velocity.iter().enumerate() {
                let carrier = fields.at(u).physical();
                let carried = fields.at(q).physical();
                for ((p, a), b) in ws.product.iter_mut().zip(carrier).zip(carried) {
                    *p = a * b;
                }
                transform
                    .forward(comm, &ws.product, &mut ws.product_hat)
                    .map_err(|e| StepError::new(Stage::SlopeEvaluation, e))?;
                for (m, (acc, f)) in ws.advection.iter_mut().zip(&ws.product_hat).enumerate() {
                    let kj = modes.freq(m)[axis];
                    *acc += Complex64::new(0.0, kj) * f;
                }
            }
            for (s, a) in fields.at_mut(q).slope_mut(k).iter_mut().zip(&ws.advection) {
                *s = -a;
            }
        }
        Ok(())
    }

    /// Project stage `k`'s velocity slopes onto divergence-free modes.
    fn project(&self, fields: &mut FieldStore, k: usize) {
        let mut slopes: Vec<(Quantity, &mut [Complex64])> = fields
            .iter_mut()
            .filter(|f| f.quantity().is_velocity())
            .map(|f| (f.quantity(), f.slope_mut(k)))
            .collect();
        slopes.sort_by_key(|(q, _)| *q);
        let mut views: Vec<&mut [Complex64]> = slopes.into_iter().map(|(_, s)| s).collect();
        project(&mut views, self.decomp.modes());
    }

    /// Compose every field's stage-`k` state.
    fn update_fields(&self, fields: &mut FieldStore, k: usize, dt: f64) {
        let k2 = self.decomp.modes().k2_all();
        for field in fields.iter_mut() {
            let nu = field.diffusivity();
            compose_stage(&self.tableau, k, dt, nu, k2, field.stage_parts());
        }
    }
}

/// Store positions of the velocity components, ordered by axis.
fn velocity_indices(fields: &FieldStore, ndim: usize) -> Result<AxisVec<usize>, FieldError> {
    (0..ndim)
        .map(|axis| {
            let quantity = Quantity::Velocity(axis);
            fields
                .quantities()
                .position(|q| q == quantity)
                .ok_or(FieldError::UnknownQuantity { quantity })
        })
        .collect()
}

fn field_failure(stage: Stage, e: FieldError) -> StepError {
    StepError::new(
        stage,
        StepFailure::FieldAccess {
            reason: e.to_string(),
        },
    )
}
