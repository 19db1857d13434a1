//! The per-rank simulation driver.
//!
//! A [`Simulation`] owns everything one rank needs: its communicator,
//! decomposition, lazily planned transform, fields and integrator. All
//! methods that touch field data are collective and must be called in the
//! same order on every rank.
//!
//! Every failure is fatal for the whole group. Before returning an error
//! the simulation logs it and aborts the communicator, which releases
//! peers blocked in a collective.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use swirl_core::{
    ArrayStore, Communicator, Quantity, Stage, StepError, TransformError,
};
use swirl_domain::{Decomposition, GridSpec};
use swirl_fft::SpectralTransform;
use swirl_field::FieldStore;

use crate::checkpoint::{read_checkpoint, CheckpointSink, CheckpointView};
use crate::config::{InitError, RunLimits, SolverConfig};
use crate::diagnostics::{Diagnostics, DiagnosticsSink};
use crate::integrator::TimeIntegrator;
use crate::metrics::StepMetrics;
use crate::tableau::STAGES;

// ── Reports ────────────────────────────────────────────────────────

/// Outcome of one step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    /// Steps taken, including this one.
    pub step: u64,
    /// Simulation time after the step.
    pub time: f64,
    /// Step size used.
    pub dt: f64,
    /// Timing and step-size data.
    pub metrics: StepMetrics,
}

/// Why [`Simulation::run`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Simulation time passed the limit.
    TimeLimit,
    /// Wall-clock time passed the limit.
    WallTimeLimit,
    /// The observer asked to stop.
    Observer,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeLimit => f.write_str("simulation time limit reached"),
            Self::WallTimeLimit => f.write_str("wall-clock limit reached"),
            Self::Observer => f.write_str("stopped by observer"),
        }
    }
}

/// Summary of a [`Simulation::run`].
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Steps taken during this run.
    pub steps: u64,
    /// Simulation time at the end.
    pub time: f64,
    /// Why the run stopped.
    pub reason: StopReason,
}

// ── Observers ──────────────────────────────────────────────────────

/// Whether the run loop continues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Take another step.
    Continue,
    /// Return from the run loop.
    Stop,
}

/// Called after every step that did not end the run.
///
/// The observer may take diagnostics or checkpoints through `sim`. Its
/// decisions must be identical on every rank, so base them on the step
/// count or simulation time, never on rank-local state.
pub trait StepObserver {
    /// React to `report`.
    fn after_step(&mut self, sim: &mut Simulation, report: &StepReport) -> Result<Flow, StepError>;
}

impl<F> StepObserver for F
where
    F: FnMut(&mut Simulation, &StepReport) -> Result<Flow, StepError>,
{
    fn after_step(&mut self, sim: &mut Simulation, report: &StepReport) -> Result<Flow, StepError> {
        self(sim, report)
    }
}

/// Sends diagnostics to a sink whenever simulation time passes the next
/// multiple of `interval`.
#[derive(Debug)]
pub struct DiagnosticsEvery<S> {
    interval: f64,
    next: f64,
    sink: S,
}

impl<S: DiagnosticsSink> DiagnosticsEvery<S> {
    /// Report every `interval` units of simulation time, starting with the
    /// first step.
    pub fn new(interval: f64, sink: S) -> Self {
        Self {
            interval,
            next: f64::NEG_INFINITY,
            sink,
        }
    }

    /// The sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: DiagnosticsSink> StepObserver for DiagnosticsEvery<S> {
    fn after_step(&mut self, sim: &mut Simulation, report: &StepReport) -> Result<Flow, StepError> {
        if report.time >= self.next {
            let d = sim.diagnostics()?;
            self.sink.record(&d);
            self.next = report.time + self.interval;
        }
        Ok(Flow::Continue)
    }
}

// ── Simulation ─────────────────────────────────────────────────────

/// One rank's share of a distributed run.
pub struct Simulation {
    comm: Box<dyn Communicator>,
    decomp: Arc<Decomposition>,
    transform: SpectralTransform,
    fields: FieldStore,
    integrator: TimeIntegrator,
    step: u64,
    time: f64,
    dt: f64,
    started: Instant,
}

impl Simulation {
    /// Read the configuration from `params` and set up this rank.
    /// Collective.
    pub fn initialize(
        grid: GridSpec,
        params: &dyn swirl_core::ParamSource,
        comm: impl Communicator + 'static,
    ) -> Result<Self, InitError> {
        match SolverConfig::from_params(params) {
            Ok(config) => Self::with_config(grid, config, comm),
            Err(e) => {
                let e = InitError::from(e);
                abort(&comm, &e.to_string());
                Err(e)
            }
        }
    }

    /// Set up this rank with an explicit configuration. All fields start
    /// at zero. Collective.
    pub fn with_config(
        grid: GridSpec,
        config: SolverConfig,
        comm: impl Communicator + 'static,
    ) -> Result<Self, InitError> {
        let comm: Box<dyn Communicator> = Box::new(comm);
        Self::build(grid, config, comm).map_err(|(comm, e)| {
            abort(comm.as_ref(), &e.to_string());
            e
        })
    }

    fn build(
        grid: GridSpec,
        config: SolverConfig,
        comm: Box<dyn Communicator>,
    ) -> Result<Self, (Box<dyn Communicator>, InitError)> {
        let setup = || -> Result<_, InitError> {
            config.validate()?;
            let (rank, nprocs) = (comm.rank(), comm.size());
            let decomp = match &config.process_grid {
                Some(request) => Decomposition::partition_with(grid, nprocs, rank, request)?,
                None => Decomposition::partition(grid, nprocs, rank)?,
            };
            let decomp = Arc::new(decomp);
            let nu = config.velocity_diffusivity();
            let kappa = config.scalar_diffusivity();
            let quantities = Quantity::all(decomp.ndim())
                .into_iter()
                .map(|q| (q, if q.is_velocity() { nu } else { kappa }));
            let fields = FieldStore::allocate(&decomp, quantities, STAGES)?;
            let integrator = TimeIntegrator::new(Arc::clone(&decomp), config.clone())?;
            Ok((decomp, fields, integrator))
        };
        let (decomp, fields, integrator) = match setup() {
            Ok(parts) => parts,
            Err(e) => return Err((comm, e)),
        };

        if decomp.rank() == 0 {
            log::info!(
                "initialized {}-D grid {:?}: Re = {}, Sc = {}, {} of {} modes kept on rank 0",
                decomp.ndim(),
                decomp.grid().sizes(),
                config.reynolds,
                config.schmidt,
                fields.mask().retained(),
                fields.mask().len()
            );
        }
        Ok(Self {
            transform: SpectralTransform::new(Arc::clone(&decomp)),
            comm,
            decomp,
            fields,
            integrator,
            step: 0,
            time: 0.0,
            dt: config.initial_dt,
            started: Instant::now(),
        })
    }

    /// This rank's decomposition.
    pub fn decomposition(&self) -> &Arc<Decomposition> {
        &self.decomp
    }

    /// The communicator.
    pub fn comm(&self) -> &dyn Communicator {
        self.comm.as_ref()
    }

    /// The fields.
    pub fn fields(&self) -> &FieldStore {
        &self.fields
    }

    /// The configuration.
    pub fn config(&self) -> &SolverConfig {
        self.integrator.config()
    }

    /// Steps taken.
    pub fn step_count(&self) -> u64 {
        self.step
    }

    /// Simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Step size carried into the next step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Wall-clock time since construction.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Set `quantity` from this rank's block of physical values, laid out
    /// like [`Decomposition::physical_layout`]. Collective.
    pub fn load_physical(&mut self, quantity: Quantity, values: &[f64]) -> Result<(), InitError> {
        let result = self.try_load_physical(quantity, values);
        if let Err(e) = &result {
            self.fatal(&e.to_string());
        }
        result
    }

    fn try_load_physical(&mut self, quantity: Quantity, values: &[f64]) -> Result<(), InitError> {
        let ws = self.integrator.workspace_mut();
        if values.len() != ws.product.len() {
            return Err(TransformError::ShapeMismatch {
                buffer: "initial condition",
                expected: ws.product.len(),
                actual: values.len(),
            }
            .into());
        }
        ws.product.copy_from_slice(values);
        let field = self.fields.get_mut(quantity)?;
        self.transform
            .forward(self.comm.as_ref(), &ws.product, field.state_mut())?;
        Ok(())
    }

    /// Advance one step. Collective.
    pub fn step(&mut self) -> Result<StepReport, StepError> {
        let result = self
            .integrator
            .step(self.comm.as_ref(), &mut self.transform, &mut self.fields, self.dt);
        let dt = match result {
            Ok(dt) => dt,
            Err(e) => return Err(self.fail(e)),
        };
        self.step += 1;
        self.time += dt;
        self.dt = dt;
        Ok(StepReport {
            step: self.step,
            time: self.time,
            dt,
            metrics: self.integrator.metrics().clone(),
        })
    }

    /// Measure the committed state. Collective.
    pub fn diagnostics(&mut self) -> Result<Diagnostics, StepError> {
        let measured = Diagnostics::measure(
            self.comm.as_ref(),
            &self.decomp,
            &mut self.transform,
            &self.fields,
            self.integrator.workspace_mut(),
        );
        match measured {
            Ok(mut d) => {
                d.step = self.step;
                d.time = self.time;
                d.dt = self.dt;
                d.wall_time = self.started.elapsed();
                Ok(d)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Hand the committed state to `sink`. Collective.
    pub fn checkpoint(&mut self, sink: &mut dyn CheckpointSink) -> Result<(), StepError> {
        let view = CheckpointView {
            step: self.step,
            time: self.time,
            dt: self.dt,
            decomp: &self.decomp,
            fields: &self.fields,
        };
        match sink.save(&view) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(StepError::new(Stage::Checkpoint, e))),
        }
    }

    /// Restore state and run counters from a checkpoint written by a run
    /// on the same grid, with any number of ranks. Collective.
    pub fn restore(&mut self, store: &dyn ArrayStore) -> Result<(), InitError> {
        match read_checkpoint(store, &self.decomp, &mut self.fields) {
            Ok(header) => {
                self.step = header.step;
                self.time = header.time;
                self.dt = header.dt;
                if self.decomp.rank() == 0 {
                    log::info!("restored step {} at t = {:e}", self.step, self.time);
                }
                Ok(())
            }
            Err(e) => {
                let e = InitError::from(e);
                self.fatal(&e.to_string());
                Err(e)
            }
        }
    }

    /// Step until simulation time passes `limits.time_max`, wall-clock
    /// time passes `limits.wall_time_max`, or `observer` stops the run.
    ///
    /// The wall clock is agreed across ranks with a MAX reduction, so
    /// every rank stops after the same step. Collective.
    pub fn run(
        &mut self,
        limits: &RunLimits,
        observer: &mut dyn StepObserver,
    ) -> Result<RunSummary, StepError> {
        let first = self.step;
        let reason = loop {
            let report = self.step()?;
            if self.time > limits.time_max {
                break StopReason::TimeLimit;
            }
            let local = self.started.elapsed().as_secs_f64();
            let wall = match self.comm.all_reduce_max(local) {
                Ok(wall) => wall,
                Err(e) => return Err(self.fail(StepError::new(Stage::RunControl, e))),
            };
            if wall > limits.wall_time_max.as_secs_f64() {
                break StopReason::WallTimeLimit;
            }
            match observer.after_step(self, &report) {
                Ok(Flow::Stop) => break StopReason::Observer,
                Ok(Flow::Continue) => {}
                Err(e) => return Err(self.fail(e)),
            }
        };
        let summary = RunSummary {
            steps: self.step - first,
            time: self.time,
            reason,
        };
        if self.decomp.rank() == 0 {
            log::info!(
                "run finished after {} steps at t = {:e}: {}",
                summary.steps,
                summary.time,
                summary.reason
            );
        }
        Ok(summary)
    }

    fn fail(&self, e: StepError) -> StepError {
        self.fatal(&e.to_string());
        e
    }

    fn fatal(&self, reason: &str) {
        abort(self.comm.as_ref(), reason);
    }
}

fn abort(comm: &dyn Communicator, reason: &str) {
    log::error!("rank {}: {reason}; aborting", comm.rank());
    comm.abort(reason);
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("rank", &self.decomp.rank())
            .field("grid", &self.decomp.grid().sizes())
            .field("step", &self.step)
            .field("time", &self.time)
            .field("dt", &self.dt)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swirl_comm::SoloComm;
    use swirl_test_utils::MapParams;

    fn keep_going(_: &mut Simulation, _: &StepReport) -> Result<Flow, StepError> {
        Ok(Flow::Continue)
    }

    #[test]
    fn initialize_requires_reynolds() {
        let grid = GridSpec::cube(2, 8).unwrap();
        let err = Simulation::initialize(grid, &MapParams::new().with("Sc", 1.0), SoloComm)
            .unwrap_err();
        assert!(matches!(err, InitError::Config(_)));
    }

    #[test]
    fn bad_process_grid_is_a_decomposition_error() {
        let grid = GridSpec::cube(2, 8).unwrap();
        let config = SolverConfig::new(10.0, 1.0).with_process_grid(vec![2]);
        let err = Simulation::with_config(grid, config, SoloComm).unwrap_err();
        assert!(matches!(err, InitError::Decomposition(_)));
    }

    #[test]
    fn load_rejects_wrong_length() {
        let grid = GridSpec::cube(2, 8).unwrap();
        let mut sim = Simulation::with_config(grid, SolverConfig::new(10.0, 1.0), SoloComm).unwrap();
        let err = sim.load_physical(Quantity::Scalar, &[0.0; 3]).unwrap_err();
        assert!(matches!(err, InitError::Transform(TransformError::ShapeMismatch { .. })));
    }

    #[test]
    fn run_stops_at_time_limit_and_observer() {
        let grid = GridSpec::cube(2, 8).unwrap();
        let mut sim = Simulation::with_config(grid, SolverConfig::new(10.0, 1.0), SoloComm).unwrap();
        // At rest, dt grows 1.2, 1.44, ...
        let summary = sim
            .run(&RunLimits::time(2.0), &mut keep_going)
            .unwrap();
        assert_eq!(summary.reason, StopReason::TimeLimit);
        assert_eq!(summary.steps, 2);
        assert!((sim.time() - 2.64).abs() < 1e-12);

        let mut seen = 0;
        let summary = sim
            .run(&RunLimits::time(1e9), &mut |_: &mut Simulation, r: &StepReport| -> Result<Flow, StepError> {
                seen += 1;
                Ok(if r.step >= 5 { Flow::Stop } else { Flow::Continue })
            })
            .unwrap();
        assert_eq!(summary.reason, StopReason::Observer);
        assert_eq!(summary.steps, 3);
        assert_eq!(seen, 3);
    }

    #[test]
    fn zero_wall_time_stops_after_one_step() {
        let grid = GridSpec::cube(2, 8).unwrap();
        let mut sim = Simulation::with_config(grid, SolverConfig::new(10.0, 1.0), SoloComm).unwrap();
        let limits = RunLimits {
            time_max: f64::INFINITY,
            wall_time_max: Duration::ZERO,
        };
        let summary = sim
            .run(&limits, &mut keep_going)
            .unwrap();
        assert_eq!(summary.reason, StopReason::WallTimeLimit);
        assert_eq!(summary.steps, 1);
    }
}
