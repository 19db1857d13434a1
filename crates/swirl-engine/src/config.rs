//! Solver configuration, run limits, and initialization errors.
//!
//! [`SolverConfig`] is the validated input for constructing a
//! [`Simulation`](crate::Simulation). It is built either from a
//! [`ParamSource`] or directly with [`SolverConfig::new`] and the `with_*`
//! setters; [`validate()`](SolverConfig::validate) checks every value at
//! startup.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use swirl_core::{AllocationError, ConfigError, ParamSource, StoreError, TransformError};
use swirl_domain::DecompositionError;
use swirl_field::FieldError;

// ── SolverConfig ───────────────────────────────────────────────────

/// Physical and numerical parameters of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverConfig {
    /// Reynolds number. Velocity diffusivity is `1 / Re`.
    pub reynolds: f64,
    /// Schmidt number. Scalar diffusivity is `1 / (Re Sc)`.
    pub schmidt: f64,
    /// CFL constant. Default: 2.0, below the RK4 stability limit on the
    /// imaginary axis.
    pub cfl: f64,
    /// Largest allowed ratio between consecutive step sizes. Default: 1.2.
    pub dt_growth: f64,
    /// Step size carried into the first step. Default: 1.0.
    pub initial_dt: f64,
    /// Whether the advective term is evaluated. Disabling it leaves pure
    /// diffusion. Default: true.
    pub advection: bool,
    /// Explicit process-grid request; `0` entries are chosen
    /// automatically. `None` chooses every dimension.
    pub process_grid: Option<Vec<usize>>,
}

impl SolverConfig {
    /// Configuration with the given Reynolds and Schmidt numbers and
    /// default numerics.
    pub fn new(reynolds: f64, schmidt: f64) -> Self {
        Self {
            reynolds,
            schmidt,
            cfl: 2.0,
            dt_growth: 1.2,
            initial_dt: 1.0,
            advection: true,
            process_grid: None,
        }
    }

    /// Read `Re` and `Sc` (required) and `cfl`, `dt_growth`, `initial_dt`
    /// (optional) from `params`, then validate.
    pub fn from_params(params: &dyn ParamSource) -> Result<Self, ConfigError> {
        let defaults = Self::new(1.0, 1.0);
        let config = Self {
            reynolds: params.get("Re")?,
            schmidt: params.get("Sc")?,
            cfl: params.get_or("cfl", defaults.cfl)?,
            dt_growth: params.get_or("dt_growth", defaults.dt_growth)?,
            initial_dt: params.get_or("initial_dt", defaults.initial_dt)?,
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the CFL constant.
    pub fn with_cfl(mut self, cfl: f64) -> Self {
        self.cfl = cfl;
        self
    }

    /// Set the step growth limit.
    pub fn with_dt_growth(mut self, growth: f64) -> Self {
        self.dt_growth = growth;
        self
    }

    /// Set the initial step size.
    pub fn with_initial_dt(mut self, dt: f64) -> Self {
        self.initial_dt = dt;
        self
    }

    /// Enable or disable the advective term.
    pub fn with_advection(mut self, on: bool) -> Self {
        self.advection = on;
        self
    }

    /// Request a process grid.
    pub fn with_process_grid(mut self, dims: Vec<usize>) -> Self {
        self.process_grid = Some(dims);
        self
    }

    /// Diffusivity of every velocity component.
    pub fn velocity_diffusivity(&self) -> f64 {
        1.0 / self.reynolds
    }

    /// Diffusivity of the scalar.
    pub fn scalar_diffusivity(&self) -> f64 {
        1.0 / (self.reynolds * self.schmidt)
    }

    /// Check that every value is finite and in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("Re", self.reynolds)?;
        positive("Sc", self.schmidt)?;
        positive("cfl", self.cfl)?;
        positive("initial_dt", self.initial_dt)?;
        if !(self.dt_growth.is_finite() && self.dt_growth >= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "dt_growth".into(),
                value: self.dt_growth,
                expected: "finite and at least 1",
            });
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name: name.into(),
            value,
            expected: "finite and positive",
        })
    }
}

// ── RunLimits ──────────────────────────────────────────────────────

/// When [`Simulation::run`](crate::Simulation::run) stops.
#[derive(Clone, Debug, PartialEq)]
pub struct RunLimits {
    /// Stop once simulation time exceeds this.
    pub time_max: f64,
    /// Stop once wall-clock time since the run started exceeds this.
    pub wall_time_max: Duration,
}

impl RunLimits {
    /// Read `timemax` and `wtimemax` (seconds), both required.
    pub fn from_params(params: &dyn ParamSource) -> Result<Self, ConfigError> {
        let time_max = params.get("timemax")?;
        let wall = params.get("wtimemax")?;
        if wall.is_nan() || wall < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "wtimemax".into(),
                value: wall,
                expected: "non-negative",
            });
        }
        if time_max.is_nan() {
            return Err(ConfigError::OutOfRange {
                name: "timemax".into(),
                value: time_max,
                expected: "a number",
            });
        }
        Ok(Self {
            time_max,
            wall_time_max: Duration::try_from_secs_f64(wall).unwrap_or(Duration::MAX),
        })
    }

    /// Limit on simulation time only.
    pub fn time(time_max: f64) -> Self {
        Self {
            time_max,
            wall_time_max: Duration::MAX,
        }
    }
}

// ── InitError ──────────────────────────────────────────────────────

/// Errors raised while setting up or restoring a simulation.
#[derive(Clone, Debug, PartialEq)]
pub enum InitError {
    /// A parameter is missing or invalid.
    Config(ConfigError),
    /// The grid cannot be decomposed over the process group.
    Decomposition(DecompositionError),
    /// A buffer could not be allocated.
    Allocation(AllocationError),
    /// The initial-condition transform failed.
    Transform(TransformError),
    /// Field access failed.
    Field(FieldError),
    /// The checkpoint store rejected a read.
    Store(StoreError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::Decomposition(e) => write!(f, "decomposition: {e}"),
            Self::Allocation(e) => write!(f, "allocation: {e}"),
            Self::Transform(e) => write!(f, "transform: {e}"),
            Self::Field(e) => write!(f, "fields: {e}"),
            Self::Store(e) => write!(f, "checkpoint: {e}"),
        }
    }
}

impl Error for InitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Decomposition(e) => Some(e),
            Self::Allocation(e) => Some(e),
            Self::Transform(e) => Some(e),
            Self::Field(e) => Some(e),
            Self::Store(e) => Some(e),
        }
    }
}

impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<DecompositionError> for InitError {
    fn from(e: DecompositionError) -> Self {
        Self::Decomposition(e)
    }
}

impl From<AllocationError> for InitError {
    fn from(e: AllocationError) -> Self {
        Self::Allocation(e)
    }
}

impl From<TransformError> for InitError {
    fn from(e: TransformError) -> Self {
        Self::Transform(e)
    }
}

impl From<FieldError> for InitError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}

impl From<StoreError> for InitError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swirl_test_utils::MapParams;

    #[test]
    fn defaults() {
        let c = SolverConfig::new(100.0, 2.0);
        assert_eq!(c.cfl, 2.0);
        assert_eq!(c.dt_growth, 1.2);
        assert_eq!(c.initial_dt, 1.0);
        assert!(c.advection);
        assert_eq!(c.velocity_diffusivity(), 0.01);
        assert_eq!(c.scalar_diffusivity(), 0.005);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn from_params_requires_re_and_sc() {
        let p = MapParams::new().with("Re", 10.0);
        assert_eq!(
            SolverConfig::from_params(&p),
            Err(ConfigError::Missing { name: "Sc".into() })
        );
        let p = p.with("Sc", 1.0).with("cfl", 1.5);
        let c = SolverConfig::from_params(&p).unwrap();
        assert_eq!(c.cfl, 1.5);
        assert_eq!(c.dt_growth, 1.2);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let err = SolverConfig::new(-1.0, 1.0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { ref name, .. } if name == "Re"));
        assert!(SolverConfig::new(1.0, 1.0).with_cfl(f64::NAN).validate().is_err());
        assert!(SolverConfig::new(1.0, 1.0).with_dt_growth(0.9).validate().is_err());
    }

    #[test]
    fn run_limits_from_params() {
        let p = MapParams::new().with("timemax", 5.0).with("wtimemax", 30.0);
        let l = RunLimits::from_params(&p).unwrap();
        assert_eq!(l.time_max, 5.0);
        assert_eq!(l.wall_time_max, Duration::from_secs(30));
        let p = MapParams::new().with("timemax", 5.0).with("wtimemax", -1.0);
        assert!(RunLimits::from_params(&p).is_err());
    }
}
