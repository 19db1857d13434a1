//! Physical-space run diagnostics.
//!
//! [`Diagnostics::measure`] reduces the committed state of every field to
//! a handful of global numbers: the largest spectral divergence of the
//! velocity, the largest absolute physical value of each quantity, and the
//! kinetic and scalar energies. Values are reconstructed through the
//! dealiasing mask, so they describe what the next step will see.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use swirl_core::{Communicator, Quantity, ReduceOp, Stage, StepError};
use swirl_domain::Decomposition;
use swirl_fft::SpectralTransform;
use swirl_field::{FieldStore, Workspace};

use crate::projection::max_divergence;

/// Global diagnostics of the committed state.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    /// Rank that produced this record. Values are identical on every rank.
    pub rank: usize,
    /// Steps taken so far.
    pub step: u64,
    /// Simulation time.
    pub time: f64,
    /// Most recent step size.
    pub dt: f64,
    /// Wall-clock time since the run started.
    pub wall_time: Duration,
    /// Largest `|k · û|` over all modes.
    pub max_divergence: f64,
    /// Largest absolute physical value of each quantity.
    pub max_abs: IndexMap<Quantity, f64>,
    /// `Σ ½ |u|² ΔV` over the grid.
    pub kinetic_energy: f64,
    /// `Σ ½ s² ΔV` over the grid.
    pub scalar_energy: f64,
}

impl Diagnostics {
    /// Measure the committed state of `fields`. Collective.
    ///
    /// Physical buffers of the fields are left untouched; reconstruction
    /// goes through `workspace`. The run counters (`step`, `time`, `dt`,
    /// `wall_time`) are left at zero for the caller to fill in.
    pub fn measure(
        comm: &dyn Communicator,
        decomp: &Decomposition,
        transform: &mut SpectralTransform,
        fields: &FieldStore,
        workspace: &mut Workspace,
    ) -> Result<Self, StepError> {
        let mask = Arc::clone(fields.mask());
        let cell = decomp.grid().cell_volume();

        // Slot 0 is the divergence, then one slot per quantity.
        let mut maxima = vec![0.0; fields.len() + 1];
        let mut energies = [0.0; 2];

        let mut velocity: Vec<_> = fields
            .iter()
            .filter(|f| f.quantity().is_velocity())
            .map(|f| (f.quantity(), f.state()))
            .collect();
        velocity.sort_by_key(|(q, _)| *q);
        let spectra: Vec<_> = velocity.into_iter().map(|(_, s)| s).collect();
        maxima[0] = max_divergence(&spectra, decomp.modes());

        for (slot, field) in fields.iter().enumerate() {
            mask.apply(field.state(), &mut workspace.masked);
            transform
                .backward(comm, &workspace.masked, &mut workspace.product)
                .map_err(|e| StepError::new(Stage::Diagnostics, e))?;
            let mut max = 0.0_f64;
            let mut sum = 0.0;
            for v in &workspace.product {
                max = max.max(v.abs());
                sum += v * v;
            }
            maxima[slot + 1] = max;
            let energy = if field.quantity().is_velocity() {
                &mut energies[0]
            } else {
                &mut energies[1]
            };
            *energy += 0.5 * sum * cell;
        }

        comm.all_reduce(ReduceOp::Max, &mut maxima)
            .map_err(|e| StepError::new(Stage::Diagnostics, e))?;
        comm.all_reduce(ReduceOp::Sum, &mut energies)
            .map_err(|e| StepError::new(Stage::Diagnostics, e))?;

        Ok(Self {
            rank: decomp.rank(),
            step: 0,
            time: 0.0,
            dt: 0.0,
            wall_time: Duration::ZERO,
            max_divergence: maxima[0],
            max_abs: fields.quantities().zip(maxima[1..].iter().copied()).collect(),
            kinetic_energy: energies[0],
            scalar_energy: energies[1],
        })
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} t={:.6e} dt={:.3e} wall={:.1?} div={:.3e} ke={:.6e} se={:.6e}",
            self.step,
            self.time,
            self.dt,
            self.wall_time,
            self.max_divergence,
            self.kinetic_energy,
            self.scalar_energy
        )?;
        for (q, v) in &self.max_abs {
            write!(f, " max|{q}|={v:.3e}")?;
        }
        Ok(())
    }
}

// ── Sinks ──────────────────────────────────────────────────────────

/// Receives diagnostics on every rank.
pub trait DiagnosticsSink {
    /// Consume one record.
    fn record(&mut self, diagnostics: &Diagnostics);
}

/// Logs a progress line at `info` level from rank 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDiagnostics;

impl DiagnosticsSink for LogDiagnostics {
    fn record(&mut self, diagnostics: &Diagnostics) {
        if diagnostics.rank == 0 {
            log::info!("{diagnostics}");
        }
    }
}

impl DiagnosticsSink for Vec<Diagnostics> {
    fn record(&mut self, diagnostics: &Diagnostics) {
        self.push(diagnostics.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swirl_comm::SoloComm;
    use swirl_core::Complex64;
    use swirl_domain::GridSpec;

    #[test]
    fn single_mode_energy_and_extrema() {
        let grid = GridSpec::cube(2, 8).unwrap();
        let decomp = Arc::new(Decomposition::partition(grid, 1, 0).unwrap());
        let mut fields = FieldStore::allocate(
            &decomp,
            Quantity::all(2).into_iter().map(|q| (q, 0.1)),
            1,
        )
        .unwrap();
        let mut ws = Workspace::allocate(&decomp).unwrap();
        let mut transform = SpectralTransform::new(Arc::clone(&decomp));

        // s = cos(x): coefficient 1/2 at kx = 1 (only the +1 half is stored
        // along axis 0 together with -1 as the conjugate partner).
        let modes = decomp.modes();
        let scalar = fields.get_mut(Quantity::Scalar).unwrap().state_mut();
        for m in 0..modes.len() {
            let w = modes.wave(m);
            if (w[0] == 1 || w[0] == -1) && w[1] == 0 {
                scalar[m] = Complex64::new(0.5, 0.0);
            }
        }

        let d = Diagnostics::measure(&SoloComm, &decomp, &mut transform, &fields, &mut ws).unwrap();
        assert!((d.max_abs[&Quantity::Scalar] - 1.0).abs() < 1e-12);
        assert_eq!(d.max_abs[&Quantity::Velocity(0)], 0.0);
        assert_eq!(d.kinetic_energy, 0.0);
        // ½ ∫ cos² x over [0, 2π)² = π².
        let expected = std::f64::consts::PI.powi(2);
        assert!((d.scalar_energy - expected).abs() < 1e-10);
        assert_eq!(d.max_divergence, 0.0);
    }

    #[test]
    fn divergence_of_a_compressive_mode() {
        let grid = GridSpec::cube(2, 8).unwrap();
        let decomp = Arc::new(Decomposition::partition(grid, 1, 0).unwrap());
        let mut fields =
            FieldStore::allocate(&decomp, Quantity::all(2).into_iter().map(|q| (q, 0.1)), 1)
                .unwrap();
        let modes = decomp.modes();
        let m = (0..modes.len()).find(|&m| modes.wave(m) == [2, 0]).unwrap();
        fields.get_mut(Quantity::Velocity(0)).unwrap().state_mut()[m] = Complex64::new(0.0, 0.5);
        let mut ws = Workspace::allocate(&decomp).unwrap();
        let mut transform = SpectralTransform::new(Arc::clone(&decomp));
        let d = Diagnostics::measure(&SoloComm, &decomp, &mut transform, &fields, &mut ws).unwrap();
        assert!((d.max_divergence - 1.0).abs() < 1e-15);
    }

    #[test]
    fn vec_sink_collects() {
        let mut sink: Vec<Diagnostics> = Vec::new();
        let d = Diagnostics {
            rank: 0,
            step: 3,
            time: 1.0,
            dt: 0.1,
            wall_time: Duration::from_millis(5),
            max_divergence: 0.0,
            max_abs: IndexMap::new(),
            kinetic_energy: 2.0,
            scalar_energy: 0.0,
        };
        sink.record(&d);
        LogDiagnostics.record(&d);
        assert_eq!(sink, vec![d]);
        assert!(sink[0].to_string().starts_with("step 3 "));
    }
}
