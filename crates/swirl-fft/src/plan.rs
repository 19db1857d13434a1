//! FFT and transpose plans plus their staging buffers.

use std::sync::Arc;

use rustfft::{Fft, FftPlanner};
use swirl_core::{zeroed, AllocationError, CommError, Communicator, Complex64, Representation};
use swirl_domain::Decomposition;

use crate::TransposePlan;

struct AxisFft {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

/// Everything one rank needs to run transforms on a fixed decomposition.
///
/// Holds a forward and inverse 1-D FFT per axis, the transposes between
/// every pair of adjacent pencils, one complex staging buffer per pencil,
/// and the line and scratch buffers the FFTs work in. All buffers are
/// allocated once here and reused by every call.
pub struct TransformPlan {
    ffts: Vec<AxisFft>,
    // down[p]: pencil p + 1 -> p; up[p]: pencil p -> p + 1
    down: Vec<TransposePlan>,
    up: Vec<TransposePlan>,
    stages: Vec<Vec<Complex64>>,
    line: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

impl TransformPlan {
    /// Plan every FFT and transpose for `decomp` and allocate staging.
    pub fn build(decomp: &Decomposition) -> Result<Self, AllocationError> {
        let ndim = decomp.ndim();
        let mut planner = FftPlanner::<f64>::new();
        let ffts: Vec<AxisFft> = decomp
            .grid()
            .sizes()
            .iter()
            .map(|&n| AxisFft {
                forward: planner.plan_fft_forward(n),
                inverse: planner.plan_fft_inverse(n),
            })
            .collect();
        let scratch_len = ffts
            .iter()
            .flat_map(|f| [f.forward.get_inplace_scratch_len(), f.inverse.get_inplace_scratch_len()])
            .max()
            .unwrap_or(0);

        let down = (0..ndim - 1)
            .map(|p| TransposePlan::new(decomp, p + 1, p))
            .collect();
        let up = (0..ndim - 1)
            .map(|p| TransposePlan::new(decomp, p, p + 1))
            .collect();
        let stages = (0..ndim)
            .map(|p| zeroed("transform staging", decomp.layout(p, Representation::Spectral).len()))
            .collect::<Result<_, _>>()?;
        let last_len = decomp.grid().sizes()[ndim - 1];

        Ok(Self {
            ffts,
            down,
            up,
            stages,
            line: zeroed("transform line", last_len)?,
            scratch: zeroed("fft scratch", scratch_len)?,
        })
    }

    fn last(&self) -> usize {
        self.ffts.len() - 1
    }

    /// Real-to-complex forward transform, scaled by `norm`.
    pub fn forward(
        &mut self,
        comm: &dyn Communicator,
        physical: &[f64],
        spectral: &mut [Complex64],
        norm: f64,
    ) -> Result<(), CommError> {
        let last = self.last();
        let n = self.line.len();
        let h = n / 2 + 1;

        let fft = &self.ffts[last].forward;
        for (src, dst) in physical.chunks_exact(n).zip(self.stages[last].chunks_exact_mut(h)) {
            for (c, &x) in self.line.iter_mut().zip(src) {
                *c = Complex64::new(x, 0.0);
            }
            fft.process_with_scratch(&mut self.line, &mut self.scratch);
            dst.copy_from_slice(&self.line[..h]);
        }

        for p in (0..last).rev() {
            let (lower, upper) = self.stages.split_at_mut(p + 1);
            self.down[p].execute(comm, &upper[0], &mut lower[p])?;
            if !lower[p].is_empty() {
                self.ffts[p]
                    .forward
                    .process_with_scratch(&mut lower[p], &mut self.scratch);
            }
        }

        for (out, z) in spectral.iter_mut().zip(&self.stages[0]) {
            *out = z * norm;
        }
        Ok(())
    }

    /// Complex-to-real backward transform, unnormalized. The truncated
    /// last axis is completed by conjugate symmetry.
    pub fn backward(
        &mut self,
        comm: &dyn Communicator,
        spectral: &[Complex64],
        physical: &mut [f64],
    ) -> Result<(), CommError> {
        let last = self.last();
        let n = self.line.len();
        let h = n / 2 + 1;

        self.stages[0].copy_from_slice(spectral);
        for p in 0..last {
            let (lower, upper) = self.stages.split_at_mut(p + 1);
            if !lower[p].is_empty() {
                self.ffts[p]
                    .inverse
                    .process_with_scratch(&mut lower[p], &mut self.scratch);
            }
            self.up[p].execute(comm, &lower[p], &mut upper[0])?;
        }

        let fft = &self.ffts[last].inverse;
        for (src, dst) in self.stages[last].chunks_exact(h).zip(physical.chunks_exact_mut(n)) {
            self.line[..h].copy_from_slice(src);
            for k in h..n {
                self.line[k] = src[n - k].conj();
            }
            fft.process_with_scratch(&mut self.line, &mut self.scratch);
            for (x, c) in dst.iter_mut().zip(&self.line) {
                *x = c.re;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swirl_comm::SoloComm;
    use swirl_domain::GridSpec;

    #[test]
    fn single_mode_lands_on_its_coefficient() {
        // cos(2π x / L) on 8 points: coefficients ±1 of magnitude 1/2.
        let grid = GridSpec::new(&[8, 4], &[1.0, 1.0]).unwrap();
        let d = Decomposition::partition(grid, 1, 0).unwrap();
        let mut plan = TransformPlan::build(&d).unwrap();
        let phys_layout = d.physical_layout();
        let mut phys = vec![0.0; phys_layout.len()];
        for (i, v) in phys.iter_mut().enumerate() {
            let g = phys_layout.global_coords(i);
            *v = (std::f64::consts::TAU * g[0] as f64 / 8.0).cos();
        }
        let spec_layout = d.spectral_layout();
        let mut spec = vec![Complex64::new(0.0, 0.0); spec_layout.len()];
        plan.forward(&SoloComm, &phys, &mut spec, 1.0 / 32.0).unwrap();
        for (i, z) in spec.iter().enumerate() {
            let k = d.modes().wave(i);
            let expected = if (k[0] == 1 || k[0] == -1) && k[1] == 0 { 0.5 } else { 0.0 };
            assert!((z.re - expected).abs() < 1e-12, "mode {k:?}: {z}");
            assert!(z.im.abs() < 1e-12);
        }
    }
}
