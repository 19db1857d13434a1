//! The lazily planned spectral transform engine.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use swirl_core::{Communicator, Complex64, TransformError};
use swirl_domain::Decomposition;

use crate::TransformPlan;

/// Forward and backward transforms between a rank's physical block and
/// its spectral block.
///
/// Construction is cheap. The first transform call builds the
/// [`TransformPlan`], which is then reused for every later call. Each
/// instance owns its plans and buffers outright, so several independent
/// instances can coexist in one process.
///
/// Every call is collective: all ranks of the decomposition must call
/// the same transforms in the same order.
pub struct SpectralTransform {
    decomp: Arc<Decomposition>,
    plan: Option<TransformPlan>,
    norm: f64,
    calls: u64,
}

impl SpectralTransform {
    /// A transform for `decomp`. No plans are built yet.
    pub fn new(decomp: Arc<Decomposition>) -> Self {
        let norm = 1.0 / decomp.grid().point_count() as f64;
        Self {
            decomp,
            plan: None,
            norm,
            calls: 0,
        }
    }

    /// The decomposition this transform operates on.
    pub fn decomposition(&self) -> &Arc<Decomposition> {
        &self.decomp
    }

    /// Whether the plans have been built.
    pub fn is_planned(&self) -> bool {
        self.plan.is_some()
    }

    /// Number of transforms executed so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// Get the plan, building it on first use.
    pub fn plan(&mut self) -> Result<&mut TransformPlan, TransformError> {
        let plan = match self.plan.take() {
            Some(plan) => plan,
            None => {
                let start = Instant::now();
                let plan = TransformPlan::build(&self.decomp)?;
                log::debug!(
                    "rank {}: built transform plans for {:?} in {:?}",
                    self.decomp.rank(),
                    self.decomp.grid().sizes(),
                    start.elapsed()
                );
                plan
            }
        };
        Ok(self.plan.insert(plan))
    }

    /// Physical block to spectral block, normalized by `1 / ∏N`.
    pub fn forward(
        &mut self,
        comm: &dyn Communicator,
        physical: &[f64],
        spectral: &mut [Complex64],
    ) -> Result<(), TransformError> {
        check_len("physical", self.decomp.physical_layout().len(), physical.len())?;
        check_len("spectral", self.decomp.spectral_layout().len(), spectral.len())?;
        let norm = self.norm;
        self.plan()?.forward(comm, physical, spectral, norm)?;
        self.calls += 1;
        Ok(())
    }

    /// Spectral block to physical block, unnormalized.
    pub fn backward(
        &mut self,
        comm: &dyn Communicator,
        spectral: &[Complex64],
        physical: &mut [f64],
    ) -> Result<(), TransformError> {
        check_len("spectral", self.decomp.spectral_layout().len(), spectral.len())?;
        check_len("physical", self.decomp.physical_layout().len(), physical.len())?;
        self.plan()?.backward(comm, spectral, physical)?;
        self.calls += 1;
        Ok(())
    }
}

impl fmt::Debug for SpectralTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralTransform")
            .field("grid", &self.decomp.grid().sizes())
            .field("rank", &self.decomp.rank())
            .field("planned", &self.is_planned())
            .field("calls", &self.calls)
            .finish()
    }
}

fn check_len(buffer: &'static str, expected: usize, actual: usize) -> Result<(), TransformError> {
    if expected == actual {
        Ok(())
    } else {
        Err(TransformError::ShapeMismatch {
            buffer,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swirl_comm::SoloComm;
    use swirl_domain::GridSpec;

    fn transform(sizes: &[usize]) -> SpectralTransform {
        let lengths = vec![1.0; sizes.len()];
        let grid = GridSpec::new(sizes, &lengths).unwrap();
        SpectralTransform::new(Arc::new(Decomposition::partition(grid, 1, 0).unwrap()))
    }

    #[test]
    fn plans_are_built_on_first_use_only() {
        let mut t = transform(&[4, 6]);
        assert!(!t.is_planned());
        let phys = vec![1.0; 24];
        let mut spec = vec![Complex64::new(0.0, 0.0); 16];
        t.forward(&SoloComm, &phys, &mut spec).unwrap();
        assert!(t.is_planned());
        t.forward(&SoloComm, &phys, &mut spec).unwrap();
        assert_eq!(t.calls(), 2);
        // constant field: only the mean survives, normalized to 1
        assert!((spec[0].re - 1.0).abs() < 1e-14);
        assert!(spec[1..].iter().all(|z| z.norm() < 1e-14));
    }

    #[test]
    fn wrong_buffer_length_is_rejected() {
        let mut t = transform(&[4, 4]);
        let mut spec = vec![Complex64::new(0.0, 0.0); 12];
        let err = t.forward(&SoloComm, &[0.0; 15], &mut spec).unwrap_err();
        assert_eq!(
            err,
            TransformError::ShapeMismatch {
                buffer: "physical",
                expected: 16,
                actual: 15
            }
        );
        assert!(!t.is_planned());
    }

    #[test]
    fn backward_of_mean_is_constant() {
        let mut t = transform(&[4, 4, 4]);
        let mut spec = vec![Complex64::new(0.0, 0.0); 4 * 4 * 3];
        spec[0] = Complex64::new(2.0, 0.0);
        let mut phys = vec![0.0; 64];
        t.backward(&SoloComm, &spec, &mut phys).unwrap();
        assert!(phys.iter().all(|&x| (x - 2.0).abs() < 1e-14));
    }
}
