//! One transported quantity's buffers.

use swirl_core::{zeroed, AllocationError, Complex64, Quantity};

use crate::FieldError;

/// Buffers of one transported quantity on one rank.
#[derive(Clone, Debug)]
pub struct Field {
    quantity: Quantity,
    diffusivity: f64,
    state: Vec<Complex64>,
    staged: Vec<Complex64>,
    slopes: Vec<Vec<Complex64>>,
    physical: Vec<f64>,
    step_open: bool,
}

/// Split borrow used to compose the next staged state.
pub struct StageParts<'a> {
    /// Committed state at the start of the step.
    pub state: &'a [Complex64],
    /// Slopes of every stage.
    pub slopes: &'a [Vec<Complex64>],
    /// Destination for the composed stage.
    pub staged: &'a mut [Complex64],
}

impl Field {
    /// Allocate zeroed buffers: two spectral states and `stages` slopes of
    /// `spectral_len` elements, and a physical buffer of `physical_len`.
    pub fn allocate(
        quantity: Quantity,
        diffusivity: f64,
        spectral_len: usize,
        physical_len: usize,
        stages: usize,
    ) -> Result<Self, AllocationError> {
        let slopes = (0..stages)
            .map(|_| zeroed("slope", spectral_len))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            quantity,
            diffusivity,
            state: zeroed("spectral state", spectral_len)?,
            staged: zeroed("staged state", spectral_len)?,
            slopes,
            physical: zeroed("physical buffer", physical_len)?,
            step_open: false,
        })
    }

    /// Which quantity this field carries.
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Diffusion coefficient.
    pub fn diffusivity(&self) -> f64 {
        self.diffusivity
    }

    /// Committed spectral state.
    pub fn state(&self) -> &[Complex64] {
        &self.state
    }

    /// Mutable committed state, for initial conditions and restarts.
    pub fn state_mut(&mut self) -> &mut [Complex64] {
        &mut self.state
    }

    /// The spectral buffer the current stage reads: the staged state while
    /// a step is open, the committed state otherwise.
    pub fn active(&self) -> &[Complex64] {
        if self.step_open {
            &self.staged
        } else {
            &self.state
        }
    }

    /// Slope of stage `k`.
    pub fn slope(&self, k: usize) -> &[Complex64] {
        &self.slopes[k]
    }

    /// Mutable slope of stage `k`.
    pub fn slope_mut(&mut self, k: usize) -> &mut [Complex64] {
        &mut self.slopes[k]
    }

    /// Number of slope buffers.
    pub fn stages(&self) -> usize {
        self.slopes.len()
    }

    /// Physical-space buffer.
    pub fn physical(&self) -> &[f64] {
        &self.physical
    }

    /// Mutable physical-space buffer.
    pub fn physical_mut(&mut self) -> &mut [f64] {
        &mut self.physical
    }

    /// Whether a step is open.
    pub fn is_step_open(&self) -> bool {
        self.step_open
    }

    /// Open a step: the staged buffer starts as a copy of the committed
    /// state.
    pub fn begin_step(&mut self) {
        self.staged.copy_from_slice(&self.state);
        self.step_open = true;
    }

    /// Borrow the committed state and slopes alongside the staged buffer.
    pub fn stage_parts(&mut self) -> StageParts<'_> {
        StageParts {
            state: &self.state,
            slopes: &self.slopes,
            staged: &mut self.staged,
        }
    }

    /// Close the step: the staged buffer becomes the committed state. The
    /// old committed buffer is kept only as storage for the next step.
    pub fn promote(&mut self) -> Result<(), FieldError> {
        if !self.step_open {
            return Err(FieldError::StepNotOpen);
        }
        std::mem::swap(&mut self.state, &mut self.staged);
        self.step_open = false;
        Ok(())
    }
}
