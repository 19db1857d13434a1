//! Scratch buffers for nonlinear-term evaluation.

use swirl_core::{zeroed, AllocationError, Complex64};
use swirl_domain::Decomposition;

/// Per-rank scratch reused by every stage of every step.
///
/// Allocated once, owned by the integrator, never shared.
#[derive(Clone, Debug)]
pub struct Workspace {
    /// Physical product `u_j · q`, or a reconstructed field.
    pub product: Vec<f64>,
    /// Spectral transform of [`product`](Self::product).
    pub product_hat: Vec<Complex64>,
    /// Masked copy of a spectral state before inverse transform.
    pub masked: Vec<Complex64>,
    /// Accumulated advective term of one quantity.
    pub advection: Vec<Complex64>,
}

impl Workspace {
    /// Allocate scratch sized from `decomp`.
    pub fn allocate(decomp: &Decomposition) -> Result<Self, AllocationError> {
        let spectral = decomp.spectral_layout().len();
        Ok(Self {
            product: zeroed("product scratch", decomp.physical_layout().len())?,
            product_hat: zeroed("product spectrum scratch", spectral)?,
            masked: zeroed("mask scratch", spectral)?,
            advection: zeroed("advection scratch", spectral)?,
        })
    }

    /// Total scratch memory in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.product.len() * std::mem::size_of::<f64>()
            + (self.product_hat.len() + self.masked.len() + self.advection.len())
                * std::mem::size_of::<Complex64>()
    }
}
