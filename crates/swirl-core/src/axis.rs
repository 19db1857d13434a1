//! Per-axis containers and representation tags.

use smallvec::SmallVec;
use std::fmt;

/// Smallest supported number of spatial axes.
pub const MIN_AXES: usize = 2;

/// Largest supported number of spatial axes.
pub const MAX_AXES: usize = 3;

/// A per-axis vector. Inline for every supported dimensionality.
pub type AxisVec<T> = SmallVec<[T; MAX_AXES]>;

/// Whether a buffer holds grid-point values or Fourier coefficients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Representation {
    /// Real values on the physical grid.
    Physical,
    /// Complex Fourier coefficients; the last axis is halved by
    /// real-input symmetry.
    Spectral,
}

impl Representation {
    /// Both representations, physical first.
    pub const ALL: [Representation; 2] = [Representation::Physical, Representation::Spectral];
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Physical => write!(f, "physical"),
            Self::Spectral => write!(f, "spectral"),
        }
    }
}
