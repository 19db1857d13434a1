//! The global grid specification.

use smallvec::SmallVec;
use swirl_core::{AxisVec, Representation, MAX_AXES, MIN_AXES};

use crate::DecompositionError;

/// Global point counts and physical lengths of a periodic grid.
///
/// Immutable once constructed. Every axis is periodic.
#[derive(Clone, Debug, PartialEq)]
pub struct GridSpec {
    sizes: AxisVec<usize>,
    lengths: AxisVec<f64>,
}

impl GridSpec {
    /// Validate and build a periodic grid.
    pub fn new(sizes: &[usize], lengths: &[f64]) -> Result<Self, DecompositionError> {
        let ndim = sizes.len();
        if !(MIN_AXES..=MAX_AXES).contains(&ndim) {
            return Err(DecompositionError::UnsupportedAxisCount { ndim });
        }
        if lengths.len() != ndim {
            return Err(DecompositionError::AxisCountMismatch {
                sizes: ndim,
                other: lengths.len(),
            });
        }
        for (axis, &size) in sizes.iter().enumerate() {
            match size {
                0 => return Err(DecompositionError::EmptyAxis { axis }),
                1 => return Err(DecompositionError::AxisTooSmall { axis, size }),
                _ => {}
            }
        }
        for (axis, &length) in lengths.iter().enumerate() {
            if !length.is_finite() || length <= 0.0 {
                return Err(DecompositionError::InvalidLength { axis, length });
            }
        }
        Ok(Self {
            sizes: SmallVec::from_slice(sizes),
            lengths: SmallVec::from_slice(lengths),
        })
    }

    /// Like [`new`](Self::new), with explicit per-axis periodicity flags.
    /// Any non-periodic axis is rejected.
    pub fn with_periodicity(
        sizes: &[usize],
        lengths: &[f64],
        periodic: &[bool],
    ) -> Result<Self, DecompositionError> {
        if periodic.len() != sizes.len() {
            return Err(DecompositionError::AxisCountMismatch {
                sizes: sizes.len(),
                other: periodic.len(),
            });
        }
        if let Some(axis) = periodic.iter().position(|p| !p) {
            return Err(DecompositionError::NonPeriodicAxis { axis });
        }
        Self::new(sizes, lengths)
    }

    /// A grid of `n` points per axis on `[0, 2π)`.
    pub fn cube(ndim: usize, n: usize) -> Result<Self, DecompositionError> {
        let sizes = vec![n; ndim];
        let lengths = vec![std::f64::consts::TAU; ndim];
        Self::new(&sizes, &lengths)
    }

    /// Number of spatial axes.
    pub fn ndim(&self) -> usize {
        self.sizes.len()
    }

    /// Physical point counts per axis.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Physical lengths per axis.
    pub fn lengths(&self) -> &[f64] {
        &self.lengths
    }

    /// Global point count of `axis` in the given representation.
    pub fn size(&self, axis: usize, repr: Representation) -> usize {
        let n = self.sizes[axis];
        match repr {
            Representation::Spectral if axis + 1 == self.ndim() => n / 2 + 1,
            _ => n,
        }
    }

    /// Global point counts of every axis in the given representation.
    pub fn sizes_in(&self, repr: Representation) -> AxisVec<usize> {
        (0..self.ndim()).map(|a| self.size(a, repr)).collect()
    }

    /// Grid spacing `L / N` of `axis`.
    pub fn spacing(&self, axis: usize) -> f64 {
        self.lengths[axis] / self.sizes[axis] as f64
    }

    /// Volume of one grid cell.
    pub fn cell_volume(&self) -> f64 {
        (0..self.ndim()).map(|a| self.spacing(a)).product()
    }

    /// Total number of physical grid points.
    pub fn point_count(&self) -> usize {
        self.sizes.iter().product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectral_last_axis_is_halved() {
        let g = GridSpec::new(&[8, 6, 10], &[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(g.sizes_in(Representation::Spectral).as_slice(), &[8, 6, 6]);
        assert_eq!(g.sizes_in(Representation::Physical).as_slice(), &[8, 6, 10]);
        let g = GridSpec::new(&[8, 7], &[1.0, 1.0]).unwrap();
        assert_eq!(g.size(1, Representation::Spectral), 4);
    }

    #[test]
    fn spacing_and_volume() {
        let g = GridSpec::new(&[4, 8], &[2.0, 4.0]).unwrap();
        assert_eq!(g.spacing(0), 0.5);
        assert_eq!(g.spacing(1), 0.5);
        assert_eq!(g.cell_volume(), 0.25);
        assert_eq!(g.point_count(), 32);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert_eq!(
            GridSpec::new(&[8], &[1.0]),
            Err(DecompositionError::UnsupportedAxisCount { ndim: 1 })
        );
        assert_eq!(
            GridSpec::new(&[8, 0], &[1.0, 1.0]),
            Err(DecompositionError::EmptyAxis { axis: 1 })
        );
        assert_eq!(
            GridSpec::new(&[1, 8], &[1.0, 1.0]),
            Err(DecompositionError::AxisTooSmall { axis: 0, size: 1 })
        );
        assert!(matches!(
            GridSpec::new(&[8, 8], &[1.0, f64::NAN]),
            Err(DecompositionError::InvalidLength { axis: 1, .. })
        ));
        assert_eq!(
            GridSpec::with_periodicity(&[8, 8], &[1.0, 1.0], &[true, false]),
            Err(DecompositionError::NonPeriodicAxis { axis: 1 })
        );
    }
}
