//! Two-thirds dealiasing mask.

use swirl_core::Complex64;
use swirl_domain::Decomposition;

/// Which local spectral points survive two-thirds truncation.
///
/// A mode is kept iff `|k_a| < N_a / 3` (integer division) on every axis
/// `a`, where `N_a` is the physical point count. Shared read-only by every
/// field of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DealiasMask {
    keep: Vec<bool>,
    retained: usize,
}

impl DealiasMask {
    /// Build the mask over `decomp`'s spectral block.
    pub fn new(decomp: &Decomposition) -> Self {
        let cutoffs: Vec<i64> = decomp
            .grid()
            .sizes()
            .iter()
            .map(|&n| (n / 3) as i64)
            .collect();
        let modes = decomp.modes();
        let keep: Vec<bool> = (0..modes.len())
            .map(|i| {
                modes
                    .wave(i)
                    .iter()
                    .zip(&cutoffs)
                    .all(|(k, &cut)| k.abs() < cut)
            })
            .collect();
        let retained = keep.iter().filter(|&&k| k).count();
        Self { keep, retained }
    }

    /// Whether local mode `i` is kept.
    pub fn is_kept(&self, i: usize) -> bool {
        self.keep[i]
    }

    /// Number of local modes.
    pub fn len(&self) -> usize {
        self.keep.len()
    }

    /// Returns `true` if the local block is empty.
    pub fn is_empty(&self) -> bool {
        self.keep.is_empty()
    }

    /// Number of local modes kept.
    pub fn retained(&self) -> usize {
        self.retained
    }

    /// Copy `src` into `dst`, zeroing truncated modes.
    pub fn apply(&self, src: &[Complex64], dst: &mut [Complex64]) {
        for ((d, s), &keep) in dst.iter_mut().zip(src).zip(&self.keep) {
            *d = if keep { *s } else { Complex64::new(0.0, 0.0) };
        }
    }

    /// Zero truncated modes of `buf` in place.
    pub fn apply_in_place(&self, buf: &mut [Complex64]) {
        for (z, &keep) in buf.iter_mut().zip(&self.keep) {
            if !keep {
                *z = Complex64::new(0.0, 0.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swirl_domain::GridSpec;

    #[test]
    fn keeps_low_modes_only() {
        // N = 9: cutoff 3 keeps |k| <= 2.
        let grid = GridSpec::new(&[9, 9], &[1.0, 1.0]).unwrap();
        let d = Decomposition::partition(grid, 1, 0).unwrap();
        let mask = DealiasMask::new(&d);
        assert_eq!(mask.len(), 9 * 5);
        // axis 0 keeps k in {-2..=2} (5 values), axis 1 keeps {0, 1, 2}
        assert_eq!(mask.retained(), 15);
        let mut buf = vec![Complex64::new(1.0, 1.0); mask.len()];
        mask.apply_in_place(&mut buf);
        let kept = buf.iter().filter(|z| z.re != 0.0).count();
        assert_eq!(kept, 15);
    }

    #[test]
    fn apply_copies_kept_modes() {
        let grid = GridSpec::new(&[6, 6], &[1.0, 1.0]).unwrap();
        let d = Decomposition::partition(grid, 1, 0).unwrap();
        let mask = DealiasMask::new(&d);
        let src: Vec<Complex64> = (0..mask.len()).map(|i| Complex64::new(i as f64, 0.0)).collect();
        let mut dst = vec![Complex64::new(-1.0, 0.0); mask.len()];
        mask.apply(&src, &mut dst);
        for i in 0..mask.len() {
            let expected = if mask.is_kept(i) { src[i] } else { Complex64::new(0.0, 0.0) };
            assert_eq!(dst[i], expected);
        }
        // cutoff 2: only |k| <= 1 on both axes, and only k >= 0 on the last
        assert_eq!(mask.retained(), 3 * 2);
    }
}
