//! Wavenumber and angular-frequency tables.

use std::f64::consts::TAU;

use crate::PencilLayout;

/// Signed wavenumber of global index `i` on an axis of `n` points:
/// `0, 1, ..., N/2 - 1, -N/2, ..., -1` for even `N`. For odd `N` the
/// sequence is symmetric: `0, ..., N/2, -N/2, ..., -1`.
pub fn wavenumber(i: usize, n: usize) -> i64 {
    if i < n.div_ceil(2) {
        i as i64
    } else {
        i as i64 - n as i64
    }
}

/// Wavenumbers and angular frequencies of one axis over a local range.
#[derive(Clone, Debug, PartialEq)]
pub struct WavenumberTable {
    waves: Vec<i64>,
    freqs: Vec<f64>,
}

impl WavenumberTable {
    /// Table for `local` points starting at global index `offset` on an
    /// axis of `n` physical points and physical length `length`.
    pub fn new(n: usize, length: f64, offset: usize, local: usize) -> Self {
        let waves: Vec<i64> = (offset..offset + local).map(|i| wavenumber(i, n)).collect();
        let freqs = waves.iter().map(|&k| TAU / length * k as f64).collect();
        Self { waves, freqs }
    }

    /// Integer wavenumbers.
    pub fn waves(&self) -> &[i64] {
        &self.waves
    }

    /// Angular frequencies `2π k / L`.
    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }
}

/// Per-mode wave vectors over a local spectral block, in memory order.
///
/// Built once from the spectral layout; the integrator, mask and
/// diagnostics all index it with the same linear index as the spectral
/// buffers.
#[derive(Clone, Debug)]
pub struct ModeTable {
    ndim: usize,
    waves: Vec<i64>,
    freqs: Vec<f64>,
    k2: Vec<f64>,
}

impl ModeTable {
    /// Expand per-axis tables over every point of `layout`.
    pub fn new(layout: &PencilLayout, tables: &[WavenumberTable]) -> Self {
        let ndim = layout.ndim();
        let n = layout.len();
        let mut waves = Vec::with_capacity(n * ndim);
        let mut freqs = Vec::with_capacity(n * ndim);
        let mut k2 = Vec::with_capacity(n);
        let offsets: Vec<usize> = (0..ndim).map(|a| layout.local_extent(a).1).collect();
        layout.for_each_point(|g| {
            let mut sum = 0.0;
            for (axis, table) in tables.iter().enumerate() {
                let local = g[axis] - offsets[axis];
                let f = table.freqs[local];
                waves.push(table.waves[local]);
                freqs.push(f);
                sum += f * f;
            }
            k2.push(sum);
        });
        Self {
            ndim,
            waves,
            freqs,
            k2,
        }
    }

    /// Number of modes.
    pub fn len(&self) -> usize {
        self.k2.len()
    }

    /// Returns `true` if the local block is empty.
    pub fn is_empty(&self) -> bool {
        self.k2.is_empty()
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Integer wave vector of mode `i`.
    pub fn wave(&self, i: usize) -> &[i64] {
        &self.waves[i * self.ndim..(i + 1) * self.ndim]
    }

    /// Angular wave vector of mode `i`.
    pub fn freq(&self, i: usize) -> &[f64] {
        &self.freqs[i * self.ndim..(i + 1) * self.ndim]
    }

    /// Squared angular wavenumber `|k|²` of mode `i`.
    pub fn k2(&self, i: usize) -> f64 {
        self.k2[i]
    }

    /// All squared wavenumbers in memory order.
    pub fn k2_all(&self) -> &[f64] {
        &self.k2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_convention() {
        let even: Vec<i64> = (0..8).map(|i| wavenumber(i, 8)).collect();
        assert_eq!(even, vec![0, 1, 2, 3, -4, -3, -2, -1]);
        let odd: Vec<i64> = (0..5).map(|i| wavenumber(i, 5)).collect();
        assert_eq!(odd, vec![0, 1, 2, -2, -1]);
    }

    #[test]
    fn truncated_axis_ends_at_nyquist() {
        let t = WavenumberTable::new(8, TAU, 0, 5);
        assert_eq!(t.waves(), &[0, 1, 2, 3, -4]);
    }

    #[test]
    fn freqs_scale_with_length() {
        let t = WavenumberTable::new(4, 2.0, 2, 2);
        assert_eq!(t.waves(), &[-2, -1]);
        assert!((t.freqs()[0] + 2.0 * std::f64::consts::PI).abs() < 1e-12);
        assert!((t.freqs()[1] + std::f64::consts::PI).abs() < 1e-12);
    }
}
