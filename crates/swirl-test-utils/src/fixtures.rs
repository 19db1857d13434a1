//! Analytic fields sampled onto a rank's local block.
//!
//! - [`sample`]: evaluate any closure of the physical coordinates.
//! - [`taylor_green`]: the divergence-free Taylor–Green vortex.
//! - [`scramble`]: deterministic pseudo-random values keyed by global
//!   index, identical for every process-grid shape.

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use swirl_domain::{GridSpec, PencilLayout};

/// Evaluate `f(x)` at every point of `layout`, in memory order, where
/// `x[a] = i[a] * L[a] / N[a]`.
pub fn sample(grid: &GridSpec, layout: &PencilLayout, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(layout.len());
    let mut x = vec![0.0; grid.ndim()];
    layout.for_each_point(|g| {
        for (a, xa) in x.iter_mut().enumerate() {
            *xa = g[a] as f64 * grid.spacing(a);
        }
        out.push(f(&x));
    });
    out
}

/// Taylor–Green vortex velocity component `axis` with unit wavenumber on
/// each axis, scaled by `amplitude`.
///
/// In 2-D: `u = A sin x cos y`, `v = -A cos x sin y`.
/// In 3-D: `u = A sin x cos y cos z`, `v = -A cos x sin y cos z`, `w = 0`.
/// Coordinates are scaled to the domain, `x -> 2π x / L`.
pub fn taylor_green(grid: &GridSpec, layout: &PencilLayout, axis: usize, amplitude: f64) -> Vec<f64> {
    let lengths = grid.lengths().to_vec();
    sample(grid, layout, |x| {
        let p: Vec<f64> = x.iter().zip(&lengths).map(|(xi, l)| TAU * xi / l).collect();
        let tail: f64 = p[2..].iter().map(|z| z.cos()).product();
        amplitude
            * tail
            * match axis {
                0 => p[0].sin() * p[1].cos(),
                1 => -p[0].cos() * p[1].sin(),
                _ => 0.0,
            }
    })
}

/// Deterministic values in `[-1, 1)` keyed by global point index, so the
/// same global field results whatever the decomposition.
pub fn scramble(grid: &GridSpec, layout: &PencilLayout, seed: u64) -> Vec<f64> {
    let sizes = grid.sizes().to_vec();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(layout.len());
    layout.for_each_point(|g| {
        let flat = g.iter().zip(&sizes).fold(0u128, |acc, (&i, &n)| acc * n as u128 + i as u128);
        // Two 32-bit words per point, so the value depends only on the
        // global index.
        rng.set_word_pos(2 * flat);
        out.push(rng.random_range(-1.0..1.0));
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use swirl_domain::Decomposition;

    #[test]
    fn scramble_is_keyed_by_global_index() {
        let grid = GridSpec::new(&[6, 5, 4], &[1.0, 1.0, 1.0]).unwrap();
        let whole = Decomposition::partition(grid.clone(), 1, 0).unwrap();
        let full = scramble(&grid, whole.physical_layout(), 9);
        assert!(full.iter().all(|v| (-1.0..1.0).contains(v)));
        for rank in 0..4 {
            let d = Decomposition::partition(grid.clone(), 4, rank).unwrap();
            let part = scramble(&grid, d.physical_layout(), 9);
            let mut i = 0;
            d.physical_layout().for_each_point(|g| {
                assert_eq!(part[i], full[whole.physical_layout().offset_of(g)]);
                i += 1;
            });
        }
    }

    #[test]
    fn seeds_give_different_fields() {
        let grid = GridSpec::cube(2, 8).unwrap();
        let d = Decomposition::partition(grid.clone(), 1, 0).unwrap();
        let a = scramble(&grid, d.physical_layout(), 1);
        let b = scramble(&grid, d.physical_layout(), 2);
        assert_eq!(a, scramble(&grid, d.physical_layout(), 1));
        assert_ne!(a, b);
    }
}
