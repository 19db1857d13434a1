//! Spectral projection onto divergence-free fields.

use swirl_core::Complex64;
use swirl_domain::ModeTable;

/// Remove the component of the velocity slopes parallel to the wave
/// vector at every nonzero mode: `s_i -= k_i (k · s) / |k|²`.
///
/// `slopes[i]` is the slope of velocity component `i`, indexed like
/// `modes`. The mean mode is left untouched.
pub fn project(slopes: &mut [&mut [Complex64]], modes: &ModeTable) {
    let ndim = slopes.len();
    debug_assert_eq!(ndim, modes.ndim());
    for m in 0..modes.len() {
        let k2 = modes.k2(m);
        if k2 == 0.0 {
            continue;
        }
        let k = modes.freq(m);
        let mut dot = Complex64::new(0.0, 0.0);
        for (s, &kj) in slopes.iter().zip(k) {
            dot += s[m] * kj;
        }
        let scale = dot / k2;
        for (s, &ki) in slopes.iter_mut().zip(k) {
            s[m] -= scale * ki;
        }
    }
}

/// Largest `|k · v|` over this rank's modes, with `v` one spectral
/// buffer per velocity component.
pub fn max_divergence(velocity: &[&[Complex64]], modes: &ModeTable) -> f64 {
    let mut max = 0.0_f64;
    for m in 0..modes.len() {
        let k = modes.freq(m);
        let mut div = Complex64::new(0.0, 0.0);
        for (v, &kj) in velocity.iter().zip(k) {
            div += v[m] * kj;
        }
        max = max.max(div.norm());
    }
    max
}
