//! Advective step-size control.

/// Largest local value of `Σ_j |u_j| / dx_j` over the points of this
/// rank's physical block.
///
/// `velocity` holds one physical buffer per axis, all the same length. A
/// non-finite value anywhere makes the result `+∞` so that it survives a
/// MAX reduction. An empty block yields `0`.
pub fn local_cfl_max(velocity: &[&[f64]], spacing: &[f64]) -> f64 {
    debug_assert_eq!(velocity.len(), spacing.len());
    let len = velocity.first().map_or(0, |u| u.len());
    let mut max = 0.0_f64;
    for i in 0..len {
        let val: f64 = velocity
            .iter()
            .zip(spacing)
            .map(|(u, dx)| u[i].abs() / dx)
            .sum();
        if !val.is_finite() {
            return f64::INFINITY;
        }
        max = max.max(val);
    }
    max
}

/// Advective step limit `cfl / ndim / max_val`, unbounded for a fluid at
/// rest.
pub fn advective_dt(cfl: f64, ndim: usize, max_val: f64) -> f64 {
    if max_val > 0.0 {
        cfl / ndim as f64 / max_val
    } else {
        f64::INFINITY
    }
}

/// Next step size: the advective limit, but never more than `growth`
/// times the previous step.
pub fn next_dt(prev_dt: f64, growth: f64, cfl: f64, ndim: usize, max_val: f64) -> f64 {
    (growth * prev_dt).min(advective_dt(cfl, ndim, max_val))
}
