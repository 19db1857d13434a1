//! Benchmark profiles for the swirl spectral solver.
//!
//! - [`reference_profile`]: 32³ grid, moderate Reynolds number
//! - [`stress_profile`]: 64³ grid for stress testing
//! - [`load_vortex`]: Taylor–Green initial condition on any rank

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::f64::consts::TAU;

use swirl_core::Quantity;
use swirl_domain::{DecompositionError, GridSpec};
use swirl_engine::{InitError, Simulation, SolverConfig};

/// Reference profile: 32³ points on `[0, 2π)³`, `Re = 400`, `Sc = 1`.
pub fn reference_profile() -> Result<(GridSpec, SolverConfig), DecompositionError> {
    Ok((GridSpec::cube(3, 32)?, SolverConfig::new(400.0, 1.0)))
}

/// Stress profile: 64³ points, eight times the reference point count.
pub fn stress_profile() -> Result<(GridSpec, SolverConfig), DecompositionError> {
    Ok((GridSpec::cube(3, 64)?, SolverConfig::new(1600.0, 1.0)))
}

/// Load a unit-amplitude Taylor–Green vortex into the velocity of `sim`
/// and a smooth bump into the scalar. Collective.
pub fn load_vortex(sim: &mut Simulation) -> Result<(), InitError> {
    let decomp = std::sync::Arc::clone(sim.decomposition());
    let grid = decomp.grid();
    let layout = decomp.physical_layout();
    let ndim = grid.ndim();
    let mut values = vec![Vec::with_capacity(layout.len()); ndim + 1];
    layout.for_each_point(|g| {
        let p: Vec<f64> = (0..ndim)
            .map(|a| TAU * g[a] as f64 / grid.sizes()[a] as f64)
            .collect();
        let tail: f64 = p[2..].iter().map(|z| z.cos()).product();
        values[0].push(p[0].sin() * p[1].cos() * tail);
        values[1].push(-p[0].cos() * p[1].sin() * tail);
        for v in values.iter_mut().take(ndim).skip(2) {
            v.push(0.0);
        }
        values[ndim].push((p.iter().map(|x| x.cos()).sum::<f64>()).exp());
    });
    for (q, v) in Quantity::all(ndim).into_iter().zip(&values) {
        sim.load_physical(q, v)?;
    }
    Ok(())
}
