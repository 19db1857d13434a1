//! Criterion benchmarks for full time steps and the step kernels.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use swirl_bench::{load_vortex, reference_profile};
use swirl_comm::SoloComm;
use swirl_core::Complex64;
use swirl_domain::{Decomposition, GridSpec};
use swirl_engine::projection::project;
use swirl_engine::Simulation;

/// Benchmark: one RK4 step of the reference profile on one rank.
fn bench_step_reference(c: &mut Criterion) {
    let (grid, config) = reference_profile().unwrap();
    let mut sim = Simulation::with_config(grid, config, SoloComm).unwrap();
    load_vortex(&mut sim).unwrap();

    c.bench_function("step_reference_32", |b| {
        b.iter(|| {
            let report = sim.step().unwrap();
            black_box(report.dt);
        });
    });
}

/// Benchmark: one diagnostics pass of the reference profile.
fn bench_diagnostics_reference(c: &mut Criterion) {
    let (grid, config) = reference_profile().unwrap();
    let mut sim = Simulation::with_config(grid, config, SoloComm).unwrap();
    load_vortex(&mut sim).unwrap();

    c.bench_function("diagnostics_reference_32", |b| {
        b.iter(|| {
            let d = sim.diagnostics().unwrap();
            black_box(d.kinetic_energy);
        });
    });
}

/// Benchmark: projection of three velocity slopes on a 64³ spectral block.
fn bench_projection_64(c: &mut Criterion) {
    let decomp = Decomposition::partition(GridSpec::cube(3, 64).unwrap(), 1, 0).unwrap();
    let modes = decomp.modes();
    let len = modes.len();
    let mut slopes: Vec<Vec<Complex64>> = (0..3)
        .map(|a| {
            (0..len)
                .map(|i| Complex64::new((i % 7) as f64 - 3.0, a as f64))
                .collect()
        })
        .collect();

    c.bench_function("projection_64", |b| {
        b.iter(|| {
            let mut views: Vec<&mut [Complex64]> =
                slopes.iter_mut().map(|s| s.as_mut_slice()).collect();
            project(&mut views, modes);
            black_box(&views);
        });
    });
}

criterion_group!(
    benches,
    bench_step_reference,
    bench_diagnostics_reference,
    bench_projection_64
);
criterion_main!(benches);
