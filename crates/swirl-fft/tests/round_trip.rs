use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;
use swirl_core::{Communicator, Complex64};
use swirl_domain::{Decomposition, GridSpec, ProcessGrid};
use swirl_fft::SpectralTransform;
use swirl_test_utils::fixtures::scramble;
use swirl_test_utils::run_ranks;

const TOL: f64 = 1e-11;

/// Forward then backward on every rank; returns the worst pointwise error.
fn round_trip_error(sizes: &[usize], nprocs: usize, request: Option<&[usize]>) -> f64 {
    let lengths = vec![1.0; sizes.len()];
    let grid = GridSpec::new(sizes, &lengths).unwrap();
    let errors = run_ranks(nprocs, |comm| {
        let decomp = match request {
            Some(r) => Decomposition::partition_with(grid.clone(), nprocs, comm.rank(), r),
            None => Decomposition::partition(grid.clone(), nprocs, comm.rank()),
        }
        .unwrap();
        let decomp = Arc::new(decomp);
        let original = scramble(&grid, decomp.physical_layout(), 7);
        let mut spectral = vec![Complex64::new(0.0, 0.0); decomp.spectral_layout().len()];
        let mut back = vec![0.0; original.len()];
        let mut t = SpectralTransform::new(Arc::clone(&decomp));
        t.forward(&comm, &original, &mut spectral).unwrap();
        t.backward(&comm, &spectral, &mut back).unwrap();
        original
            .iter()
            .zip(&back)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    });
    errors.into_iter().fold(0.0, f64::max)
}

#[test]
fn round_trip_2d_across_process_counts() {
    for nprocs in [1, 2, 3, 4] {
        let err = round_trip_error(&[12, 8], nprocs, None);
        assert!(err < TOL, "nprocs {nprocs}: {err}");
    }
    assert!(round_trip_error(&[9, 7], 3, None) < TOL);
}

#[test]
fn round_trip_3d_across_process_grids() {
    let cases: [(&[usize], usize, &[usize]); 6] = [
        (&[8, 8, 8], 1, &[1, 1]),
        (&[8, 8, 8], 4, &[2, 2]),
        (&[8, 8, 8], 4, &[4, 1]),
        (&[8, 8, 8], 4, &[1, 4]),
        (&[6, 10, 12], 6, &[3, 2]),
        (&[5, 6, 7], 6, &[2, 3]),
    ];
    for (sizes, nprocs, dims) in cases {
        let err = round_trip_error(sizes, nprocs, Some(dims));
        assert!(err < TOL, "{sizes:?} on {dims:?}: {err}");
    }
}

/// The spectrum must not depend on how the grid is decomposed.
#[test]
fn spectrum_is_decomposition_independent() {
    let grid = GridSpec::new(&[8, 6, 8], &[1.0, 2.0, 3.0]).unwrap();
    let collect = |nprocs: usize| -> HashMap<Vec<i64>, Complex64> {
        run_ranks(nprocs, |comm| {
            let decomp = Arc::new(Decomposition::partition(grid.clone(), nprocs, comm.rank()).unwrap());
            let phys = scramble(&grid, decomp.physical_layout(), 3);
            let mut spec = vec![Complex64::new(0.0, 0.0); decomp.spectral_layout().len()];
            SpectralTransform::new(Arc::clone(&decomp))
                .forward(&comm, &phys, &mut spec)
                .unwrap();
            (0..spec.len())
                .map(|i| (decomp.modes().wave(i).to_vec(), spec[i]))
                .collect::<Vec<_>>()
        })
        .into_iter()
        .flatten()
        .collect()
    };
    let solo = collect(1);
    let split = collect(4);
    assert_eq!(solo.len(), split.len());
    for (k, z) in &solo {
        assert!((split[k] - z).norm() < 1e-12, "mode {k:?}");
    }
}

#[test]
fn forward_matches_analytic_coefficients() {
    // f = 3 + sin(2π·2x/Lx) · cos(2π·y/Ly) on a 2-rank 16×8 grid.
    let grid = GridSpec::new(&[16, 8], &[2.0, 1.0]).unwrap();
    let results = run_ranks(2, |comm| {
        let decomp = Arc::new(Decomposition::partition(grid.clone(), 2, comm.rank()).unwrap());
        let phys = swirl_test_utils::fixtures::sample(&grid, decomp.physical_layout(), |x| {
            3.0 + (std::f64::consts::TAU * 2.0 * x[0] / 2.0).sin()
                * (std::f64::consts::TAU * x[1]).cos()
        });
        let mut spec = vec![Complex64::new(0.0, 0.0); decomp.spectral_layout().len()];
        SpectralTransform::new(Arc::clone(&decomp))
            .forward(&comm, &phys, &mut spec)
            .unwrap();
        (0..spec.len())
            .map(|i| (decomp.modes().wave(i).to_vec(), spec[i]))
            .collect::<Vec<_>>()
    });
    for (k, z) in results.into_iter().flatten() {
        // sin(a)cos(b) = (e^{ia} - e^{-ia})/(2i) · (e^{ib} + e^{-ib})/2
        let expected = match (k[0], k[1]) {
            (0, 0) => Complex64::new(3.0, 0.0),
            (2, 1) | (2, -1) => Complex64::new(0.0, -0.25),
            (-2, 1) | (-2, -1) => Complex64::new(0.0, 0.25),
            _ => Complex64::new(0.0, 0.0),
        };
        assert!((z - expected).norm() < 1e-12, "mode {k:?}: {z}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn round_trip_holds_for_random_grids(
        sizes in prop::collection::vec(2usize..12, 2..=3),
        nprocs in 1usize..=4,
    ) {
        let lengths = vec![1.0; sizes.len()];
        let grid = GridSpec::new(&sizes, &lengths).unwrap();
        prop_assume!(ProcessGrid::auto(&grid, nprocs).is_ok());
        let err = round_trip_error(&sizes, nprocs, None);
        prop_assert!(err < TOL, "{:?} on {} ranks: {}", sizes, nprocs, err);
    }
}
