use proptest::prelude::*;
use swirl_core::Representation;
use swirl_domain::{wavenumber, Decomposition, GridSpec, ProcessGrid};

fn arb_grid() -> impl Strategy<Value = GridSpec> {
    prop::collection::vec(2usize..12, 2..=3).prop_map(|sizes| {
        let lengths = vec![1.0; sizes.len()];
        GridSpec::new(&sizes, &lengths).unwrap()
    })
}

/// Count how often each global point is covered by some rank's block.
fn coverage(grid: &GridSpec, nprocs: usize, pencil: usize, repr: Representation) -> Vec<usize> {
    let sizes = grid.sizes_in(repr);
    let total: usize = sizes.iter().product();
    let mut hits = vec![0usize; total];
    for rank in 0..nprocs {
        let d = Decomposition::partition(grid.clone(), nprocs, rank).unwrap();
        d.layout(pencil, repr).for_each_point(|g| {
            let flat = g.iter().zip(&sizes).fold(0, |acc, (&i, &n)| acc * n + i);
            hits[flat] += 1;
        });
    }
    hits
}

proptest! {
    #[test]
    fn local_blocks_tile_every_layout(grid in arb_grid(), nprocs in 1usize..9) {
        prop_assume!(ProcessGrid::auto(&grid, nprocs).is_ok());
        for pencil in 0..grid.ndim() {
            for repr in Representation::ALL {
                let hits = coverage(&grid, nprocs, pencil, repr);
                prop_assert!(hits.iter().all(|&h| h == 1), "pencil {} {}", pencil, repr);
            }
        }
    }

    #[test]
    fn exactly_one_axis_is_whole(grid in arb_grid(), nprocs in 1usize..9, rank_seed in 0usize..64) {
        prop_assume!(ProcessGrid::auto(&grid, nprocs).is_ok());
        let rank = rank_seed % nprocs;
        let d = Decomposition::partition(grid.clone(), nprocs, rank).unwrap();
        for pencil in 0..grid.ndim() {
            let l = d.layout(pencil, Representation::Spectral);
            let (size, offset) = l.local_extent(pencil);
            prop_assert_eq!(size, grid.size(pencil, Representation::Spectral));
            prop_assert_eq!(offset, 0);
            prop_assert!(l.len() > 0);
        }
    }

    #[test]
    fn local_wavenumbers_match_global_sequence(
        grid in arb_grid(),
        nprocs in 1usize..9,
        rank_seed in 0usize..64,
    ) {
        prop_assume!(ProcessGrid::auto(&grid, nprocs).is_ok());
        let rank = rank_seed % nprocs;
        let d = Decomposition::partition(grid.clone(), nprocs, rank).unwrap();
        for axis in 0..grid.ndim() {
            let (local, offset) = d.spectral_layout().local_extent(axis);
            let n = grid.sizes()[axis];
            let expected: Vec<i64> = (offset..offset + local).map(|i| wavenumber(i, n)).collect();
            prop_assert_eq!(d.wavenumbers(axis), expected.as_slice());
        }
    }
}

#[test]
fn even_axis_sequence_is_centered() {
    let grid = GridSpec::new(&[6, 10], &[1.0, 1.0]).unwrap();
    let mut all = Vec::new();
    for rank in 0..3 {
        let d = Decomposition::partition(grid.clone(), 3, rank).unwrap();
        all.extend_from_slice(d.wavenumbers(1));
    }
    assert_eq!(all, vec![0, 1, 2, 3, 4, -5]);
    let d = Decomposition::partition(grid, 3, 0).unwrap();
    assert_eq!(d.wavenumbers(0), &[0, 1, 2, -3, -2, -1]);
}
