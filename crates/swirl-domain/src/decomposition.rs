//! Partitioning a grid across a process group.

use swirl_core::{AxisVec, Representation};

use crate::{DecompositionError, GridSpec, ModeTable, PencilLayout, ProcessGrid, WavenumberTable};

/// One rank's view of the decomposed grid: its layout for every pencil
/// and representation, and the wavenumber tables of its spectral block.
#[derive(Clone, Debug)]
pub struct Decomposition {
    grid: GridSpec,
    procs: ProcessGrid,
    rank: usize,
    coords: AxisVec<usize>,
    // Indexed by `pencil * 2 + representation`.
    layouts: Vec<PencilLayout>,
    tables: Vec<WavenumberTable>,
    modes: ModeTable,
}

impl Decomposition {
    /// Partition `grid` over `nprocs` ranks with an automatically chosen
    /// process grid, as seen from `rank`.
    pub fn partition(
        grid: GridSpec,
        nprocs: usize,
        rank: usize,
    ) -> Result<Self, DecompositionError> {
        let procs = ProcessGrid::auto(&grid, nprocs)?;
        Self::with_process_grid(grid, procs, rank)
    }

    /// Partition with an explicit process-grid request (`0` entries are
    /// chosen automatically).
    pub fn partition_with(
        grid: GridSpec,
        nprocs: usize,
        rank: usize,
        request: &[usize],
    ) -> Result<Self, DecompositionError> {
        let procs = ProcessGrid::with_request(&grid, nprocs, request)?;
        Self::with_process_grid(grid, procs, rank)
    }

    fn with_process_grid(
        grid: GridSpec,
        procs: ProcessGrid,
        rank: usize,
    ) -> Result<Self, DecompositionError> {
        let nprocs = procs.nprocs();
        if rank >= nprocs {
            return Err(DecompositionError::RankOutOfRange { rank, nprocs });
        }
        let coords = procs.coords(rank);
        let layouts: Vec<PencilLayout> = (0..grid.ndim())
            .flat_map(|p| {
                Representation::ALL
                    .map(|repr| PencilLayout::new(&grid, &procs, &coords, p, repr))
            })
            .collect();

        let spectral = &layouts[layout_slot(0, Representation::Spectral)];
        let tables: Vec<WavenumberTable> = (0..grid.ndim())
            .map(|axis| {
                let (local, offset) = spectral.local_extent(axis);
                WavenumberTable::new(grid.sizes()[axis], grid.lengths()[axis], offset, local)
            })
            .collect();
        let modes = ModeTable::new(spectral, &tables);

        if rank == 0 {
            log::info!(
                "decomposed grid {:?} over {} ranks as process grid {:?}",
                grid.sizes(),
                nprocs,
                procs.dims()
            );
        }
        Ok(Self {
            grid,
            procs,
            rank,
            coords,
            layouts,
            tables,
            modes,
        })
    }

    /// The global grid.
    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// The process grid.
    pub fn process_grid(&self) -> &ProcessGrid {
        &self.procs
    }

    /// This rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Group size.
    pub fn nprocs(&self) -> usize {
        self.procs.nprocs()
    }

    /// Number of spatial axes.
    pub fn ndim(&self) -> usize {
        self.grid.ndim()
    }

    /// This rank's process-grid coordinates.
    pub fn coords(&self) -> &[usize] {
        &self.coords
    }

    /// This rank's layout of `pencil` in `repr`.
    ///
    /// # Panics
    ///
    /// Panics if `pencil >= ndim()`.
    pub fn layout(&self, pencil: usize, repr: Representation) -> &PencilLayout {
        &self.layouts[layout_slot(pencil, repr)]
    }

    /// Another rank's layout of `pencil` in `repr`.
    pub fn layout_of(&self, rank: usize, pencil: usize, repr: Representation) -> PencilLayout {
        PencilLayout::new(&self.grid, &self.procs, &self.procs.coords(rank), pencil, repr)
    }

    /// Layout of the spectral state: pencil 0, spectral.
    pub fn spectral_layout(&self) -> &PencilLayout {
        self.layout(0, Representation::Spectral)
    }

    /// Layout of physical buffers: last pencil, physical.
    pub fn physical_layout(&self) -> &PencilLayout {
        self.layout(self.ndim() - 1, Representation::Physical)
    }

    /// Ranks taking part in the transpose between pencils `lower` and
    /// `lower + 1`, including this one, in process-coordinate order.
    pub fn transpose_group(&self, lower: usize) -> Vec<usize> {
        self.procs.group_along(self.rank, lower)
    }

    /// Wavenumbers of the local spectral block along `axis`.
    pub fn wavenumbers(&self, axis: usize) -> &[i64] {
        self.tables[axis].waves()
    }

    /// Angular frequencies of the local spectral block along `axis`.
    pub fn angular_frequencies(&self, axis: usize) -> &[f64] {
        self.tables[axis].freqs()
    }

    /// Per-mode wave vectors of the local spectral block.
    pub fn modes(&self) -> &ModeTable {
        &self.modes
    }
}

fn layout_slot(pencil: usize, repr: Representation) -> usize {
    pencil * 2
        + match repr {
            Representation::Physical => 0,
            Representation::Spectral => 1,
        }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_and_physical_pencils() {
        let grid = GridSpec::new(&[8, 8, 8], &[1.0; 3]).unwrap();
        let d = Decomposition::partition(grid, 4, 3).unwrap();
        assert_eq!(d.coords(), &[1, 1]);
        let s = d.spectral_layout();
        assert_eq!(s.pencil(), 0);
        assert_eq!(s.local_extent(0), (8, 0));
        assert_eq!(s.local_extent(1), (4, 4));
        assert_eq!(s.local_extent(2), (2, 3));
        let p = d.physical_layout();
        assert_eq!(p.pencil(), 2);
        assert_eq!(p.local_extent(2), (8, 0));
        assert_eq!(p.local_extent(0), (4, 4));
        assert_eq!(p.local_extent(1), (4, 4));
    }

    #[test]
    fn wavenumbers_follow_offset() {
        let grid = GridSpec::new(&[8, 8], &[1.0; 2]).unwrap();
        let d = Decomposition::partition(grid, 2, 1).unwrap();
        assert_eq!(d.wavenumbers(0), &[0, 1, 2, 3, -4, -3, -2, -1]);
        // 5 spectral points on the last axis split 3 + 2
        assert_eq!(d.wavenumbers(1), &[3, -4]);
        assert_eq!(d.modes().len(), 16);
        assert_eq!(d.modes().wave(0), &[0, 3]);
        assert_eq!(d.modes().wave(1), &[1, 3]);
    }

    #[test]
    fn rank_must_be_in_group() {
        let grid = GridSpec::cube(2, 8).unwrap();
        assert_eq!(
            Decomposition::partition(grid, 2, 2).unwrap_err(),
            DecompositionError::RankOutOfRange { rank: 2, nprocs: 2 }
        );
    }

    #[test]
    fn layout_of_matches_own_layout() {
        let grid = GridSpec::cube(3, 8).unwrap();
        let d = Decomposition::partition(grid, 4, 2).unwrap();
        assert_eq!(
            &d.layout_of(2, 1, Representation::Spectral),
            d.layout(1, Representation::Spectral)
        );
        assert_eq!(d.transpose_group(0), vec![0, 2]);
        assert_eq!(d.transpose_group(1), vec![2, 3]);
    }
}
