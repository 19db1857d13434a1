//! Process-grid factorization and rank coordinates.

use smallvec::SmallVec;
use swirl_core::{AxisVec, Representation};

use crate::{DecompositionError, GridSpec};

/// Row-major `(ndim - 1)`-dimensional grid of ranks.
///
/// Process dimension `d` splits axis `d + 1` in pencil `d` and axis `d` in
/// every pencil after `d`, so its extent may not exceed the spectral size
/// of either axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessGrid {
    dims: AxisVec<usize>,
}

impl ProcessGrid {
    /// Choose a balanced factorization of `nprocs` for `grid`.
    pub fn auto(grid: &GridSpec, nprocs: usize) -> Result<Self, DecompositionError> {
        let request: AxisVec<usize> = SmallVec::from_elem(0, grid.ndim() - 1);
        Self::with_request(grid, nprocs, &request)
    }

    /// Factor `nprocs` honoring `request`, where a `0` entry leaves that
    /// dimension to be chosen.
    ///
    /// Among admissible factorizations the one with the smallest largest
    /// factor wins; ties go to the lexicographically largest, which puts
    /// bigger factors first.
    pub fn with_request(
        grid: &GridSpec,
        nprocs: usize,
        request: &[usize],
    ) -> Result<Self, DecompositionError> {
        let ndims = grid.ndim() - 1;
        if nprocs == 0 {
            return Err(DecompositionError::ProcessGridMismatch {
                reason: "process group is empty".into(),
            });
        }
        if request.len() != ndims {
            return Err(DecompositionError::ProcessGridMismatch {
                reason: format!(
                    "expected {ndims} process-grid dimensions, got {}",
                    request.len()
                ),
            });
        }
        let fixed: usize = request.iter().filter(|&&d| d != 0).product();
        if nprocs % fixed != 0 {
            return Err(DecompositionError::ProcessGridMismatch {
                reason: format!("requested dims {request:?} do not divide {nprocs} ranks"),
            });
        }

        let limits = Self::limits(grid);
        let mut candidates = Vec::new();
        let mut current = AxisVec::new();
        search(nprocs, request, &limits, &mut current, &mut candidates);

        let dims = candidates
            .into_iter()
            .min_by(|a, b| {
                let max_a = a.iter().max();
                let max_b = b.iter().max();
                max_a.cmp(&max_b).then_with(|| b.cmp(a))
            })
            .ok_or_else(|| DecompositionError::NoFactorization {
                nprocs,
                limits: limits.to_vec(),
            })?;
        Ok(Self { dims })
    }

    /// Largest admissible extent of each process-grid dimension.
    pub fn limits(grid: &GridSpec) -> AxisVec<usize> {
        (0..grid.ndim() - 1)
            .map(|d| {
                grid.size(d, Representation::Spectral)
                    .min(grid.size(d + 1, Representation::Spectral))
            })
            .collect()
    }

    /// Extent of each process-grid dimension.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Total number of ranks.
    pub fn nprocs(&self) -> usize {
        self.dims.iter().product()
    }

    /// Coordinates of `rank`; the last dimension varies fastest.
    pub fn coords(&self, rank: usize) -> AxisVec<usize> {
        let mut coords: AxisVec<usize> = SmallVec::from_elem(0, self.dims.len());
        let mut rest = rank;
        for d in (0..self.dims.len()).rev() {
            coords[d] = rest % self.dims[d];
            rest /= self.dims[d];
        }
        coords
    }

    /// Rank at `coords`.
    pub fn rank_of(&self, coords: &[usize]) -> usize {
        coords
            .iter()
            .zip(&self.dims)
            .fold(0, |acc, (&c, &d)| acc * d + c)
    }

    /// Ranks sharing every coordinate of `rank` except dimension `dim`,
    /// ordered by their coordinate along `dim`.
    pub fn group_along(&self, rank: usize, dim: usize) -> Vec<usize> {
        let mut coords = self.coords(rank);
        (0..self.dims[dim])
            .map(|c| {
                coords[dim] = c;
                self.rank_of(&coords)
            })
            .collect()
    }
}

fn search(
    remaining: usize,
    request: &[usize],
    limits: &[usize],
    current: &mut AxisVec<usize>,
    out: &mut Vec<AxisVec<usize>>,
) {
    let d = current.len();
    if d + 1 == request.len() {
        if (request[d] == 0 || request[d] == remaining) && remaining <= limits[d] {
            let mut dims = current.clone();
            dims.push(remaining);
            out.push(dims);
        }
        return;
    }
    for f in 1..=remaining.min(limits[d]) {
        if remaining % f != 0 || (request[d] != 0 && request[d] != f) {
            continue;
        }
        current.push(f);
        search(remaining / f, request, limits, current, out);
        current.pop();
    }
}
