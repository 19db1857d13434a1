//! Local extents and memory order of one pencil on one rank.

use std::ops::Range;

use smallvec::SmallVec;
use swirl_core::{AxisExtent, AxisVec, Representation};

use crate::{GridSpec, ProcessGrid};

/// Size and offset of block `index` when `n` points are split into
/// `parts` contiguous blocks. The first `n % parts` blocks get one extra
/// point.
pub fn block_extent(n: usize, parts: usize, index: usize) -> (usize, usize) {
    let base = n / parts;
    let extra = n % parts;
    let size = base + usize::from(index < extra);
    let offset = index * base + index.min(extra);
    (size, offset)
}

/// Call `f` with the global coordinates of every point in the box
/// `ranges`, with `order[0]` varying fastest.
pub fn visit_box(order: &[usize], ranges: &[Range<usize>], mut f: impl FnMut(&[usize])) {
    if ranges.iter().any(|r| r.is_empty()) {
        return;
    }
    let mut coords: AxisVec<usize> = ranges.iter().map(|r| r.start).collect();
    'outer: loop {
        f(&coords);
        for &axis in order {
            coords[axis] += 1;
            if coords[axis] < ranges[axis].end {
                continue 'outer;
            }
            coords[axis] = ranges[axis].start;
        }
        return;
    }
}

/// The block of the global grid a rank holds in one pencil orientation
/// and representation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PencilLayout {
    pencil: usize,
    representation: Representation,
    extents: AxisVec<AxisExtent>,
    order: AxisVec<usize>,
    strides: AxisVec<usize>,
}

impl PencilLayout {
    /// Layout of `pencil` for the rank at `coords` in `procs`.
    pub fn new(
        grid: &GridSpec,
        procs: &ProcessGrid,
        coords: &[usize],
        pencil: usize,
        representation: Representation,
    ) -> Self {
        let ndim = grid.ndim();
        let extents: AxisVec<AxisExtent> = (0..ndim)
            .map(|axis| {
                let global = grid.size(axis, representation);
                if axis == pencil {
                    return AxisExtent::whole(global);
                }
                let dim = if axis < pencil { axis } else { axis - 1 };
                let (local, offset) = block_extent(global, procs.dims()[dim], coords[dim]);
                AxisExtent {
                    global,
                    local,
                    offset,
                }
            })
            .collect();
        let order: AxisVec<usize> = (pencil..ndim).chain(0..pencil).collect();
        let mut strides: AxisVec<usize> = SmallVec::from_elem(0, ndim);
        let mut stride = 1;
        for &axis in &order {
            strides[axis] = stride;
            stride *= extents[axis].local;
        }
        Self {
            pencil,
            representation,
            extents,
            order,
            strides,
        }
    }

    /// The fully local axis.
    pub fn pencil(&self) -> usize {
        self.pencil
    }

    /// Physical or spectral.
    pub fn representation(&self) -> Representation {
        self.representation
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.extents.len()
    }

    /// Local `(size, offset)` along `axis`.
    pub fn local_extent(&self, axis: usize) -> (usize, usize) {
        let e = &self.extents[axis];
        (e.local, e.offset)
    }

    /// Global size, local size and offset along `axis`.
    pub fn extent(&self, axis: usize) -> AxisExtent {
        self.extents[axis]
    }

    /// Global index range held locally along `axis`.
    pub fn range(&self, axis: usize) -> Range<usize> {
        self.extents[axis].range()
    }

    /// Axes from fastest- to slowest-varying in memory.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Memory stride of `axis`.
    pub fn stride(&self, axis: usize) -> usize {
        self.strides[axis]
    }

    /// Number of local elements.
    pub fn len(&self) -> usize {
        self.extents.iter().map(|e| e.local).product()
    }

    /// Returns `true` if this rank holds no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Local memory offset of the point at global coordinates `global`.
    /// The point must lie inside the local block.
    pub fn offset_of(&self, global: &[usize]) -> usize {
        global
            .iter()
            .enumerate()
            .map(|(axis, &g)| (g - self.extents[axis].offset) * self.strides[axis])
            .sum()
    }

    /// Global coordinates of local element `index`.
    pub fn global_coords(&self, index: usize) -> AxisVec<usize> {
        let mut coords: AxisVec<usize> = SmallVec::from_elem(0, self.ndim());
        let mut rest = index;
        for &axis in &self.order {
            let e = &self.extents[axis];
            coords[axis] = e.offset + rest % e.local;
            rest /= e.local;
        }
        coords
    }

    /// Call `f` with the global coordinates of every local element, in
    /// memory order.
    pub fn for_each_point(&self, f: impl FnMut(&[usize])) {
        let ranges: AxisVec<Range<usize>> = (0..self.ndim()).map(|a| self.range(a)).collect();
        visit_box(&self.order, &ranges, f);
    }

    /// Extents from slowest- to fastest-varying axis, the row-major view
    /// array stores expect.
    pub fn store_extents(&self) -> AxisVec<AxisExtent> {
        self.order.iter().rev().map(|&a| self.extents[a]).collect()
    }
}
