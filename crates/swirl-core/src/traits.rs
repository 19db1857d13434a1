//! Collaborator traits: the process group, the parameter source, and the
//! checkpoint array store.
//!
//! The solver never talks to a transport, an environment, or a file
//! format directly. Each of these sits behind one of the traits below so
//! that the numerical core can run single-process, over in-process rank
//! threads, or against any message-passing backend.

use std::ops::Range;

use crate::{CommError, Complex64, ConfigError, StoreError};

// ── Process group ──────────────────────────────────────────────

/// Reduction operator for [`Communicator::all_reduce`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReduceOp {
    /// Element-wise maximum.
    Max,
    /// Element-wise sum.
    Sum,
}

impl ReduceOp {
    /// Combine two values.
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Max => a.max(b),
            Self::Sum => a + b,
        }
    }
}

/// A group of cooperating ranks running the same program.
///
/// Every method is collective unless stated otherwise: all ranks of the
/// group (or of the named sub-group) must make the same calls in the same
/// order. Implementations must deliver identical reduction results on
/// every rank.
pub trait Communicator: Send {
    /// This process's rank in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Reduce `values` element-wise across all ranks, in place.
    fn all_reduce(&self, op: ReduceOp, values: &mut [f64]) -> Result<(), CommError>;

    /// All-to-all personalized exchange within `group`.
    ///
    /// `group` lists member ranks in a fixed order known to every member
    /// and must contain the calling rank. `outgoing[i]` is sent to
    /// `group[i]`; the result's element `i` is what `group[i]` sent to
    /// the caller. Only the members of `group` take part.
    fn exchange(
        &self,
        group: &[usize],
        outgoing: Vec<Vec<Complex64>>,
    ) -> Result<Vec<Vec<Complex64>>, CommError>;

    /// Tear the group down after a fatal error. Not collective: any rank
    /// may call it, and peers observe [`CommError::Aborted`] from their
    /// next collective.
    fn abort(&self, reason: &str);

    /// Global maximum of one value.
    fn all_reduce_max(&self, value: f64) -> Result<f64, CommError> {
        let mut v = [value];
        self.all_reduce(ReduceOp::Max, &mut v)?;
        Ok(v[0])
    }

    /// Global sum of one value.
    fn all_reduce_sum(&self, value: f64) -> Result<f64, CommError> {
        let mut v = [value];
        self.all_reduce(ReduceOp::Sum, &mut v)?;
        Ok(v[0])
    }

    /// Block until every rank reaches the barrier.
    fn barrier(&self) -> Result<(), CommError> {
        self.all_reduce(ReduceOp::Sum, &mut [])
    }
}

// ── Parameters ─────────────────────────────────────────────────

/// A source of named numeric parameters.
pub trait ParamSource {
    /// Look up a parameter.
    fn get(&self, name: &str) -> Result<f64, ConfigError>;

    /// Look up a parameter, falling back to `default` when it is unset.
    /// Malformed values are still errors.
    fn get_or(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        match self.get(name) {
            Err(ConfigError::Missing { .. }) => Ok(default),
            other => other,
        }
    }
}

// ── Array storage ──────────────────────────────────────────────

/// Global size and local block of one array axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisExtent {
    /// Global length of the axis.
    pub global: usize,
    /// Length of this rank's block.
    pub local: usize,
    /// Global index of the block's first element.
    pub offset: usize,
}

impl AxisExtent {
    /// An axis held entirely by every rank.
    pub fn whole(len: usize) -> Self {
        Self {
            global: len,
            local: len,
            offset: 0,
        }
    }

    /// Global index range of the local block.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.local
    }
}

/// A local block of data to be written.
#[derive(Clone, Copy, Debug)]
pub enum ArrayView<'a> {
    /// Real values.
    Real(&'a [f64]),
    /// Complex values.
    Complex(&'a [Complex64]),
}

impl ArrayView<'_> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Real(d) => d.len(),
            Self::Complex(d) => d.len(),
        }
    }

    /// Returns `true` if the block is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A local block to be filled by a read.
#[derive(Debug)]
pub enum ArrayViewMut<'a> {
    /// Real destination.
    Real(&'a mut [f64]),
    /// Complex destination.
    Complex(&'a mut [Complex64]),
}

/// A named store of distributed n-dimensional arrays.
///
/// Extents are listed from the slowest-varying to the fastest-varying
/// axis of the local block, i.e. the block is row-major over `extents`.
/// Reads and writes are collective in the sense that every rank passes
/// its own block of the same dataset.
pub trait ArrayStore {
    /// Write this rank's block of dataset `name`.
    fn write(&self, name: &str, extents: &[AxisExtent], data: ArrayView<'_>)
        -> Result<(), StoreError>;

    /// Read this rank's block of dataset `name` into `out`.
    fn read(
        &self,
        name: &str,
        extents: &[AxisExtent],
        out: ArrayViewMut<'_>,
    ) -> Result<(), StoreError>;
}
