//! Error types for grid and decomposition construction.

use std::fmt;

/// Errors raised while validating a grid or partitioning it across ranks.
///
/// All of these are fatal at startup.
#[derive(Clone, Debug, PartialEq)]
pub enum DecompositionError {
    /// Only 2 and 3 spatial axes are supported.
    UnsupportedAxisCount {
        /// Number of axes requested.
        ndim: usize,
    },
    /// Per-axis inputs disagree in length.
    AxisCountMismatch {
        /// Number of point counts supplied.
        sizes: usize,
        /// Number of lengths or periodicity flags supplied.
        other: usize,
    },
    /// An axis has zero points.
    EmptyAxis {
        /// The offending axis.
        axis: usize,
    },
    /// An axis has a single point, leaving no resolvable mode.
    AxisTooSmall {
        /// The offending axis.
        axis: usize,
        /// Its point count.
        size: usize,
    },
    /// A physical length is non-finite or non-positive.
    InvalidLength {
        /// The offending axis.
        axis: usize,
        /// The rejected length.
        length: f64,
    },
    /// An axis was declared non-periodic. Fourier bases require
    /// periodicity.
    NonPeriodicAxis {
        /// The offending axis.
        axis: usize,
    },
    /// No process grid fits `nprocs` ranks under the per-dimension limits.
    NoFactorization {
        /// Number of ranks to place.
        nprocs: usize,
        /// Largest admissible extent of each process-grid dimension.
        limits: Vec<usize>,
    },
    /// An explicit process-grid request is inconsistent with the group.
    ProcessGridMismatch {
        /// What went wrong.
        reason: String,
    },
    /// The calling rank is outside the process group.
    RankOutOfRange {
        /// The calling rank.
        rank: usize,
        /// Group size.
        nprocs: usize,
    },
}

impl fmt::Display for DecompositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedAxisCount { ndim } => {
                write!(f, "{ndim} axes requested, only 2 or 3 are supported")
            }
            Self::AxisCountMismatch { sizes, other } => {
                write!(f, "{sizes} point counts but {other} per-axis values")
            }
            Self::EmptyAxis { axis } => write!(f, "axis {axis} has no points"),
            Self::AxisTooSmall { axis, size } => {
                write!(f, "axis {axis} has {size} point(s), need at least 2")
            }
            Self::InvalidLength { axis, length } => {
                write!(f, "axis {axis} length {length} must be finite and positive")
            }
            Self::NonPeriodicAxis { axis } => write!(f, "axis {axis} is not periodic"),
            Self::NoFactorization { nprocs, limits } => write!(
                f,
                "cannot factor {nprocs} ranks into a process grid within limits {limits:?}"
            ),
            Self::ProcessGridMismatch { reason } => write!(f, "invalid process grid: {reason}"),
            Self::RankOutOfRange { rank, nprocs } => {
                write!(f, "rank {rank} outside group of {nprocs}")
            }
        }
    }
}

impl std::error::Error for DecompositionError {}
