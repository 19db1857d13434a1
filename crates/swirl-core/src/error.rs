//! Error types for the swirl solver.
//!
//! Organized by subsystem: configuration, allocation, communication,
//! transforms, array storage, and the per-step failures raised by the
//! time integrator.

use std::error::Error;
use std::fmt;

use crate::Quantity;

// ── Configuration ──────────────────────────────────────────────

/// Errors reading or validating solver parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A required parameter is absent from the source.
    Missing {
        /// Parameter name as looked up.
        name: String,
    },
    /// A parameter is present but does not parse as a number.
    NotNumeric {
        /// Parameter name.
        name: String,
        /// The raw value that failed to parse.
        value: String,
    },
    /// A parameter parsed but lies outside its valid range.
    OutOfRange {
        /// Parameter name.
        name: String,
        /// The offending value.
        value: f64,
        /// Human-readable statement of the valid range.
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { name } => write!(f, "parameter '{name}' is not set"),
            Self::NotNumeric { name, value } => {
                write!(f, "parameter '{name}' is not numeric: '{value}'")
            }
            Self::OutOfRange {
                name,
                value,
                expected,
            } => write!(f, "parameter '{name}' = {value} out of range, expected {expected}"),
        }
    }
}

impl Error for ConfigError {}

// ── Allocation ─────────────────────────────────────────────────

/// A field or scratch buffer could not be allocated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationError {
    /// Which buffer was being allocated.
    pub what: &'static str,
    /// Requested element count.
    pub elements: usize,
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to allocate {} elements for {}",
            self.elements, self.what
        )
    }
}

impl Error for AllocationError {}

// ── Communication ──────────────────────────────────────────────

/// Errors from collective operations on the process group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommError {
    /// A peer's endpoint has gone away.
    PeerDisconnected {
        /// Rank of the vanished peer.
        peer: usize,
    },
    /// No message arrived from a peer within the receive deadline.
    Timeout {
        /// Rank that was being waited on.
        peer: usize,
    },
    /// The group was aborted by some rank.
    Aborted,
    /// A collective was called with inconsistent buffer sizes.
    SizeMismatch {
        /// Expected element or block count.
        expected: usize,
        /// Count actually supplied or received.
        actual: usize,
    },
    /// The calling rank is not a member of the requested sub-group.
    NotAMember {
        /// The calling rank.
        rank: usize,
    },
    /// A peer sent a message of the wrong kind, meaning the ranks are no
    /// longer executing the same sequence of collectives.
    UnexpectedMessage {
        /// The sending rank.
        peer: usize,
    },
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerDisconnected { peer } => write!(f, "rank {peer} disconnected"),
            Self::Timeout { peer } => write!(f, "timed out waiting for rank {peer}"),
            Self::Aborted => write!(f, "process group aborted"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            Self::NotAMember { rank } => write!(f, "rank {rank} is not in the group"),
            Self::UnexpectedMessage { peer } => {
                write!(f, "unexpected message kind from rank {peer}")
            }
        }
    }
}

impl Error for CommError {}

// ── Transforms ─────────────────────────────────────────────────

/// Errors from the distributed spectral transform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransformError {
    /// A transpose exchange failed.
    Comm(CommError),
    /// An input or output buffer does not match the local layout.
    ShapeMismatch {
        /// Which buffer was wrong.
        buffer: &'static str,
        /// Local element count the layout requires.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },
    /// Plan or staging buffers could not be allocated.
    Allocation(AllocationError),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comm(e) => write!(f, "transpose failed: {e}"),
            Self::ShapeMismatch {
                buffer,
                expected,
                actual,
            } => write!(
                f,
                "{buffer} buffer has {actual} elements, local layout needs {expected}"
            ),
            Self::Allocation(e) => write!(f, "transform setup failed: {e}"),
        }
    }
}

impl Error for TransformError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Comm(e) => Some(e),
            Self::Allocation(e) => Some(e),
            Self::ShapeMismatch { .. } => None,
        }
    }
}

impl From<CommError> for TransformError {
    fn from(e: CommError) -> Self {
        Self::Comm(e)
    }
}

impl From<AllocationError> for TransformError {
    fn from(e: AllocationError) -> Self {
        Self::Allocation(e)
    }
}

// ── Array storage ──────────────────────────────────────────────

/// Errors from an [`ArrayStore`](crate::ArrayStore).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// No dataset with this name exists.
    NotFound {
        /// Dataset name.
        name: String,
    },
    /// The dataset exists with a different global shape, or the local
    /// block falls outside it.
    ShapeMismatch {
        /// Dataset name.
        name: String,
        /// Description of the disagreement.
        reason: String,
    },
    /// The dataset exists with a different element type.
    DtypeMismatch {
        /// Dataset name.
        name: String,
    },
    /// Backend failure.
    Backend {
        /// Description from the backend.
        reason: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "dataset '{name}' not found"),
            Self::ShapeMismatch { name, reason } => {
                write!(f, "dataset '{name}' shape mismatch: {reason}")
            }
            Self::DtypeMismatch { name } => write!(f, "dataset '{name}' has another dtype"),
            Self::Backend { reason } => write!(f, "store backend failure: {reason}"),
        }
    }
}

impl Error for StoreError {}

// ── Step ───────────────────────────────────────────────────────

/// The phase of a time step in which a failure occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Masking and inverse-transforming the staged state.
    PhysicalReconstruction,
    /// The global CFL reduction.
    StepSizeDecision,
    /// Computing advective products and their transforms.
    SlopeEvaluation,
    /// Removing the compressive part of the velocity slopes.
    IncompressibilityProjection,
    /// Composing the next staged state with the diffusion factors.
    FieldUpdate,
    /// Gathering run-time diagnostics.
    Diagnostics,
    /// Writing or reading a checkpoint.
    Checkpoint,
    /// Agreeing across ranks on whether the run continues.
    RunControl,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PhysicalReconstruction => "physical reconstruction",
            Self::StepSizeDecision => "step size decision",
            Self::SlopeEvaluation => "slope evaluation",
            Self::IncompressibilityProjection => "incompressibility projection",
            Self::FieldUpdate => "field update",
            Self::Diagnostics => "diagnostics",
            Self::Checkpoint => "checkpoint",
            Self::RunControl => "run control",
        };
        f.write_str(s)
    }
}

/// What went wrong inside a [`Stage`].
#[derive(Clone, Debug, PartialEq)]
pub enum StepFailure {
    /// A spectral transform failed.
    Transform(TransformError),
    /// A collective operation failed.
    Comm(CommError),
    /// The array store rejected a read or write.
    Store(StoreError),
    /// A field was accessed outside its step lifecycle.
    FieldAccess {
        /// Description of the misuse.
        reason: String,
    },
    /// A quantity became non-finite.
    NonFinite {
        /// The affected quantity, if attributable to one.
        quantity: Option<Quantity>,
    },
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform(e) => write!(f, "{e}"),
            Self::Comm(e) => write!(f, "{e}"),
            Self::Store(e) => write!(f, "{e}"),
            Self::FieldAccess { reason } => write!(f, "field access: {reason}"),
            Self::NonFinite { quantity: Some(q) } => write!(f, "non-finite values in {q}"),
            Self::NonFinite { quantity: None } => write!(f, "non-finite values"),
        }
    }
}

/// A time step, diagnostic pass, or checkpoint failed.
///
/// Every failure is fatal for the run: the solver logs it, aborts the
/// process group, and returns this error.
#[derive(Clone, Debug, PartialEq)]
pub struct StepError {
    /// Where the failure happened.
    pub stage: Stage,
    /// What happened.
    pub failure: StepFailure,
}

impl StepError {
    /// Build an error for `stage`.
    pub fn new(stage: Stage, failure: impl Into<StepFailure>) -> Self {
        Self {
            stage,
            failure: failure.into(),
        }
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.failure)
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.failure {
            StepFailure::Transform(e) => Some(e),
            StepFailure::Comm(e) => Some(e),
            StepFailure::Store(e) => Some(e),
            StepFailure::FieldAccess { .. } | StepFailure::NonFinite { .. } => None,
        }
    }
}

impl From<TransformError> for StepFailure {
    fn from(e: TransformError) -> Self {
        Self::Transform(e)
    }
}

impl From<CommError> for StepFailure {
    fn from(e: CommError) -> Self {
        Self::Comm(e)
    }
}

impl From<StoreError> for StepFailure {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_reports_stage_and_source() {
        let err = StepError::new(Stage::SlopeEvaluation, CommError::Timeout { peer: 3 });
        assert_eq!(
            err.to_string(),
            "slope evaluation failed: timed out waiting for rank 3"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn transform_error_wraps_comm() {
        let err: TransformError = CommError::Aborted.into();
        assert_eq!(err, TransformError::Comm(CommError::Aborted));
        assert_eq!(err.source().map(|s| s.to_string()), Some("process group aborted".into()));
    }

    #[test]
    fn non_finite_names_quantity() {
        let f = StepFailure::NonFinite {
            quantity: Some(Quantity::Velocity(1)),
        };
        assert_eq!(f.to_string(), "non-finite values in uy");
    }
}
