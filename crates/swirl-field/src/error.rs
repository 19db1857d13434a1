//! Error types for field storage.

use std::fmt;

use swirl_core::{AllocationError, Quantity};

/// Errors from field allocation and the step lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// A buffer could not be allocated.
    Allocation(AllocationError),
    /// The store has no field for this quantity.
    UnknownQuantity {
        /// The requested quantity.
        quantity: Quantity,
    },
    /// `promote()` was called without a preceding `begin_step()`.
    StepNotOpen,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation(e) => write!(f, "{e}"),
            Self::UnknownQuantity { quantity } => write!(f, "no field for quantity {quantity}"),
            Self::StepNotOpen => write!(f, "promote() called without a preceding begin_step()"),
        }
    }
}

impl std::error::Error for FieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Allocation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AllocationError> for FieldError {
    fn from(e: AllocationError) -> Self {
        Self::Allocation(e)
    }
}
