//! Transported quantity identifiers.

use std::fmt;

/// A transported quantity: one velocity component per axis, plus the
/// passive scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quantity {
    /// Velocity component along the given axis.
    Velocity(usize),
    /// The advected passive scalar.
    Scalar,
}

impl Quantity {
    /// All quantities for a grid with `ndim` axes: velocities in axis
    /// order, then the scalar.
    pub fn all(ndim: usize) -> Vec<Quantity> {
        (0..ndim)
            .map(Quantity::Velocity)
            .chain(std::iter::once(Quantity::Scalar))
            .collect()
    }

    /// Returns `true` for velocity components.
    pub fn is_velocity(&self) -> bool {
        matches!(self, Self::Velocity(_))
    }

    /// Short dataset name used by checkpoints (`ux`, `uy`, `uz`, `s`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Velocity(0) => "ux",
            Self::Velocity(1) => "uy",
            Self::Velocity(2) => "uz",
            Self::Velocity(_) => "u?",
            Self::Scalar => "s",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_lists_velocities_then_scalar() {
        assert_eq!(
            Quantity::all(3),
            vec![
                Quantity::Velocity(0),
                Quantity::Velocity(1),
                Quantity::Velocity(2),
                Quantity::Scalar
            ]
        );
        assert_eq!(Quantity::all(2).len(), 3);
    }

    #[test]
    fn names_match_dataset_convention() {
        assert_eq!(Quantity::Velocity(0).name(), "ux");
        assert_eq!(Quantity::Velocity(2).to_string(), "uz");
        assert_eq!(Quantity::Scalar.name(), "s");
        assert!(!Quantity::Scalar.is_velocity());
    }
}
