//! Butcher tableau of the explicit four-stage Runge–Kutta scheme.

/// Number of stages of [`RK4`].
pub const STAGES: usize = 4;

/// Stage coefficients `a[k][l]` and stage times `c[k]`.
///
/// `c` has one entry more than there are stages: `c[k + 1]` is the time,
/// as a fraction of `dt`, at which the state composed by stage `k` lives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ButcherTableau {
    a: [[f64; STAGES]; STAGES],
    c: [f64; STAGES + 1],
}

/// The classical fourth-order scheme.
pub const RK4: ButcherTableau = ButcherTableau {
    a: [
        [0.5, 0.0, 0.0, 0.0],
        [0.0, 0.5, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
    ],
    c: [0.0, 0.5, 0.5, 1.0, 1.0],
};

impl ButcherTableau {
    /// Number of stages.
    pub fn stages(&self) -> usize {
        STAGES
    }

    /// Weight of slope `l` when composing stage `k`.
    pub fn a(&self, k: usize, l: usize) -> f64 {
        self.a[k][l]
    }

    /// Stage time `c[k]` as a fraction of `dt`.
    pub fn c(&self, k: usize) -> f64 {
        self.c[k]
    }
}
