//! Checkpoint and restart through an [`ArrayStore`].
//!
//! A checkpoint holds the run counters `step`, `time` and `dt`, the grid
//! description `glsizes` and `lengths`, and the committed spectral state
//! of every quantity under its short name (`ux`, `uy`, `uz`, `s`). The
//! spectral arrays are written with each rank's block descriptor, so a
//! checkpoint written by one process count can be read by another.
//!
//! Scalars and grid descriptors are written whole by every rank.

use swirl_core::{ArrayStore, ArrayView, ArrayViewMut, AxisExtent, StoreError};
use swirl_domain::Decomposition;
use swirl_field::FieldStore;

/// What a checkpoint sink receives: the run counters and the committed
/// state of every field.
#[derive(Clone, Copy, Debug)]
pub struct CheckpointView<'a> {
    /// Steps taken so far.
    pub step: u64,
    /// Simulation time.
    pub time: f64,
    /// Step size carried into the next step.
    pub dt: f64,
    /// Layout of the field buffers.
    pub decomp: &'a Decomposition,
    /// The fields, with no step open.
    pub fields: &'a FieldStore,
}

/// Run counters restored from a checkpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CheckpointHeader {
    /// Steps taken when the checkpoint was written.
    pub step: u64,
    /// Simulation time.
    pub time: f64,
    /// Step size carried into the next step.
    pub dt: f64,
}

/// Receives checkpoints. Called collectively on every rank.
pub trait CheckpointSink {
    /// Persist `view`.
    fn save(&mut self, view: &CheckpointView<'_>) -> Result<(), StoreError>;
}

/// A [`CheckpointSink`] writing into an [`ArrayStore`].
#[derive(Clone, Debug)]
pub struct StoreCheckpoint<S> {
    store: S,
}

impl<S: ArrayStore> StoreCheckpoint<S> {
    /// Write checkpoints into `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ArrayStore> CheckpointSink for StoreCheckpoint<S> {
    fn save(&mut self, view: &CheckpointView<'_>) -> Result<(), StoreError> {
        write_checkpoint(&self.store, view)
    }
}

fn write_scalars(store: &dyn ArrayStore, name: &str, values: &[f64]) -> Result<(), StoreError> {
    store.write(name, &[AxisExtent::whole(values.len())], ArrayView::Real(values))
}

fn read_scalars(store: &dyn ArrayStore, name: &str, out: &mut [f64]) -> Result<(), StoreError> {
    store.read(name, &[AxisExtent::whole(out.len())], ArrayViewMut::Real(out))
}

/// Write `view` into `store`.
pub fn write_checkpoint(store: &dyn ArrayStore, view: &CheckpointView<'_>) -> Result<(), StoreError> {
    let grid = view.decomp.grid();
    write_scalars(store, "step", &[view.step as f64])?;
    write_scalars(store, "time", &[view.time])?;
    write_scalars(store, "dt", &[view.dt])?;
    let sizes: Vec<f64> = grid.sizes().iter().map(|&n| n as f64).collect();
    write_scalars(store, "glsizes", &sizes)?;
    write_scalars(store, "lengths", grid.lengths())?;

    let extents = view.decomp.spectral_layout().store_extents();
    for field in view.fields.iter() {
        store.write(
            field.quantity().name(),
            &extents,
            ArrayView::Complex(field.state()),
        )?;
    }
    log::debug!(
        "rank {}: wrote checkpoint at step {} (t = {})",
        view.decomp.rank(),
        view.step,
        view.time
    );
    Ok(())
}

/// Restore the committed state of `fields` from `store` and return the
/// run counters. The stored grid must match `decomp`'s grid.
pub fn read_checkpoint(
    store: &dyn ArrayStore,
    decomp: &Decomposition,
    fields: &mut FieldStore,
) -> Result<CheckpointHeader, StoreError> {
    let grid = decomp.grid();
    let mut sizes = vec![0.0; grid.ndim()];
    read_scalars(store, "glsizes", &mut sizes)?;
    let expected: Vec<f64> = grid.sizes().iter().map(|&n| n as f64).collect();
    if sizes != expected {
        return Err(StoreError::ShapeMismatch {
            name: "glsizes".into(),
            reason: format!("checkpoint grid {sizes:?}, run grid {expected:?}"),
        });
    }
    let mut lengths = vec![0.0; grid.ndim()];
    read_scalars(store, "lengths", &mut lengths)?;
    if lengths.iter().zip(grid.lengths()).any(|(a, b)| (a - b).abs() > 1e-12 * b.abs()) {
        return Err(StoreError::ShapeMismatch {
            name: "lengths".into(),
            reason: format!("checkpoint lengths {lengths:?}, run lengths {:?}", grid.lengths()),
        });
    }

    let mut header = [0.0; 3];
    for (name, slot) in ["step", "time", "dt"].iter().zip(header.iter_mut()) {
        read_scalars(store, name, std::slice::from_mut(slot))?;
    }

    let extents = decomp.spectral_layout().store_extents();
    for field in fields.iter_mut() {
        let name = field.quantity().name();
        store.read(name, &extents, ArrayViewMut::Complex(field.state_mut()))?;
    }
    Ok(CheckpointHeader {
        step: header[0] as u64,
        time: header[1],
        dt: header[2],
    })
}
