//! The per-run collection of fields.

use std::sync::Arc;

use indexmap::IndexMap;
use swirl_core::{AllocationError, Quantity};
use swirl_domain::Decomposition;

use crate::{DealiasMask, Field, FieldError};

/// Every transported quantity's [`Field`] on this rank, in registration
/// order, plus the shared dealiasing mask.
#[derive(Clone, Debug)]
pub struct FieldStore {
    fields: IndexMap<Quantity, Field>,
    mask: Arc<DealiasMask>,
}

impl FieldStore {
    /// Allocate one zeroed field per `(quantity, diffusivity)` pair, sized
    /// from `decomp`, each with `stages` slope buffers.
    pub fn allocate(
        decomp: &Decomposition,
        quantities: impl IntoIterator<Item = (Quantity, f64)>,
        stages: usize,
    ) -> Result<Self, AllocationError> {
        let spectral_len = decomp.spectral_layout().len();
        let physical_len = decomp.physical_layout().len();
        let mut fields = IndexMap::new();
        for (quantity, diffusivity) in quantities {
            let field = Field::allocate(quantity, diffusivity, spectral_len, physical_len, stages)?;
            fields.insert(quantity, field);
        }
        Ok(Self {
            fields,
            mask: Arc::new(DealiasMask::new(decomp)),
        })
    }

    /// The shared dealiasing mask.
    pub fn mask(&self) -> &Arc<DealiasMask> {
        &self.mask
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no fields are registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Registered quantities in order.
    pub fn quantities(&self) -> impl Iterator<Item = Quantity> + '_ {
        self.fields.keys().copied()
    }

    /// The field for `quantity`.
    pub fn get(&self, quantity: Quantity) -> Result<&Field, FieldError> {
        self.fields
            .get(&quantity)
            .ok_or(FieldError::UnknownQuantity { quantity })
    }

    /// The mutable field for `quantity`.
    pub fn get_mut(&mut self, quantity: Quantity) -> Result<&mut Field, FieldError> {
        self.fields
            .get_mut(&quantity)
            .ok_or(FieldError::UnknownQuantity { quantity })
    }

    /// Field at registration position `index`.
    pub fn at(&self, index: usize) -> &Field {
        &self.fields[index]
    }

    /// Mutable field at registration position `index`.
    pub fn at_mut(&mut self, index: usize) -> &mut Field {
        &mut self.fields[index]
    }

    /// Iterate fields in order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    /// Iterate fields mutably in order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields.values_mut()
    }

    /// Open a step on every field.
    pub fn begin_step(&mut self) {
        for field in self.fields.values_mut() {
            field.begin_step();
        }
    }

    /// Promote every field's staged state.
    pub fn promote(&mut self) -> Result<(), FieldError> {
        for field in self.fields.values_mut() {
            field.promote()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swirl_domain::GridSpec;

    fn store() -> FieldStore {
        let grid = GridSpec::cube(2, 8).unwrap();
        let d = Decomposition::partition(grid, 1, 0).unwrap();
        let qs = Quantity::all(2).into_iter().map(|q| (q, 0.01));
        FieldStore::allocate(&d, qs, 4).unwrap()
    }

    #[test]
    fn fields_are_sized_from_layouts() {
        let s = store();
        assert_eq!(s.len(), 3);
        let f = s.get(Quantity::Scalar).unwrap();
        assert_eq!(f.state().len(), 8 * 5);
        assert_eq!(f.physical().len(), 64);
        assert_eq!(s.mask().len(), 40);
        assert_eq!(
            s.quantities().collect::<Vec<_>>(),
            vec![Quantity::Velocity(0), Quantity::Velocity(1), Quantity::Scalar]
        );
    }

    #[test]
    fn unknown_quantity_is_an_error() {
        let s = store();
        assert_eq!(
            s.get(Quantity::Velocity(2)).unwrap_err(),
            FieldError::UnknownQuantity {
                quantity: Quantity::Velocity(2)
            }
        );
    }

    #[test]
    fn lifecycle_applies_to_all_fields() {
        let mut s = store();
        s.begin_step();
        assert!(s.iter().all(|f| f.is_step_open()));
        s.promote().unwrap();
        assert!(s.iter().all(|f| !f.is_step_open()));
    }
}
