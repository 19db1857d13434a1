//! In-memory array store shared by a process group.
//!
//! Each rank writes its local block; the store assembles the blocks into
//! one global row-major array per dataset, the way a collective file write
//! through subarray views would. Clones share the same storage, so a
//! group of ranks can each hold a handle.

use std::sync::{Arc, Mutex, MutexGuard};

use indexmap::IndexMap;
use swirl_core::{ArrayStore, ArrayView, ArrayViewMut, AxisExtent, Complex64, StoreError};
use swirl_domain::visit_box;

#[derive(Clone, Debug, PartialEq)]
enum Data {
    Real(Vec<f64>),
    Complex(Vec<Complex64>),
}

#[derive(Clone, Debug, PartialEq)]
struct Dataset {
    shape: Vec<usize>,
    data: Data,
}

/// A shared, in-memory [`ArrayStore`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<IndexMap<String, Dataset>>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all datasets, in creation order.
    pub fn names(&self) -> Vec<String> {
        self.lock().map(|m| m.keys().cloned().collect()).unwrap_or_default()
    }

    /// Global shape of `name`, slowest axis first.
    pub fn shape(&self, name: &str) -> Option<Vec<usize>> {
        self.lock().ok()?.get(name).map(|d| d.shape.clone())
    }

    /// The whole real dataset `name`.
    pub fn real(&self, name: &str) -> Option<Vec<f64>> {
        match &self.lock().ok()?.get(name)?.data {
            Data::Real(v) => Some(v.clone()),
            Data::Complex(_) => None,
        }
    }

    /// The whole complex dataset `name`.
    pub fn complex(&self, name: &str) -> Option<Vec<Complex64>> {
        match &self.lock().ok()?.get(name)?.data {
            Data::Complex(v) => Some(v.clone()),
            Data::Real(_) => None,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, IndexMap<String, Dataset>>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Backend {
            reason: "memory store lock poisoned".into(),
        })
    }
}

/// Check `extents` against `shape` and `len`, and return the global flat
/// index of every local element in local order.
fn block_indices(
    name: &str,
    shape: &[usize],
    extents: &[AxisExtent],
    len: usize,
) -> Result<Vec<usize>, StoreError> {
    let mismatch = |reason: String| StoreError::ShapeMismatch {
        name: name.to_string(),
        reason,
    };
    let global: Vec<usize> = extents.iter().map(|e| e.global).collect();
    if global != shape {
        return Err(mismatch(format!("global shape {global:?}, stored {shape:?}")));
    }
    if let Some(e) = extents.iter().find(|e| e.offset + e.local > e.global) {
        return Err(mismatch(format!(
            "block {}..{} outside axis of length {}",
            e.offset,
            e.offset + e.local,
            e.global
        )));
    }
    let expected: usize = extents.iter().map(|e| e.local).product();
    if expected != len {
        return Err(mismatch(format!("block holds {len} elements, extents describe {expected}")));
    }

    let n = extents.len();
    let mut strides = vec![1; n];
    for d in (0..n.saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    let order: Vec<usize> = (0..n).rev().collect();
    let ranges: Vec<_> = extents.iter().map(|e| e.range()).collect();
    let mut indices = Vec::with_capacity(len);
    visit_box(&order, &ranges, |g| {
        indices.push(g.iter().zip(&strides).map(|(i, s)| i * s).sum());
    });
    Ok(indices)
}

impl ArrayStore for MemoryStore {
    fn write(
        &self,
        name: &str,
        extents: &[AxisExtent],
        data: ArrayView<'_>,
    ) -> Result<(), StoreError> {
        let mut map = self.lock()?;
        let shape: Vec<usize> = extents.iter().map(|e| e.global).collect();
        let total: usize = shape.iter().product();
        let dataset = map.entry(name.to_string()).or_insert_with(|| Dataset {
            shape: shape.clone(),
            data: match data {
                ArrayView::Real(_) => Data::Real(vec![0.0; total]),
                ArrayView::Complex(_) => Data::Complex(vec![Complex64::new(0.0, 0.0); total]),
            },
        });
        let indices = block_indices(name, &dataset.shape, extents, data.len())?;
        match (&mut dataset.data, data) {
            (Data::Real(dst), ArrayView::Real(src)) => {
                for (&i, &v) in indices.iter().zip(src) {
                    dst[i] = v;
                }
            }
            (Data::Complex(dst), ArrayView::Complex(src)) => {
                for (&i, &v) in indices.iter().zip(src) {
                    dst[i] = v;
                }
            }
            _ => {
                return Err(StoreError::DtypeMismatch {
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }

    fn read(
        &self,
        name: &str,
        extents: &[AxisExtent],
        out: ArrayViewMut<'_>,
    ) -> Result<(), StoreError> {
        let map = self.lock()?;
        let dataset = map.get(name).ok_or_else(|| StoreError::NotFound {
            name: name.to_string(),
        })?;
        let len = match &out {
            ArrayViewMut::Real(d) => d.len(),
            ArrayViewMut::Complex(d) => d.len(),
        };
        let indices = block_indices(name, &dataset.shape, extents, len)?;
        match (&dataset.data, out) {
            (Data::Real(src), ArrayViewMut::Real(dst)) => {
                for (d, &i) in dst.iter_mut().zip(&indices) {
                    *d = src[i];
                }
            }
            (Data::Complex(src), ArrayViewMut::Complex(dst)) => {
                for (d, &i) in dst.iter_mut().zip(&indices) {
                    *d = src[i];
                }
            }
            _ => {
                return Err(StoreError::DtypeMismatch {
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ext(global: usize, local: usize, offset: usize) -> AxisExtent {
        AxisExtent {
            global,
            local,
            offset,
        }
    }

    #[test]
    fn blocks_assemble_row_major() {
        let store = MemoryStore::new();
        // A 2 x 4 array written as two 2 x 2 column blocks.
        store
            .write("a", &[ext(2, 2, 0), ext(4, 2, 0)], ArrayView::Real(&[0.0, 1.0, 4.0, 5.0]))
            .unwrap();
        store
            .write("a", &[ext(2, 2, 0), ext(4, 2, 2)], ArrayView::Real(&[2.0, 3.0, 6.0, 7.0]))
            .unwrap();
        assert_eq!(store.shape("a"), Some(vec![2, 4]));
        assert_eq!(store.real("a").unwrap(), (0..8).map(f64::from).collect::<Vec<_>>());

        let mut row = [0.0; 4];
        store
            .read("a", &[ext(2, 1, 1), AxisExtent::whole(4)], ArrayViewMut::Real(&mut row))
            .unwrap();
        assert_eq!(row, [4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn rejects_mismatches() {
        let store = MemoryStore::new();
        store
            .write("s", &[AxisExtent::whole(2)], ArrayView::Real(&[1.0, 2.0]))
            .unwrap();
        let err = store
            .write("s", &[AxisExtent::whole(3)], ArrayView::Real(&[1.0, 2.0, 3.0]))
            .unwrap_err();
        assert!(matches!(err, StoreError::ShapeMismatch { .. }));
        let err = store
            .write("s", &[AxisExtent::whole(2)], ArrayView::Complex(&[Complex64::new(0.0, 0.0); 2]))
            .unwrap_err();
        assert_eq!(err, StoreError::DtypeMismatch { name: "s".into() });
        let mut out = [0.0; 1];
        let err = store
            .read("missing", &[AxisExtent::whole(1)], ArrayViewMut::Real(&mut out))
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound { name: "missing".into() });
        let err = store
            .read("s", &[AxisExtent::whole(2)], ArrayViewMut::Real(&mut out))
            .unwrap_err();
        assert!(matches!(err, StoreError::ShapeMismatch { .. }));
    }

    #[test]
    fn clones_share_storage() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.write("x", &[AxisExtent::whole(1)], ArrayView::Real(&[9.0])).unwrap();
        assert_eq!(b.real("x"), Some(vec![9.0]));
        assert_eq!(b.names(), vec!["x".to_string()]);
    }
}
