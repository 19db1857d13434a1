//! Fallible buffer allocation.

use crate::AllocationError;

/// Allocate a zero-filled buffer of `len` elements, reporting failure
/// instead of aborting the process.
pub fn zeroed<T: Clone + Default>(what: &'static str, len: usize) -> Result<Vec<T>, AllocationError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| AllocationError {
        what,
        elements: len,
    })?;
    buf.resize(len, T::default());
    Ok(buf)
}
