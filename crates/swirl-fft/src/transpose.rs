//! Pencil-to-pencil transposes of spectral data.

use std::ops::Range;

use swirl_core::{AxisVec, CommError, Communicator, Complex64, Representation};
use swirl_domain::{visit_box, Decomposition};

/// Precomputed index lists moving spectral data from pencil `from` to an
/// adjacent pencil `to` within one transpose sub-group.
///
/// For each group member, `send[i]` lists the local offsets in the source
/// buffer that go to member `i`, and `recv[i]` the local offsets in the
/// destination buffer that member `i`'s block fills. Sender and receiver
/// walk the shared sub-box in the source pencil's memory order, so block
/// element `j` means the same global point on both sides.
#[derive(Clone, Debug)]
pub struct TransposePlan {
    from: usize,
    to: usize,
    group: Vec<usize>,
    send: Vec<Vec<usize>>,
    recv: Vec<Vec<usize>>,
}

impl TransposePlan {
    /// Plan the transpose from pencil `from` to `to` for this rank.
    ///
    /// # Panics
    ///
    /// Panics if the pencils are not adjacent.
    pub fn new(decomp: &Decomposition, from: usize, to: usize) -> Self {
        assert_eq!(from.abs_diff(to), 1, "transposes move between adjacent pencils");
        let ndim = decomp.ndim();
        let group = decomp.transpose_group(from.min(to));
        let src = decomp.layout(from, Representation::Spectral);
        let dst = decomp.layout(to, Representation::Spectral);

        let mut send = Vec::with_capacity(group.len());
        let mut recv = Vec::with_capacity(group.len());
        for &peer in &group {
            let peer_src = decomp.layout_of(peer, from, Representation::Spectral);
            let peer_dst = decomp.layout_of(peer, to, Representation::Spectral);

            let outgoing: AxisVec<Range<usize>> = (0..ndim)
                .map(|a| if a == from { peer_dst.range(a) } else { src.range(a) })
                .collect();
            let mut idx = Vec::new();
            visit_box(src.order(), &outgoing, |g| idx.push(src.offset_of(g)));
            send.push(idx);

            let incoming: AxisVec<Range<usize>> = (0..ndim)
                .map(|a| if a == from { dst.range(a) } else { peer_src.range(a) })
                .collect();
            let mut idx = Vec::new();
            visit_box(src.order(), &incoming, |g| idx.push(dst.offset_of(g)));
            recv.push(idx);
        }
        Self {
            from,
            to,
            group,
            send,
            recv,
        }
    }

    /// Source pencil.
    pub fn from(&self) -> usize {
        self.from
    }

    /// Destination pencil.
    pub fn to(&self) -> usize {
        self.to
    }

    /// Ranks taking part, in exchange order.
    pub fn group(&self) -> &[usize] {
        &self.group
    }

    /// Move `src` (laid out in pencil `from`) into `dst` (pencil `to`).
    ///
    /// Collective over [`group`](Self::group).
    pub fn execute(
        &self,
        comm: &dyn Communicator,
        src: &[Complex64],
        dst: &mut [Complex64],
    ) -> Result<(), CommError> {
        let outgoing = self
            .send
            .iter()
            .map(|idx| idx.iter().map(|&i| src[i]).collect())
            .collect();
        let incoming = comm.exchange(&self.group, outgoing)?;
        if incoming.len() != self.recv.len() {
            return Err(CommError::SizeMismatch {
                expected: self.recv.len(),
                actual: incoming.len(),
            });
        }
        for (idx, block) in self.recv.iter().zip(&incoming) {
            if block.len() != idx.len() {
                return Err(CommError::SizeMismatch {
                    expected: idx.len(),
                    actual: block.len(),
                });
            }
            for (&i, &v) in idx.iter().zip(block) {
                dst[i] = v;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swirl_comm::SoloComm;
    use swirl_domain::GridSpec;

    #[test]
    fn single_rank_transpose_reorders_axes() {
        let grid = GridSpec::new(&[3, 4], &[1.0, 1.0]).unwrap();
        let d = Decomposition::partition(grid, 1, 0).unwrap();
        let plan = TransposePlan::new(&d, 0, 1);
        assert_eq!(plan.group(), &[0]);
        let src_layout = d.layout(0, Representation::Spectral);
        let dst_layout = d.layout(1, Representation::Spectral);
        let src: Vec<Complex64> = (0..src_layout.len())
            .map(|i| {
                let g = src_layout.global_coords(i);
                Complex64::new(g[0] as f64, g[1] as f64)
            })
            .collect();
        let mut dst = vec![Complex64::new(-1.0, -1.0); dst_layout.len()];
        plan.execute(&SoloComm, &src, &mut dst).unwrap();
        for (i, z) in dst.iter().enumerate() {
            let g = dst_layout.global_coords(i);
            assert_eq!(*z, Complex64::new(g[0] as f64, g[1] as f64));
        }
    }
}
