//! Single-process communicator.

use swirl_core::{CommError, Communicator, Complex64, ReduceOp};

/// A process group containing only rank 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoloComm;

impl Communicator for SoloComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce(&self, _op: ReduceOp, _values: &mut [f64]) -> Result<(), CommError> {
        Ok(())
    }

    fn exchange(
        &self,
        group: &[usize],
        outgoing: Vec<Vec<Complex64>>,
    ) -> Result<Vec<Vec<Complex64>>, CommError> {
        if group != [0] {
            return Err(CommError::NotAMember { rank: 0 });
        }
        if outgoing.len() != 1 {
            return Err(CommError::SizeMismatch {
                expected: 1,
                actual: outgoing.len(),
            });
        }
        Ok(outgoing)
    }

    fn abort(&self, reason: &str) {
        log::error!("aborting: {reason}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reductions_are_identity() {
        let c = SoloComm;
        assert_eq!(c.all_reduce_max(3.5), Ok(3.5));
        assert_eq!(c.all_reduce_sum(-1.0), Ok(-1.0));
        assert!(c.barrier().is_ok());
    }

    #[test]
    fn exchange_returns_own_block() {
        let block = vec![Complex64::new(1.0, 2.0)];
        let back = SoloComm.exchange(&[0], vec![block.clone()]).unwrap();
        assert_eq!(back, vec![block]);
        assert_eq!(
            SoloComm.exchange(&[1], vec![vec![]]),
            Err(CommError::NotAMember { rank: 0 })
        );
    }
}
