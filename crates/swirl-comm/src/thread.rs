//! In-process process group: one rank per thread.
//!
//! Every ordered pair of ranks `(from, to)` owns a dedicated unbounded
//! channel, so messages between two ranks arrive in the order they were
//! sent. Because every rank executes the same sequence of collectives,
//! per-pair FIFO ordering is enough to match each receive with its send
//! without tags.
//!
//! Sends never block. Receives poll a shared abort flag so that a rank
//! calling [`Communicator::abort`] releases every peer blocked inside a
//! collective with [`CommError::Aborted`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use swirl_core::{CommError, Communicator, Complex64, ReduceOp};

/// Default time a rank waits on a silent peer before giving up.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Interval between abort-flag checks while blocked.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

enum Packet {
    Reals(Vec<f64>),
    Complex(Vec<Complex64>),
}

/// Builder for a set of connected [`ThreadComm`] endpoints.
///
/// ```
/// use swirl_comm::ThreadGroup;
/// use swirl_core::Communicator;
///
/// let comms = ThreadGroup::new(3).into_comms();
/// let sums: Vec<f64> = std::thread::scope(|s| {
///     let handles: Vec<_> = comms
///         .into_iter()
///         .map(|c| s.spawn(move || c.all_reduce_sum(c.rank() as f64).unwrap()))
///         .collect();
///     handles.into_iter().map(|h| h.join().unwrap()).collect()
/// });
/// assert_eq!(sums, vec![3.0, 3.0, 3.0]);
/// ```
#[derive(Clone, Debug)]
pub struct ThreadGroup {
    size: usize,
    timeout: Duration,
}

impl ThreadGroup {
    /// A group of `size` ranks.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "a process group needs at least one rank");
        Self {
            size,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// How long a receive may wait on one peer before failing with
    /// [`CommError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create the endpoints, indexed by rank. Hand each to its own thread.
    pub fn into_comms(self) -> Vec<ThreadComm> {
        let n = self.size;
        let aborted = Arc::new(AtomicBool::new(false));
        let mut senders: Vec<Vec<Sender<Packet>>> = (0..n).map(|_| Vec::with_capacity(n)).collect();
        let mut receivers: Vec<Vec<Option<Receiver<Packet>>>> =
            (0..n).map(|_| (0..n).map(|_| None).collect()).collect();
        for (from, outbox) in senders.iter_mut().enumerate() {
            for inbox in receivers.iter_mut() {
                let (tx, rx) = crossbeam_channel::unbounded();
                outbox.push(tx);
                inbox[from] = Some(rx);
            }
        }
        senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| ThreadComm {
                rank,
                outboxes,
                inboxes: inboxes.into_iter().flatten().collect(),
                aborted: Arc::clone(&aborted),
                timeout: self.timeout,
            })
            .collect()
    }
}

/// One rank's endpoint in a [`ThreadGroup`].
pub struct ThreadComm {
    rank: usize,
    outboxes: Vec<Sender<Packet>>,
    inboxes: Vec<Receiver<Packet>>,
    aborted: Arc<AtomicBool>,
    timeout: Duration,
}

impl ThreadComm {
    fn check_aborted(&self) -> Result<(), CommError> {
        if self.aborted.load(Ordering::Acquire) {
            Err(CommError::Aborted)
        } else {
            Ok(())
        }
    }

    fn send(&self, peer: usize, packet: Packet) -> Result<(), CommError> {
        if self.outboxes[peer].send(packet).is_err() {
            self.check_aborted()?;
            return Err(CommError::PeerDisconnected { peer });
        }
        Ok(())
    }

    /// Next packet from `peer`. A packet already queued is delivered even
    /// after the group was aborted, so a collective whose contributions all
    /// arrived completes with the same result on every rank.
    fn recv(&self, peer: usize) -> Result<Packet, CommError> {
        let start = Instant::now();
        loop {
            match self.inboxes[peer].recv_timeout(POLL_INTERVAL) {
                Ok(packet) => return Ok(packet),
                Err(RecvTimeoutError::Timeout) => {
                    self.check_aborted()?;
                    if start.elapsed() > self.timeout {
                        return Err(CommError::Timeout { peer });
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.check_aborted()?;
                    return Err(CommError::PeerDisconnected { peer });
                }
            }
        }
    }

    fn recv_reals(&self, peer: usize) -> Result<Vec<f64>, CommError> {
        match self.recv(peer)? {
            Packet::Reals(v) => Ok(v),
            Packet::Complex(_) => Err(CommError::UnexpectedMessage { peer }),
        }
    }

    fn recv_complex(&self, peer: usize) -> Result<Vec<Complex64>, CommError> {
        match self.recv(peer)? {
            Packet::Complex(v) => Ok(v),
            Packet::Reals(_) => Err(CommError::UnexpectedMessage { peer }),
        }
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn all_reduce(&self, op: ReduceOp, values: &mut [f64]) -> Result<(), CommError> {
        self.check_aborted()?;
        let n = self.size();
        for peer in (0..n).filter(|&p| p != self.rank) {
            self.send(peer, Packet::Reals(values.to_vec()))?;
        }
        let own = values.to_vec();
        // Fold contributions in rank order so every rank computes
        // bit-identical results.
        for peer in 0..n {
            let contribution = if peer == self.rank {
                own.clone()
            } else {
                self.recv_reals(peer)?
            };
            if contribution.len() != values.len() {
                return Err(CommError::SizeMismatch {
                    expected: values.len(),
                    actual: contribution.len(),
                });
            }
            if peer == 0 {
                values.copy_from_slice(&contribution);
            } else {
                for (v, c) in values.iter_mut().zip(&contribution) {
                    *v = op.apply(*v, *c);
                }
            }
        }
        Ok(())
    }

    fn exchange(
        &self,
        group: &[usize],
        outgoing: Vec<Vec<Complex64>>,
    ) -> Result<Vec<Vec<Complex64>>, CommError> {
        self.check_aborted()?;
        if !group.contains(&self.rank) {
            return Err(CommError::NotAMember { rank: self.rank });
        }
        if outgoing.len() != group.len() {
            return Err(CommError::SizeMismatch {
                expected: group.len(),
                actual: outgoing.len(),
            });
        }
        let mut own = Vec::new();
        for (&peer, block) in group.iter().zip(outgoing) {
            if peer == self.rank {
                own = block;
            } else {
                self.send(peer, Packet::Complex(block))?;
            }
        }
        let mut incoming = Vec::with_capacity(group.len());
        for &peer in group {
            if peer == self.rank {
                incoming.push(std::mem::take(&mut own));
            } else {
                incoming.push(self.recv_complex(peer)?);
            }
        }
        Ok(incoming)
    }

    fn abort(&self, reason: &str) {
        log::error!("rank {} aborting process group: {reason}", self.rank);
        self.aborted.store(true, Ordering::Release);
    }
}
