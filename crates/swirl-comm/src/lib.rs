//! Concrete [`Communicator`](swirl_core::Communicator) implementations.
//!
//! - [`SoloComm`]: a group of one. Reductions are the identity and the
//!   only possible exchange is with oneself.
//! - [`ThreadGroup`] / [`ThreadComm`]: `n` ranks living in one process,
//!   one per thread, connected by a full mesh of crossbeam channels. Used
//!   to run and test the distributed code paths without a message-passing
//!   runtime.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod solo;
pub mod thread;

pub use solo::SoloComm;
pub use thread::{ThreadComm, ThreadGroup};
