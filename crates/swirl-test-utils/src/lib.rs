//! Test harnesses and analytic fixtures for swirl development.
//!
//! - [`run_ranks`] runs a closure once per rank of an in-process
//!   [`ThreadGroup`], one thread each.
//! - [`MapParams`] is a [`ParamSource`] backed by an ordered map.
//! - [`fixtures`] samples analytic fields onto a rank's physical block.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use indexmap::IndexMap;
use swirl_comm::{ThreadComm, ThreadGroup};
use swirl_core::{ConfigError, ParamSource};

/// Run `f` on `n` in-process ranks and collect the results by rank.
///
/// A panic on any rank is re-raised on the calling thread.
pub fn run_ranks<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(ThreadComm) -> T + Sync,
{
    let comms = ThreadGroup::new(n).into_comms();
    std::thread::scope(|s| {
        let f = &f;
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| s.spawn(move || f(comm)))
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(v) => v,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

/// Parameter source backed by an insertion-ordered map.
#[derive(Clone, Debug, Default)]
pub struct MapParams {
    values: IndexMap<String, f64>,
}

impl MapParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }
}

impl ParamSource for MapParams {
    fn get(&self, name: &str) -> Result<f64, ConfigError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::Missing {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swirl_core::Communicator;

    #[test]
    fn run_ranks_collects_in_rank_order() {
        let ranks = run_ranks(3, |c| c.rank());
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn map_params_reports_missing() {
        let p = MapParams::new().with("Re", 50.0);
        assert_eq!(p.get("Re"), Ok(50.0));
        assert!(matches!(p.get("Sc"), Err(ConfigError::Missing { .. })));
    }
}
