//! Decay of a 3-D Taylor–Green vortex on four in-process ranks.
//!
//! Reads `SWIRL_Re`, `SWIRL_Sc`, `SWIRL_timemax` and `SWIRL_wtimemax` from
//! the environment when they are set, and falls back to a short demo run
//! otherwise. Progress goes through `log`; set `RUST_LOG=info` to see it.
//!
//! Run with:
//!   cargo run --example taylor_green

use std::time::Duration;

use swirl_comm::ThreadGroup;
use swirl_core::{Communicator, Quantity};
use swirl_domain::GridSpec;
use swirl_engine::{
    DiagnosticsEvery, EnvParams, LogDiagnostics, MemoryStore, RunLimits, Simulation,
    SolverConfig, StoreCheckpoint,
};
use swirl_test_utils::fixtures::taylor_green;

const RANKS: usize = 4;
const N: usize = 32;

fn main() {
    env_logger::init();

    let params = EnvParams::with_prefix("SWIRL_");
    let config = SolverConfig::from_params(&params).unwrap_or_else(|e| {
        log::info!("using demo configuration ({e})");
        SolverConfig::new(200.0, 1.0)
    });
    let limits = RunLimits::from_params(&params).unwrap_or(RunLimits {
        time_max: 1.0,
        wall_time_max: Duration::from_secs(60),
    });
    let grid = GridSpec::cube(3, N).expect("valid grid");
    let store = MemoryStore::new();

    let comms = ThreadGroup::new(RANKS).into_comms();
    std::thread::scope(|s| {
        for comm in comms {
            let (grid, config) = (grid.clone(), config.clone());
            let (limits, store) = (limits.clone(), store.clone());
            s.spawn(move || {
                let rank = comm.rank();
                let mut sim = match Simulation::with_config(grid.clone(), config, comm) {
                    Ok(sim) => sim,
                    Err(e) => {
                        log::error!("rank {rank}: {e}");
                        return;
                    }
                };
                let layout = sim.decomposition().physical_layout().clone();
                for axis in 0..3 {
                    let u = taylor_green(&grid, &layout, axis, 1.0);
                    if sim.load_physical(Quantity::Velocity(axis), &u).is_err() {
                        return;
                    }
                }
                let mut observer = DiagnosticsEvery::new(0.1, LogDiagnostics);
                match sim.run(&limits, &mut observer) {
                    Ok(summary) if rank == 0 => println!(
                        "{} steps, t = {:.4}, {}",
                        summary.steps, summary.time, summary.reason
                    ),
                    Ok(_) => {}
                    Err(_) => return,
                }
                let _ = sim.checkpoint(&mut StoreCheckpoint::new(store));
            });
        }
    });

    println!("checkpoint datasets: {:?}", store.names());
}
