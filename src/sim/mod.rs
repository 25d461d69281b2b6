//! Simulation module
//!
//! All gameplay logic lives here. Rules that keep the parallel and
//! sequential paths equivalent:
//! - Enemy indices are stable for the whole session
//! - The parallel phase only writes alive enemies, each from exactly one task
//! - The seeded RNG is only used from the sequential respawn pass
//! - No rendering or platform dependencies

pub mod combat;
pub mod engine;
pub mod input;
pub mod kernel;
pub mod state;

pub use combat::{advance_wave, resolve_attack, resolve_collisions, respawn, spawn_grid};
pub use engine::{ProfilingStats, SimulationEngine, UpdatePath, choose_path};
pub use input::{FrameInput, InputState};
pub use kernel::{FrameParams, SyntheticLoad, Workload, partition};
pub use state::{Enemy, Hero, Modes};
