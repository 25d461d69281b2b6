//! Legionfall - a swarm arena simulation core
//!
//! Core modules:
//! - `scheduler`: Fixed worker pool with fork-join barrier semantics
//! - `sim`: Hero/enemy state, the parallel update kernel, combat and respawn
//! - `renderer`: Render-ready instance records (no GPU code)
//! - `session`: Per-frame driver (input diffing, restarts, FPS)
//! - `settings` / `tuning`: Configuration and game balance

pub mod error;
pub mod renderer;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, SchedulerError};
pub use scheduler::TaskScheduler;
pub use session::Session;
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Arena is the square [-ARENA_HALF, ARENA_HALF]²
    pub const ARENA_HALF: f32 = 10.0;
    pub const ARENA_MIN: f32 = -ARENA_HALF;
    pub const ARENA_MAX: f32 = ARENA_HALF;

    /// Largest frame step the session will hand to the engine
    pub const MAX_FRAME_DT: f32 = 0.1;
}

/// Clamp a position to the arena square
#[inline]
pub fn clamp_to_arena(pos: Vec2) -> Vec2 {
    pos.clamp(Vec2::splat(consts::ARENA_MIN), Vec2::splat(consts::ARENA_MAX))
}

/// Whether a position lies on the arena boundary (within `tolerance`)
#[inline]
pub fn on_arena_edge(pos: Vec2, tolerance: f32) -> bool {
    let inside = pos.abs().max_element() <= consts::ARENA_HALF + tolerance;
    let touching = (pos.x.abs() - consts::ARENA_HALF).abs() <= tolerance
        || (pos.y.abs() - consts::ARENA_HALF).abs() <= tolerance;
    inside && touching
}
