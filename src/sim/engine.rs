//! Frame orchestration
//!
//! One [`SimulationEngine::update`] call runs, in order:
//! 1. hero kinematics and timers
//! 2. the sequential/parallel path decision
//! 3. the enemy position update (alive enemies only)
//! 4. death timers and respawn
//! 5. attack and collision
//! 6. the render snapshot and stats
//!
//! Steps 1-5 are skipped once the hero's health reaches zero; step 6 always
//! runs so the renderer keeps seeing the terminal state.

use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::combat::{resolve_collisions, spawn_grid, tick_respawns, trigger_attack};
use super::input::{FrameInput, InputState};
use super::kernel::{FrameParams, SyntheticLoad, Workload, update_parallel, update_sequential};
use super::state::{Enemy, Hero, Modes};
use crate::clamp_to_arena;
use crate::renderer::RenderInstance;
use crate::scheduler::TaskScheduler;
use crate::tuning::Tuning;

/// Hero pulse speed (radians/s)
const PULSE_RATE: f32 = 4.0;
/// Damage flash decay per second
const DAMAGE_FLASH_DECAY: f32 = 3.0;
/// Shockwave ring growth (units/s), capped at the attack radius
const SHOCKWAVE_GROWTH: f32 = 12.0;
const SHOCKWAVE_FADE: f32 = 2.5;

/// How the enemy update runs this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePath {
    Sequential,
    Parallel,
}

/// Pick the enemy-update path.
///
/// Parallel only when enabled, a scheduler exists, and there are at least
/// `parallel_threshold_per_worker` enemies per worker; below that, dispatch
/// overhead dominates.
pub fn choose_path(
    modes: &Modes,
    scheduler: Option<&TaskScheduler>,
    enemy_count: usize,
    tuning: &Tuning,
) -> UpdatePath {
    match scheduler {
        Some(scheduler)
            if modes.parallel
                && enemy_count
                    >= scheduler.worker_count() * tuning.parallel_threshold_per_worker =>
        {
            UpdatePath::Parallel
        }
        _ => UpdatePath::Sequential,
    }
}

/// Per-frame statistics for display/telemetry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilingStats {
    /// Frames simulated since the last reset
    pub frame: u64,
    /// Wall time of the enemy-update phase (ms)
    pub update_time_ms: f64,
    pub enemy_count: usize,
    pub alive_count: usize,
    pub kills: u32,
    pub wave: u32,
    pub hero_health: f32,
    pub parallel_enabled: bool,
    pub heavy_work_enabled: bool,
    pub combat_mode: bool,
    /// Whether this frame actually ran on the worker pool
    pub parallel_used: bool,
    pub worker_count: usize,
}

/// Owns all agent state and advances it one frame at a time
pub struct SimulationEngine {
    tuning: Tuning,
    seed: u64,
    /// Respawn RNG; only touched on the calling thread
    rng: Pcg32,
    hero: Hero,
    enemies: Vec<Enemy>,
    modes: Modes,
    /// Elapsed simulation time (seconds)
    time: f32,
    workload: Arc<dyn Workload>,
    instances: Vec<RenderInstance>,
    stats: ProfilingStats,
    last_path: Option<UpdatePath>,
}

impl SimulationEngine {
    pub fn new(enemy_count: usize, seed: u64, tuning: Tuning, modes: Modes) -> Self {
        let mut engine = Self {
            hero: Hero::new(&tuning),
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            seed,
            enemies: Vec::new(),
            modes,
            time: 0.0,
            workload: Arc::new(SyntheticLoad::default()),
            instances: Vec::new(),
            stats: ProfilingStats::default(),
            last_path: None,
        };
        engine.reset(enemy_count);
        engine
    }

    /// Replace the synthetic workload used in heavy-work mode
    pub fn with_workload(mut self, workload: Arc<dyn Workload>) -> Self {
        self.workload = workload;
        self
    }

    /// Rebuild hero and enemy arrays from scratch. Modes are kept.
    pub fn reset(&mut self, enemy_count: usize) {
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.hero = Hero::new(&self.tuning);
        self.enemies = spawn_grid(enemy_count, &mut self.rng, &self.tuning);
        self.time = 0.0;
        self.stats = ProfilingStats::default();
        self.last_path = None;
        self.emit(None);
        log::info!("Simulation initialized with {} enemies", enemy_count);
    }

    /// Advance one frame
    pub fn update(&mut self, dt: f32, input: &FrameInput, scheduler: Option<&TaskScheduler>) {
        self.hero.attack_triggered = false;
        self.apply_toggles(&input.pressed);

        if self.hero.is_dead() {
            self.stats.update_time_ms = 0.0;
            self.stats.parallel_used = false;
            self.emit(scheduler);
            return;
        }

        self.time += dt;
        self.update_hero(dt, &input.held);

        let path = choose_path(&self.modes, scheduler, self.enemies.len(), &self.tuning);
        if self.last_path != Some(path) {
            log::debug!("Enemy update path: {:?} ({} enemies)", path, self.enemies.len());
            self.last_path = Some(path);
        }

        let frame = FrameParams {
            hero_pos: self.hero.pos,
            time: self.time,
            dt,
            combat: self.modes.combat,
            heavy_work: self.modes.heavy_work,
        };
        let started = Instant::now();
        let parallel_used = match (path, scheduler) {
            (UpdatePath::Parallel, Some(scheduler)) => {
                if let Err(err) =
                    update_parallel(scheduler, &mut self.enemies, frame, &*self.workload)
                {
                    log::error!("Parallel enemy update failed: {err}; disabling parallel mode");
                    self.modes.parallel = false;
                }
                true
            }
            _ => {
                update_sequential(&mut self.enemies, &frame, &*self.workload);
                false
            }
        };
        self.stats.update_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.stats.parallel_used = parallel_used;

        tick_respawns(
            &mut self.enemies,
            dt,
            &mut self.rng,
            &self.tuning,
            self.hero.wave,
        );

        if input.pressed.attack {
            if let Some(kills) = trigger_attack(&mut self.hero, &mut self.enemies, &self.tuning) {
                log::debug!("Attack killed {kills} enemies");
            }
        }

        if self.modes.combat {
            resolve_collisions(&mut self.hero, &mut self.enemies, &self.tuning);
            if self.hero.is_dead() {
                log::info!(
                    "Hero fell on wave {} after {} kills",
                    self.hero.wave,
                    self.hero.kills
                );
            }
        }

        self.stats.frame += 1;
        self.emit(scheduler);
    }

    fn apply_toggles(&mut self, pressed: &InputState) {
        if pressed.toggle_parallel {
            self.modes.parallel = !self.modes.parallel;
            log::info!("Parallel mode: {}", self.modes.parallel);
        }
        if pressed.toggle_heavy_work {
            self.modes.heavy_work = !self.modes.heavy_work;
            log::info!("Heavy work: {}", self.modes.heavy_work);
        }
        if pressed.toggle_combat {
            self.modes.combat = !self.modes.combat;
            log::info!("Combat mode: {}", self.modes.combat);
        }
    }

    fn update_hero(&mut self, dt: f32, held: &InputState) {
        let hero = &mut self.hero;

        let mut dir = Vec2::ZERO;
        if held.move_up {
            dir.y += 1.0;
        }
        if held.move_down {
            dir.y -= 1.0;
        }
        if held.move_right {
            dir.x += 1.0;
        }
        if held.move_left {
            dir.x -= 1.0;
        }
        hero.vel = dir.normalize_or_zero() * hero.speed;
        hero.pos = clamp_to_arena(hero.pos + hero.vel * dt);

        hero.attack_cooldown = (hero.attack_cooldown - dt).max(0.0);

        hero.pulse_phase = (hero.pulse_phase + dt * PULSE_RATE) % TAU;
        hero.damage_flash = (hero.damage_flash - dt * DAMAGE_FLASH_DECAY).max(0.0);
        if hero.shockwave_alpha > 0.0 {
            hero.shockwave_radius =
                (hero.shockwave_radius + dt * SHOCKWAVE_GROWTH).min(hero.attack_radius);
            hero.shockwave_alpha = (hero.shockwave_alpha - dt * SHOCKWAVE_FADE).max(0.0);
        }
    }

    /// Rebuild the render snapshot (hero first, then alive enemies) and stats
    fn emit(&mut self, scheduler: Option<&TaskScheduler>) {
        self.instances.clear();
        self.instances.reserve(1 + self.enemies.len());
        self.instances.push(RenderInstance::hero(&self.hero));
        let combat = self.modes.combat;
        self.instances.extend(
            self.enemies
                .iter()
                .filter(|e| e.alive)
                .map(|e| RenderInstance::enemy(e, combat)),
        );

        let stats = &mut self.stats;
        stats.enemy_count = self.enemies.len();
        stats.alive_count = self.instances.len() - 1;
        stats.kills = self.hero.kills;
        stats.wave = self.hero.wave;
        stats.hero_health = self.hero.health;
        stats.parallel_enabled = self.modes.parallel;
        stats.heavy_work_enabled = self.modes.heavy_work;
        stats.combat_mode = self.modes.combat;
        stats.worker_count = scheduler.map_or(0, TaskScheduler::worker_count);
    }

    pub fn instances(&self) -> &[RenderInstance] {
        &self.instances
    }

    pub fn stats(&self) -> &ProfilingStats {
        &self.stats
    }

    pub fn hero(&self) -> &Hero {
        &self.hero
    }

    pub fn hero_mut(&mut self) -> &mut Hero {
        &mut self.hero
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// Enemy records; the array length cannot change
    pub fn enemies_mut(&mut self) -> &mut [Enemy] {
        &mut self.enemies
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn modes(&self) -> Modes {
        self.modes
    }

    pub fn set_modes(&mut self, modes: Modes) {
        self.modes = modes;
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }
}
