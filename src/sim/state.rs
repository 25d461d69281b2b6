//! Agent records
//!
//! One hero and a fixed-length enemy array. Enemies are never inserted or
//! removed during a session; they toggle between alive and dead and get
//! relocated in place, so an enemy's index is its identity.

use glam::Vec2;

use crate::tuning::Tuning;

/// Caller-controlled simulation modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modes {
    /// Allow the enemy update to run on the worker pool
    pub parallel: bool,
    /// Run the synthetic workload for every enemy
    pub heavy_work: bool,
    /// Enemies pursue the hero (otherwise they idle around their base position)
    pub combat: bool,
}

impl Default for Modes {
    fn default() -> Self {
        Self {
            parallel: true,
            heavy_work: false,
            combat: true,
        }
    }
}

/// The player-controlled agent
#[derive(Debug, Clone)]
pub struct Hero {
    pub pos: Vec2,
    pub vel: Vec2,
    pub speed: f32,
    /// Collision radius for enemy contact
    pub radius: f32,
    pub attack_radius: f32,
    /// Seconds until the next attack is allowed (<= 0 means ready)
    pub attack_cooldown: f32,
    pub attack_cooldown_max: f32,
    /// Set on the frame an attack fires
    pub attack_triggered: bool,
    pub health: f32,
    pub max_health: f32,
    pub kills: u32,
    /// Difficulty tier, always `kills / kills_per_wave + 1`
    pub wave: u32,

    // === Visual only ===
    pub pulse_phase: f32,
    /// 1.0 on the frame damage is taken, decays to 0
    pub damage_flash: f32,
    pub shockwave_radius: f32,
    pub shockwave_alpha: f32,
}

impl Hero {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            speed: tuning.hero_speed,
            radius: tuning.hero_radius,
            attack_radius: tuning.attack_radius,
            attack_cooldown: 0.0,
            attack_cooldown_max: tuning.attack_cooldown,
            attack_triggered: false,
            health: tuning.hero_max_health,
            max_health: tuning.hero_max_health,
            kills: 0,
            wave: 1,
            pulse_phase: 0.0,
            damage_flash: 0.0,
            shockwave_radius: 0.0,
            shockwave_alpha: 0.0,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn can_attack(&self) -> bool {
        self.attack_cooldown <= 0.0
    }
}

/// A swarm member
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Enemy {
    pub pos: Vec2,
    /// Anchor for peaceful-mode oscillation; never moved by the update kernel
    pub base: Vec2,
    /// Fixed per-enemy phase offset (radians)
    pub phase: f32,
    pub idle_speed: f32,
    pub chase_speed: f32,
    pub alive: bool,
    /// Seconds until respawn while dead, 0 while alive
    pub death_timer: f32,
}

impl Enemy {
    pub fn new(pos: Vec2, phase: f32, idle_speed: f32, chase_speed: f32) -> Self {
        Self {
            pos,
            base: pos,
            phase,
            idle_speed,
            chase_speed,
            alive: true,
            death_timer: 0.0,
        }
    }

    /// Alive -> dead-pending-respawn
    pub fn kill(&mut self, respawn_delay: f32) {
        self.alive = false;
        self.death_timer = respawn_delay;
    }
}
