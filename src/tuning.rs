//! Data-driven game balance
//!
//! Every gameplay constant that a designer might want to tweak lives here so
//! the simulation code never hard-codes balance numbers.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Gameplay balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Hero ===
    /// Movement speed (units/s)
    pub hero_speed: f32,
    /// Collision radius used for enemy contact
    pub hero_radius: f32,
    /// Enemies strictly inside this radius die when the hero attacks
    pub attack_radius: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    pub hero_max_health: f32,
    /// Health lost per overlapping enemy per frame
    pub contact_damage: f32,

    // === Enemies ===
    pub enemy_radius: f32,
    /// Distance an overlapping enemy is pushed away from the hero
    pub knockback: f32,
    /// Seconds a killed enemy stays dead
    pub respawn_delay: f32,
    pub idle_speed_min: f32,
    pub idle_speed_max: f32,
    /// Chase speed range for wave 1; later waves scale it
    pub chase_speed_min: f32,
    pub chase_speed_max: f32,

    // === Waves ===
    pub kills_per_wave: u32,
    /// Chase speed multiplier applied on every wave increase
    pub wave_speed_growth: f32,

    // === Scheduling ===
    /// Minimum enemies per worker before the parallel path pays off
    pub parallel_threshold_per_worker: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            hero_speed: 8.0,
            hero_radius: 0.3,
            attack_radius: 2.5,
            attack_cooldown: 0.5,
            hero_max_health: 100.0,
            contact_damage: 0.1,

            enemy_radius: 0.15,
            knockback: 0.05,
            respawn_delay: 2.0,
            idle_speed_min: 0.5,
            idle_speed_max: 1.5,
            chase_speed_min: 1.0,
            chase_speed_max: 2.5,

            kills_per_wave: 100,
            wave_speed_growth: 1.05,

            parallel_threshold_per_worker: 50,
        }
    }
}

impl Tuning {
    /// Speed multiplier in effect for `wave` (1-based)
    pub fn wave_speed_scale(&self, wave: u32) -> f32 {
        self.wave_speed_growth.powi(wave.saturating_sub(1) as i32)
    }

    /// Chase speed range for enemies respawning during `wave`
    pub fn chase_speed_range(&self, wave: u32) -> (f32, f32) {
        // Capped so the range stays finite on absurdly late waves
        let scale = self.wave_speed_scale(wave);
        (
            (self.chase_speed_min * scale).min(f32::MAX),
            (self.chase_speed_max * scale).min(f32::MAX),
        )
    }

    /// Reject values the simulation cannot run with: anything non-finite,
    /// negative distances, durations and speeds, and a non-positive wave growth.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("tuning.hero_speed", self.hero_speed),
            ("tuning.hero_radius", self.hero_radius),
            ("tuning.attack_radius", self.attack_radius),
            ("tuning.attack_cooldown", self.attack_cooldown),
            ("tuning.contact_damage", self.contact_damage),
            ("tuning.enemy_radius", self.enemy_radius),
            ("tuning.knockback", self.knockback),
            ("tuning.respawn_delay", self.respawn_delay),
            ("tuning.idle_speed_min", self.idle_speed_min),
            ("tuning.idle_speed_max", self.idle_speed_max),
            ("tuning.chase_speed_min", self.chase_speed_min),
            ("tuning.chase_speed_max", self.chase_speed_max),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be finite and non-negative, got {value}"),
                });
            }
        }

        let positive = [
            ("tuning.hero_max_health", self.hero_max_health),
            ("tuning.wave_speed_growth", self.wave_speed_growth),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be finite and positive, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Wave number for a cumulative kill count
    pub fn wave_for_kills(&self, kills: u32) -> u32 {
        kills / self.kills_per_wave.max(1) + 1
    }
}
