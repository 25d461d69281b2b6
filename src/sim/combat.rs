//! Combat, waves and respawn
//!
//! Enemy lifecycle is implicit in the `alive` flag and `death_timer`:
//! Alive -> (attack) -> Dead-pending-respawn -> (timer expires) -> Alive.
//! Everything here runs on the calling thread only; it is the sole user of
//! the RNG.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::state::{Enemy, Hero};
use crate::consts::{ARENA_MAX, ARENA_MIN};
use crate::tuning::Tuning;

/// Separation below which knockback falls back to a fixed direction
const SEPARATION_EPSILON: f32 = 1e-5;

/// Lay out `count` enemies on a square grid filling the arena
pub fn spawn_grid(count: usize, rng: &mut Pcg32, tuning: &Tuning) -> Vec<Enemy> {
    if count == 0 {
        return Vec::new();
    }

    let grid = (count as f64).sqrt().ceil() as usize;
    let spacing = (ARENA_MAX - ARENA_MIN) / (grid + 1) as f32;
    let (chase_min, chase_max) = tuning.chase_speed_range(1);

    (0..count)
        .map(|i| {
            let pos = Vec2::new(
                ARENA_MIN + spacing * ((i % grid) + 1) as f32,
                ARENA_MIN + spacing * ((i / grid) + 1) as f32,
            );
            let phase = rng.random_range(0.0..TAU);
            let idle_speed = rng.random_range(tuning.idle_speed_min..=tuning.idle_speed_max);
            let chase_speed = rng.random_range(chase_min..=chase_max);
            Enemy::new(pos, phase, idle_speed, chase_speed)
        })
        .collect()
}

/// Uniform point on one of the four arena edges (edge chosen uniformly)
pub fn random_edge_point(rng: &mut Pcg32) -> Vec2 {
    let along = rng.random_range(ARENA_MIN..=ARENA_MAX);
    match rng.random_range(0..4u32) {
        0 => Vec2::new(along, ARENA_MAX),
        1 => Vec2::new(along, ARENA_MIN),
        2 => Vec2::new(ARENA_MIN, along),
        _ => Vec2::new(ARENA_MAX, along),
    }
}

/// Dead-pending-respawn -> Alive at a random edge point
pub fn respawn(enemy: &mut Enemy, rng: &mut Pcg32, tuning: &Tuning, wave: u32) {
    let (chase_min, chase_max) = tuning.chase_speed_range(wave);
    let pos = random_edge_point(rng);
    enemy.pos = pos;
    enemy.base = pos;
    enemy.phase = rng.random_range(0.0..TAU);
    enemy.chase_speed = rng.random_range(chase_min..=chase_max);
    enemy.alive = true;
    enemy.death_timer = 0.0;
}

/// Count down death timers and respawn enemies whose timer ran out.
///
/// Returns the number of enemies respawned.
pub fn tick_respawns(
    enemies: &mut [Enemy],
    dt: f32,
    rng: &mut Pcg32,
    tuning: &Tuning,
    wave: u32,
) -> usize {
    let mut respawned = 0;
    for enemy in enemies.iter_mut().filter(|e| !e.alive) {
        enemy.death_timer -= dt;
        if enemy.death_timer <= 0.0 {
            respawn(enemy, rng, tuning, wave);
            respawned += 1;
        }
    }
    respawned
}

/// Bring `hero.wave` up to date with the kill count.
///
/// Every wave step multiplies all enemies' chase speed by the growth factor.
/// Returns true if the wave changed.
pub fn advance_wave(hero: &mut Hero, enemies: &mut [Enemy], tuning: &Tuning) -> bool {
    let target = tuning.wave_for_kills(hero.kills);
    let changed = hero.wave < target;
    while hero.wave < target {
        hero.wave += 1;
        for enemy in enemies.iter_mut() {
            enemy.chase_speed *= tuning.wave_speed_growth;
        }
        log::info!("Wave {} reached at {} kills", hero.wave, hero.kills);
    }
    changed
}

/// Kill every alive enemy strictly inside the attack radius.
///
/// Returns the number of kills.
pub fn resolve_attack(hero: &mut Hero, enemies: &mut [Enemy], tuning: &Tuning) -> u32 {
    let radius_sq = hero.attack_radius * hero.attack_radius;
    let mut kills = 0;
    for i in 0..enemies.len() {
        let enemy = &mut enemies[i];
        if enemy.alive && enemy.pos.distance_squared(hero.pos) < radius_sq {
            enemy.kill(tuning.respawn_delay);
            hero.kills += 1;
            kills += 1;
            advance_wave(hero, enemies, tuning);
        }
    }
    kills
}

/// Fire an attack if the cooldown allows it. Returns kills, or `None` if not fired.
pub fn trigger_attack(hero: &mut Hero, enemies: &mut [Enemy], tuning: &Tuning) -> Option<u32> {
    if !hero.can_attack() {
        return None;
    }
    hero.attack_triggered = true;
    hero.attack_cooldown = hero.attack_cooldown_max;
    hero.shockwave_radius = 0.0;
    hero.shockwave_alpha = 1.0;
    Some(resolve_attack(hero, enemies, tuning))
}

/// Apply contact damage and knockback for every enemy touching the hero.
///
/// Knocked-back enemies are clamped to the arena. Returns the contact count.
pub fn resolve_collisions(hero: &mut Hero, enemies: &mut [Enemy], tuning: &Tuning) -> usize {
    let reach = hero.radius + tuning.enemy_radius;
    let reach_sq = reach * reach;
    let mut contacts = 0;

    for enemy in enemies.iter_mut().filter(|e| e.alive) {
        let offset = enemy.pos - hero.pos;
        let dist_sq = offset.length_squared();
        if dist_sq >= reach_sq {
            continue;
        }
        contacts += 1;
        hero.health -= tuning.contact_damage;

        let dist = dist_sq.sqrt();
        let dir = if dist > SEPARATION_EPSILON {
            offset / dist
        } else {
            Vec2::X
        };
        enemy.pos = crate::clamp_to_arena(enemy.pos + dir * tuning.knockback);
    }

    if contacts > 0 {
        hero.health = hero.health.max(0.0);
        hero.damage_flash = 1.0;
    }
    contacts
}
