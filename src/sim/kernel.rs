//! Enemy update kernel
//!
//! The per-enemy update is a pure function of the enemy's own record and a
//! read-only [`FrameParams`] snapshot, so the sequential path and the worker
//! pool path produce identical positions no matter how threads interleave.

use std::ops::Range;

use glam::Vec2;

use super::state::Enemy;
use crate::clamp_to_arena;
use crate::error::SchedulerError;
use crate::scheduler::{MAX_WORKERS, TaskScheduler};

/// Below this distance an enemy is considered on top of the hero and holds still
pub const PURSUIT_EPSILON: f32 = 1e-3;
/// Strength of the sideways wobble mixed into pursuit
pub const WOBBLE_AMPLITUDE: f32 = 0.35;
pub const WOBBLE_FREQUENCY: f32 = 3.0;
/// Radius of the peaceful-mode oscillation around the base position
pub const IDLE_AMPLITUDE: f32 = 0.25;
/// How much the synthetic workload result nudges x
pub const WORKLOAD_PERTURBATION: f32 = 1e-6;

/// Read-only per-batch snapshot shared by every task
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub hero_pos: Vec2,
    /// Elapsed simulation time (seconds)
    pub time: f32,
    pub dt: f32,
    pub combat: bool,
    pub heavy_work: bool,
}

/// Injectable CPU cost used to benchmark the scheduler.
///
/// Must be a deterministic function of its inputs.
pub trait Workload: Send + Sync {
    fn run(&self, enemy: &Enemy, time: f32) -> f32;
}

/// Fixed-iteration trig/tanh accumulation
#[derive(Debug, Clone, Copy)]
pub struct SyntheticLoad {
    pub iterations: u32,
}

impl Default for SyntheticLoad {
    fn default() -> Self {
        Self { iterations: 50 }
    }
}

impl Workload for SyntheticLoad {
    fn run(&self, enemy: &Enemy, time: f32) -> f32 {
        let mut acc = 0.0f32;
        for i in 0..self.iterations {
            let k = i as f32 * 0.1;
            acc += (enemy.pos.x * k + time).sin() * (enemy.pos.y * k + enemy.phase).cos();
            acc = acc.tanh();
        }
        acc
    }
}

/// Split `count` items into `jobs` contiguous ranges.
///
/// Each range gets `count / jobs` items and the first `count % jobs` ranges
/// one extra, so the ranges tile `0..count` exactly and differ in length by
/// at most one.
pub fn partition(count: usize, jobs: usize) -> Vec<Range<usize>> {
    let jobs = jobs.max(1);
    let base = count / jobs;
    let extra = count % jobs;

    let mut ranges = Vec::with_capacity(jobs);
    let mut start = 0;
    for job in 0..jobs {
        let len = base + usize::from(job < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Advance one enemy by one frame. Dead enemies are left untouched.
#[inline]
pub fn update_enemy(enemy: &mut Enemy, frame: &FrameParams, workload: &dyn Workload) {
    if !enemy.alive {
        return;
    }

    if frame.combat {
        let to_hero = frame.hero_pos - enemy.pos;
        let dist = to_hero.length();
        if dist > PURSUIT_EPSILON {
            let dir = to_hero / dist;
            let wobble_t = frame.time * WOBBLE_FREQUENCY + enemy.phase;
            let wobble = Vec2::new(wobble_t.sin(), (wobble_t * 1.3).cos()) * WOBBLE_AMPLITUDE;
            let heading = (dir + wobble).normalize_or_zero();
            enemy.pos += heading * enemy.chase_speed * frame.dt;
        }
    } else {
        let t = frame.time * enemy.idle_speed;
        let offset = Vec2::new(
            (t + enemy.phase).sin(),
            (t * 0.7 + enemy.phase * 1.3).cos(),
        );
        enemy.pos = enemy.base + offset * IDLE_AMPLITUDE;
    }

    if frame.heavy_work {
        enemy.pos.x += workload.run(enemy, frame.time) * WORKLOAD_PERTURBATION;
    }

    enemy.pos = clamp_to_arena(enemy.pos);
}

pub fn update_slice(enemies: &mut [Enemy], frame: &FrameParams, workload: &dyn Workload) {
    for enemy in enemies {
        update_enemy(enemy, frame, workload);
    }
}

/// Single-threaded reference path
pub fn update_sequential(enemies: &mut [Enemy], frame: &FrameParams, workload: &dyn Workload) {
    update_slice(enemies, frame, workload);
}

/// Fork-join path: one disjoint slice per task, barrier before returning
pub fn update_parallel(
    scheduler: &TaskScheduler,
    enemies: &mut [Enemy],
    frame: FrameParams,
    workload: &dyn Workload,
) -> Result<(), SchedulerError> {
    let jobs = scheduler.worker_count().clamp(1, MAX_WORKERS);
    let ranges = partition(enemies.len(), jobs);

    scheduler.scope(move |scope| {
        let mut rest = enemies;
        for range in ranges {
            let (slice, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
            rest = tail;
            if slice.is_empty() {
                continue;
            }
            scope.submit(move || update_slice(slice, &frame, workload));
        }
    })
}
