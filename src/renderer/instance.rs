//! Per-instance data for the instanced quad pipeline

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::sim::{Enemy, Hero};

/// One drawn agent. Layout matches the instance buffer (32 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    pub offset: [f32; 2],
    pub color: [f32; 3],
    pub scale: f32,
    _padding: [f32; 2],
}

impl RenderInstance {
    pub const fn new(offset: Vec2, color: [f32; 3], scale: f32) -> Self {
        Self {
            offset: [offset.x, offset.y],
            color,
            scale,
            _padding: [0.0; 2],
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.offset)
    }

    /// Hero tinted by damage flash, greyed out once dead, scale pulsing
    pub fn hero(hero: &Hero) -> Self {
        let color = if hero.is_dead() {
            colors::HERO_DEAD
        } else {
            lerp_color(colors::HERO, colors::FLASH, hero.damage_flash.clamp(0.0, 1.0))
        };
        let scale = HERO_SCALE * (1.0 + HERO_PULSE * hero.pulse_phase.sin());
        Self::new(hero.pos, color, scale)
    }

    pub fn enemy(enemy: &Enemy, combat: bool) -> Self {
        let color = if combat { colors::ENEMY } else { colors::ENEMY_IDLE };
        Self::new(enemy.pos, color, ENEMY_SCALE)
    }
}

pub const HERO_SCALE: f32 = 0.4;
/// Fraction of the hero scale added/removed by the pulse
pub const HERO_PULSE: f32 = 0.08;
pub const ENEMY_SCALE: f32 = 0.15;

fn lerp_color(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Colors for game elements
pub mod colors {
    pub const HERO: [f32; 3] = [0.2, 0.4, 1.0];
    pub const HERO_DEAD: [f32; 3] = [0.35, 0.35, 0.4];
    /// Damage flash target
    pub const FLASH: [f32; 3] = [1.0, 1.0, 1.0];
    pub const ENEMY: [f32; 3] = [1.0, 0.2, 0.2];
    /// Enemies in peaceful mode
    pub const ENEMY_IDLE: [f32; 3] = [1.0, 0.6, 0.2];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    #[test]
    fn test_instance_layout() {
        assert_eq!(std::mem::size_of::<RenderInstance>(), 32);
        let inst = RenderInstance::new(Vec2::new(1.0, -2.0), colors::ENEMY, ENEMY_SCALE);
        let bytes: &[u8] = bytemuck::bytes_of(&inst);
        assert_eq!(bytes.len(), 32);
        assert_eq!(inst.position(), Vec2::new(1.0, -2.0));
    }

    #[test]
    fn test_hero_color_states() {
        let mut hero = Hero::new(&Tuning::default());
        assert_eq!(RenderInstance::hero(&hero).color, colors::HERO);

        hero.damage_flash = 1.0;
        let flashed = RenderInstance::hero(&hero).color;
        for (c, f) in flashed.iter().zip(colors::FLASH) {
            assert!((c - f).abs() < 1e-6);
        }

        hero.health = 0.0;
        assert_eq!(RenderInstance::hero(&hero).color, colors::HERO_DEAD);
    }
}
