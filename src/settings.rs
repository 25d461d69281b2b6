//! Session settings
//!
//! Loaded from an optional JSON file; any field left out keeps its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::Modes;
use crate::tuning::Tuning;

/// Session settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed for the respawn RNG
    pub seed: u64,

    // === Population ===
    /// Enemy count at start-up
    pub initial_enemies: usize,
    /// Change applied by one increase/decrease request
    pub enemy_step: usize,
    pub min_enemies: usize,
    pub max_enemies: usize,

    // === Modes at start-up ===
    pub parallel: bool,
    pub heavy_work: bool,
    pub combat: bool,

    // === Timing ===
    /// Upper bound on a single frame's delta time (seconds)
    pub max_frame_dt: f32,

    /// Worker thread override (`None` = hardware concurrency - 1, capped)
    pub workers: Option<usize>,

    pub tuning: Tuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x1e61_0f41,

            initial_enemies: 1000,
            enemy_step: 1000,
            min_enemies: 100,
            max_enemies: 100_000,

            parallel: true,
            heavy_work: false,
            combat: true,

            max_frame_dt: crate::consts::MAX_FRAME_DT,

            workers: None,

            tuning: Tuning::default(),
        }
    }
}

impl Settings {
    /// Read and validate settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parse and validate settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Modes the engine starts with
    pub fn modes(&self) -> Modes {
        Modes {
            parallel: self.parallel,
            heavy_work: self.heavy_work,
            combat: self.combat,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_enemies > self.max_enemies {
            return Err(ConfigError::Invalid {
                field: "min_enemies",
                reason: format!("{} exceeds max_enemies {}", self.min_enemies, self.max_enemies),
            });
        }
        if !(self.min_enemies..=self.max_enemies).contains(&self.initial_enemies) {
            return Err(ConfigError::Invalid {
                field: "initial_enemies",
                reason: format!(
                    "{} outside [{}, {}]",
                    self.initial_enemies, self.min_enemies, self.max_enemies
                ),
            });
        }
        if self.max_frame_dt.is_nan() || self.max_frame_dt <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "max_frame_dt",
                reason: format!("must be positive, got {}", self.max_frame_dt),
            });
        }
        if self.workers == Some(0) {
            return Err(ConfigError::Invalid {
                field: "workers",
                reason: "must be at least 1".into(),
            });
        }
        let tuning = &self.tuning;
        tuning.validate()?;
        if tuning.kills_per_wave == 0 {
            return Err(ConfigError::Invalid {
                field: "tuning.kills_per_wave",
                reason: "must be at least 1".into(),
            });
        }
        if tuning.chase_speed_min > tuning.chase_speed_max
            || tuning.idle_speed_min > tuning.idle_speed_max
        {
            return Err(ConfigError::Invalid {
                field: "tuning",
                reason: "speed range minimum exceeds maximum".into(),
            });
        }
        Ok(())
    }

    /// Apply one increase/decrease request to `current`
    pub fn adjust_enemy_count(&self, current: usize, increase: bool) -> usize {
        let next = if increase {
            current.saturating_add(self.enemy_step)
        } else {
            current.saturating_sub(self.enemy_step)
        };
        next.clamp(self.min_enemies, self.max_enemies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "initial_enemies": 2000, "tuning": { "attack_radius": 3.0 } }"#)
            .unwrap();
        assert_eq!(settings.initial_enemies, 2000);
        assert_eq!(settings.tuning.attack_radius, 3.0);
        assert_eq!(settings.tuning.kills_per_wave, 100);
        assert!(settings.parallel);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let err = Settings::from_json(r#"{ "initial_enemies": 5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "initial_enemies", .. }));

        let err = Settings::from_json(r#"{ "max_frame_dt": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_frame_dt", .. }));

        let err = Settings::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_non_finite_tuning_rejected() {
        // 1e39 overflows f32 to infinity
        let err = Settings::from_json(r#"{ "tuning": { "chase_speed_max": 1e39 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tuning.chase_speed_max", .. }));

        let err = Settings::from_json(r#"{ "tuning": { "respawn_delay": -1.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tuning.respawn_delay", .. }));

        let err = Settings::from_json(r#"{ "tuning": { "wave_speed_growth": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tuning.wave_speed_growth", .. }));

        let err = Settings::from_json(r#"{ "tuning": { "idle_speed_min": -0.5 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tuning.idle_speed_min", .. }));
    }

    #[test]
    fn test_accepted_settings_start_a_session() {
        let settings = Settings::from_json(
            r#"{ "initial_enemies": 400, "tuning": { "chase_speed_min": 3.0, "chase_speed_max": 3.0 } }"#,
        )
        .unwrap();
        let session = crate::Session::with_scheduler(settings, None);
        assert_eq!(session.engine().enemy_count(), 400);
        assert!(session.engine().enemies().iter().all(|e| e.chase_speed == 3.0));
    }

    #[test]
    fn test_adjust_enemy_count_clamps() {
        let settings = Settings::default();
        assert_eq!(settings.adjust_enemy_count(1000, true), 2000);
        assert_eq!(settings.adjust_enemy_count(1000, false), 100);
        assert_eq!(settings.adjust_enemy_count(100_000, true), 100_000);
    }
}
