//! Per-frame driver
//!
//! Sits between the platform layer and the engine: clamps the frame delta,
//! turns raw input snapshots into held/pressed pairs, services enemy-count
//! and restart requests by reinitialising the engine, and measures FPS.

use crate::scheduler::TaskScheduler;
use crate::settings::Settings;
use crate::sim::{FrameInput, InputState, ProfilingStats, SimulationEngine};

/// Frames-per-second over one-second windows
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    frames: u32,
    elapsed: f64,
    fps: f64,
}

impl FpsCounter {
    /// Record one frame; returns the new FPS when a window closes
    pub fn tick(&mut self, dt: f64) -> Option<f64> {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed >= 1.0 {
            self.fps = self.frames as f64 / self.elapsed;
            self.frames = 0;
            self.elapsed = 0.0;
            return Some(self.fps);
        }
        None
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }
}

/// A running simulation plus its optional worker pool
pub struct Session {
    settings: Settings,
    engine: SimulationEngine,
    scheduler: Option<TaskScheduler>,
    previous: InputState,
    fps: FpsCounter,
}

impl Session {
    /// Start a session, spawning a worker pool if the machine allows it
    pub fn new(settings: Settings) -> Self {
        let scheduler = match settings.workers {
            Some(workers) => TaskScheduler::with_workers(workers),
            None => TaskScheduler::new(),
        };
        let scheduler = match scheduler {
            Ok(scheduler) => Some(scheduler),
            Err(err) => {
                log::warn!("Running without a worker pool: {err}");
                None
            }
        };
        Self::with_scheduler(settings, scheduler)
    }

    /// Start a session with an explicit scheduler (`None` forces sequential updates)
    pub fn with_scheduler(settings: Settings, scheduler: Option<TaskScheduler>) -> Self {
        let engine = SimulationEngine::new(
            settings.initial_enemies,
            settings.seed,
            settings.tuning.clone(),
            settings.modes(),
        );
        Self {
            settings,
            engine,
            scheduler,
            previous: InputState::default(),
            fps: FpsCounter::default(),
        }
    }

    /// Run one frame with the raw wall-clock delta and the current input snapshot
    pub fn frame(&mut self, raw_dt: f32, input: &InputState) {
        let dt = if raw_dt.is_finite() {
            raw_dt.clamp(0.0, self.settings.max_frame_dt)
        } else {
            0.0
        };

        let frame_input = FrameInput::diff(&self.previous, input);
        self.previous = *input;

        self.handle_requests(&frame_input.pressed);
        self.engine
            .update(dt, &frame_input, self.scheduler.as_ref());

        if let Some(fps) = self.fps.tick(f64::from(raw_dt.max(0.0))) {
            log::debug!("FPS: {:.0} | Instances: {}", fps, self.engine.instances().len());
        }
    }

    fn handle_requests(&mut self, pressed: &InputState) {
        let adjust = match (pressed.increase_enemies, pressed.decrease_enemies) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        };

        if let Some(increase) = adjust {
            let current = self.engine.enemy_count();
            let next = self.settings.adjust_enemy_count(current, increase);
            if next != current {
                log::info!("Enemy count {} -> {}", current, next);
                self.engine.reset(next);
                return;
            }
        }

        if pressed.restart {
            log::info!("Restart requested");
            self.engine.reset(self.engine.enemy_count());
        }
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SimulationEngine {
        &mut self.engine
    }

    pub fn scheduler(&self) -> Option<&TaskScheduler> {
        self.scheduler.as_ref()
    }

    pub fn stats(&self) -> &ProfilingStats {
        self.engine.stats()
    }

    pub fn fps(&self) -> f64 {
        self.fps.fps()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential_session() -> Session {
        Session::with_scheduler(Settings::default(), None)
    }

    #[test]
    fn test_frame_dt_is_clamped() {
        let mut session = sequential_session();
        session.frame(5.0, &InputState::default());
        assert!((session.engine().time() - session.settings().max_frame_dt).abs() < 1e-6);

        session.frame(f32::NAN, &InputState::default());
        assert!((session.engine().time() - session.settings().max_frame_dt).abs() < 1e-6);
    }

    #[test]
    fn test_enemy_count_adjusts_once_per_press() {
        let mut session = sequential_session();
        let held = InputState {
            increase_enemies: true,
            ..Default::default()
        };
        session.frame(0.016, &held);
        session.frame(0.016, &held);
        assert_eq!(session.engine().enemy_count(), 2000);

        session.frame(0.016, &InputState::default());
        session.frame(
            0.016,
            &InputState {
                decrease_enemies: true,
                ..Default::default()
            },
        );
        assert_eq!(session.engine().enemy_count(), 1000);
        assert_eq!(session.stats().enemy_count, 1000);
    }

    #[test]
    fn test_restart_reinitializes() {
        let mut session = sequential_session();
        for _ in 0..30 {
            session.frame(0.016, &InputState::default());
        }
        assert!(session.engine().time() > 0.0);

        session.frame(
            0.016,
            &InputState {
                restart: true,
                ..Default::default()
            },
        );
        // Reset happens before the frame's update
        assert!((session.engine().time() - 0.016).abs() < 1e-6);
        assert_eq!(session.engine().hero().kills, 0);
        assert_eq!(session.engine().enemy_count(), 1000);
    }

    #[test]
    fn test_session_with_pool_runs_parallel() {
        let scheduler = TaskScheduler::with_workers(2).unwrap();
        let mut session = Session::with_scheduler(Settings::default(), Some(scheduler));
        session.frame(0.016, &InputState::default());
        assert!(session.stats().parallel_used);
        assert_eq!(session.stats().worker_count, 2);
    }

    #[test]
    fn test_fps_counter_window() {
        let mut fps = FpsCounter::default();
        for _ in 0..59 {
            assert!(fps.tick(1.0 / 60.0).is_none());
        }
        let measured = fps.tick(1.0 / 60.0 + 1e-9).unwrap();
        assert!((measured - 60.0).abs() < 0.01);
    }
}
