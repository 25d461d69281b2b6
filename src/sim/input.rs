//! Per-frame input
//!
//! The platform layer produces an [`InputState`] snapshot of what is held
//! down. Edge-triggered actions (attack, toggles, restart) are derived once
//! per frame by diffing against the previous snapshot, so the simulation
//! never stores press history of its own.

/// Held state of every input this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub move_up: bool,
    pub move_down: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub attack: bool,
    pub toggle_parallel: bool,
    pub toggle_heavy_work: bool,
    pub toggle_combat: bool,
    pub increase_enemies: bool,
    pub decrease_enemies: bool,
    pub restart: bool,
}

impl InputState {
    /// Inputs held now that were not held in `previous`
    pub fn rising_edges(&self, previous: &InputState) -> InputState {
        InputState {
            move_up: self.move_up && !previous.move_up,
            move_down: self.move_down && !previous.move_down,
            move_left: self.move_left && !previous.move_left,
            move_right: self.move_right && !previous.move_right,
            attack: self.attack && !previous.attack,
            toggle_parallel: self.toggle_parallel && !previous.toggle_parallel,
            toggle_heavy_work: self.toggle_heavy_work && !previous.toggle_heavy_work,
            toggle_combat: self.toggle_combat && !previous.toggle_combat,
            increase_enemies: self.increase_enemies && !previous.increase_enemies,
            decrease_enemies: self.decrease_enemies && !previous.decrease_enemies,
            restart: self.restart && !previous.restart,
        }
    }
}

/// Input handed to the engine for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// What is held this frame (movement)
    pub held: InputState,
    /// What went down this frame (attack, toggles)
    pub pressed: InputState,
}

impl FrameInput {
    pub fn diff(previous: &InputState, current: &InputState) -> Self {
        Self {
            held: *current,
            pressed: current.rising_edges(previous),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rising_edge_only_on_press() {
        let idle = InputState::default();
        let attacking = InputState {
            attack: true,
            move_left: true,
            ..Default::default()
        };

        let first = FrameInput::diff(&idle, &attacking);
        assert!(first.pressed.attack);
        assert!(first.held.move_left);

        // Held across frames: no new edge
        let second = FrameInput::diff(&attacking, &attacking);
        assert!(!second.pressed.attack);
        assert!(second.held.attack);

        // Released
        let third = FrameInput::diff(&attacking, &idle);
        assert_eq!(third.pressed, InputState::default());
    }
}
