/// Locomotion state. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MovementState {
    #[default]
    Idling,
    Walking,
    Running,
    Sprinting,
    Jumping,
    Falling,
    /// Reserved for strafe animations; the transition table never selects it.
    Strafing,
}

impl MovementState {
    pub fn is_grounded(self) -> bool {
        matches!(
            self,
            MovementState::Idling
                | MovementState::Walking
                | MovementState::Running
                | MovementState::Sprinting
        )
    }

    pub fn is_airborne(self) -> bool {
        matches!(self, MovementState::Jumping | MovementState::Falling)
    }

    pub fn name(self) -> &'static str {
        match self {
            MovementState::Idling => "Idling",
            MovementState::Walking => "Walking",
            MovementState::Running => "Running",
            MovementState::Sprinting => "Sprinting",
            MovementState::Jumping => "Jumping",
            MovementState::Falling => "Falling",
            MovementState::Strafing => "Strafing",
        }
    }
}

impl std::fmt::Display for MovementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Player-wide state read by animation and other collaborators.
/// Only the locomotion core writes to it.
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    current: MovementState,
    last: MovementState,
    is_weapon_drawn: bool,
}

impl PlayerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> MovementState {
        self.current
    }

    /// State at the start of the current tick.
    pub fn last(&self) -> MovementState {
        self.last
    }

    pub fn is_weapon_drawn(&self) -> bool {
        self.is_weapon_drawn
    }

    pub fn in_grounded_state(&self) -> bool {
        self.current.is_grounded()
    }

    /// Whether `state` belongs to the grounded group.
    pub fn is_grounded_state(state: MovementState) -> bool {
        state.is_grounded()
    }

    pub(crate) fn begin_tick(&mut self) {
        self.last = self.current;
    }

    pub(crate) fn set_movement_state(&mut self, state: MovementState) {
        self.current = state;
    }

    pub(crate) fn toggle_weapon_drawn(&mut self) {
        self.is_weapon_drawn = !self.is_weapon_drawn;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grounded_states() {
        let grounded: Vec<_> = [
            MovementState::Idling,
            MovementState::Walking,
            MovementState::Running,
            MovementState::Sprinting,
            MovementState::Jumping,
            MovementState::Falling,
            MovementState::Strafing,
        ]
        .into_iter()
        .filter(|s| s.is_grounded())
        .collect();
        assert_eq!(
            grounded,
            vec![
                MovementState::Idling,
                MovementState::Walking,
                MovementState::Running,
                MovementState::Sprinting
            ]
        );
        assert!(!MovementState::Strafing.is_airborne());
    }

    #[test]
    fn test_begin_tick_records_last_state() {
        let mut state = PlayerState::new();
        state.set_movement_state(MovementState::Running);
        state.begin_tick();
        state.set_movement_state(MovementState::Falling);
        assert_eq!(state.last(), MovementState::Running);
        assert_eq!(state.current(), MovementState::Falling);
        assert!(!state.in_grounded_state());
        assert!(PlayerState::is_grounded_state(state.last()));
        assert!(!PlayerState::is_grounded_state(MovementState::Jumping));
    }
}
