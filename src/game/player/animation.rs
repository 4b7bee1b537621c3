use nalgebra::Vector2;
use std::collections::HashMap;

use super::controller::PlayerController;
use super::input::LocomotionInput;
use super::state::MovementState;

/// Animator parameters published by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimParam {
    IsGrounded,
    IsIdling,
    IsFalling,
    IsJumping,
    IsRotatingToTarget,
    InputX,
    InputY,
    InputMagnitude,
    RotationMismatch,
    Draw,
    Sheath,
}

impl AnimParam {
    /// Parameter name as the animator controller spells it.
    pub fn name(self) -> &'static str {
        match self {
            AnimParam::IsGrounded => "isGrounded",
            AnimParam::IsIdling => "isIdling",
            AnimParam::IsFalling => "isFalling",
            AnimParam::IsJumping => "isJumping",
            AnimParam::IsRotatingToTarget => "isRotatingToTarget",
            AnimParam::InputX => "inputX",
            AnimParam::InputY => "inputY",
            AnimParam::InputMagnitude => "inputMagnitude",
            AnimParam::RotationMismatch => "rotationMismatch",
            AnimParam::Draw => "draw",
            AnimParam::Sheath => "sheath",
        }
    }
}

pub trait AnimationDriver {
    fn set_bool(&mut self, param: AnimParam, value: bool);
    fn set_float(&mut self, param: AnimParam, value: f32);
    fn set_trigger(&mut self, param: AnimParam);
}

/// In-memory animator: last value per parameter plus a trigger log.
#[derive(Debug, Default, Clone)]
pub struct ParameterSheet {
    bools: HashMap<AnimParam, bool>,
    floats: HashMap<AnimParam, f32>,
    triggers: Vec<AnimParam>,
}

impl ParameterSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_bool(&self, param: AnimParam) -> Option<bool> {
        self.bools.get(&param).copied()
    }

    pub fn get_float(&self, param: AnimParam) -> Option<f32> {
        self.floats.get(&param).copied()
    }

    pub fn triggers(&self) -> &[AnimParam] {
        &self.triggers
    }
}

impl AnimationDriver for ParameterSheet {
    fn set_bool(&mut self, param: AnimParam, value: bool) {
        self.bools.insert(param, value);
    }

    fn set_float(&mut self, param: AnimParam, value: f32) {
        self.floats.insert(param, value);
    }

    fn set_trigger(&mut self, param: AnimParam) {
        self.triggers.push(param);
    }
}

/// Maps player state onto animator parameters once per frame.
#[derive(Debug, Default)]
pub struct PlayerAnimation {
    blend_input: Vector2<f32>,
    was_weapon_drawn: bool,
}

impl PlayerAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blend_input(&self) -> Vector2<f32> {
        self.blend_input
    }

    pub fn update<A: AnimationDriver + ?Sized>(
        &mut self,
        player: &PlayerController,
        input: &LocomotionInput,
        blend_speed: f32,
        animator: &mut A,
        dt: f32,
    ) {
        let state = player.state();
        let current = state.current();

        let scale = match current {
            MovementState::Sprinting => 1.5,
            MovementState::Running => 1.0,
            _ => 0.5,
        };
        let target = input.movement * scale;
        let t = (blend_speed * dt).clamp(0.0, 1.0);
        self.blend_input = self.blend_input.lerp(&target, t);

        animator.set_bool(AnimParam::IsGrounded, state.in_grounded_state());
        animator.set_bool(AnimParam::IsIdling, current == MovementState::Idling);
        animator.set_bool(AnimParam::IsFalling, current == MovementState::Falling);
        animator.set_bool(AnimParam::IsJumping, current == MovementState::Jumping);
        animator.set_bool(
            AnimParam::IsRotatingToTarget,
            player.rig().is_rotating_to_target(),
        );

        animator.set_float(AnimParam::InputX, self.blend_input.x);
        animator.set_float(AnimParam::InputY, self.blend_input.y);
        animator.set_float(AnimParam::InputMagnitude, self.blend_input.magnitude());
        animator.set_float(AnimParam::RotationMismatch, player.rig().rotation_mismatch());

        if state.is_weapon_drawn() != self.was_weapon_drawn {
            self.was_weapon_drawn = state.is_weapon_drawn();
            let trigger = if self.was_weapon_drawn {
                AnimParam::Draw
            } else {
                AnimParam::Sheath
            };
            animator.set_trigger(trigger);
        }
    }
}
