//! Third-person locomotion: movement state, vertical and lateral velocity.
//!
//! The controller runs in two phases per frame. `update` selects the
//! movement state and drives the motor; `late_update` applies look input and
//! reconciles body yaw after physics has moved the character.

use nalgebra::{Vector2, Vector3};

use super::input::LocomotionInput;
use super::motor::{ground_normal, project_on_plane, slope_angle, CharacterMotor};
use super::rotation::LookRig;
use super::state::{MovementState, PlayerState};
use crate::config::{CameraConfig, LocomotionConfig};
use crate::game::dialogue::DialogueGate;

pub struct PlayerController {
    locomotion: LocomotionConfig,
    camera: CameraConfig,
    state: PlayerState,
    rig: LookRig,

    // Lateral velocity accumulator, y is always zero
    lateral_velocity: Vector3<f32>,
    vertical_velocity: f32,
    jumped_last_frame: bool,

    // Step offset to restore after landing
    step_offset: f32,
}

impl PlayerController {
    pub fn new(locomotion: LocomotionConfig, camera: CameraConfig, step_offset: f32) -> Self {
        Self {
            locomotion,
            camera,
            state: PlayerState::new(),
            rig: LookRig::default(),
            lateral_velocity: Vector3::zeros(),
            vertical_velocity: 0.0,
            jumped_last_frame: false,
            step_offset,
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn rig(&self) -> &LookRig {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut LookRig {
        &mut self.rig
    }

    pub fn lateral_velocity(&self) -> Vector3<f32> {
        self.lateral_velocity
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    pub fn locomotion_config(&self) -> &LocomotionConfig {
        &self.locomotion
    }

    /// Main tick. Does nothing while a dialogue is playing.
    pub fn update<M: CharacterMotor + ?Sized>(
        &mut self,
        input: &LocomotionInput,
        motor: &mut M,
        dialogue: &dyn DialogueGate,
        dt: f32,
    ) {
        if dialogue.dialogue_is_playing() {
            return;
        }

        if input.weapon_toggle_pressed {
            self.state.toggle_weapon_drawn();
            log::debug!("Weapon drawn: {}", self.state.is_weapon_drawn());
        }

        self.update_movement_state(input, motor);
        self.handle_vertical_movement(input, dt);
        self.handle_lateral_movement(input, motor, dt);
    }

    /// Look and body rotation. Runs after physics, gated like `update`.
    pub fn late_update(&mut self, input: &LocomotionInput, dialogue: &dyn DialogueGate, dt: f32) {
        if dialogue.dialogue_is_playing() {
            return;
        }
        let idling = self.state.current() == MovementState::Idling;
        self.rig.update(input.look, idling, &self.camera, dt);
    }

    fn is_moving_laterally(&self) -> bool {
        let lateral = Vector2::new(self.lateral_velocity.x, self.lateral_velocity.z);
        lateral.norm() > self.locomotion.moving_threshold
    }

    fn update_movement_state<M: CharacterMotor + ?Sized>(
        &mut self,
        input: &LocomotionInput,
        motor: &mut M,
    ) {
        self.state.begin_tick();

        let movement = input.movement;
        let can_run = movement.y >= movement.x.abs();
        let is_movement_input = movement != Vector2::zeros();
        let is_moving_laterally = self.is_moving_laterally();
        let is_sprinting = input.sprint_toggled_on && is_moving_laterally;
        let is_walking = is_moving_laterally && (!can_run || input.walk_toggled_on);
        let is_grounded = self.is_grounded(motor);

        let lateral_state = if is_walking {
            MovementState::Walking
        } else if is_sprinting {
            MovementState::Sprinting
        } else if is_moving_laterally || is_movement_input {
            MovementState::Running
        } else {
            MovementState::Idling
        };

        let next = if !is_grounded || self.jumped_last_frame {
            // Airborne states suppress stepping until landing
            self.jumped_last_frame = false;
            motor.set_step_offset(0.0);
            if self.vertical_velocity > 0.0 {
                MovementState::Jumping
            } else {
                MovementState::Falling
            }
        } else {
            motor.set_step_offset(self.step_offset);
            lateral_state
        };

        if next != self.state.last() {
            log::debug!("Movement state {} -> {}", self.state.last(), next);
        }
        self.state.set_movement_state(next);
    }

    fn is_grounded<M: CharacterMotor + ?Sized>(&self, motor: &M) -> bool {
        if self.state.in_grounded_state() {
            self.is_grounded_while_grounded(motor)
        } else {
            self.is_grounded_while_airborne(motor)
        }
    }

    fn is_grounded_while_grounded<M: CharacterMotor + ?Sized>(&self, motor: &M) -> bool {
        let shape = motor.shape();
        let feet = motor.position() - Vector3::new(0.0, shape.height / 2.0, 0.0);
        let probe = feet - Vector3::new(0.0, shape.radius, 0.0);
        motor.check_sphere(probe, shape.radius)
    }

    fn is_grounded_while_airborne<M: CharacterMotor + ?Sized>(&self, motor: &M) -> bool {
        let normal = ground_normal(motor);
        motor.is_grounded() && slope_angle(&normal) <= motor.shape().slope_limit
    }

    fn handle_vertical_movement(&mut self, input: &LocomotionInput, dt: f32) {
        let cfg = &self.locomotion;
        let is_grounded = self.state.in_grounded_state();
        let anti_bump = cfg.anti_bump();

        self.vertical_velocity -= cfg.gravity * dt;

        if is_grounded && self.vertical_velocity < 0.0 {
            self.vertical_velocity = -anti_bump;
        }

        if input.jump_pressed && is_grounded {
            self.vertical_velocity += (cfg.jump_speed * 3.0 * cfg.gravity).sqrt();
            self.jumped_last_frame = true;
        }

        // Give back the downward bias on the tick we leave the ground
        if self.state.last().is_grounded() && !is_grounded {
            self.vertical_velocity += anti_bump;
        }

        let terminal = cfg.terminal_velocity.abs();
        if self.vertical_velocity < -terminal {
            self.vertical_velocity = -terminal;
        }
    }

    fn handle_lateral_movement<M: CharacterMotor + ?Sized>(
        &mut self,
        input: &LocomotionInput,
        motor: &mut M,
        dt: f32,
    ) {
        let cfg = &self.locomotion;
        let current = self.state.current();
        let is_grounded = current.is_grounded();

        let (acceleration, speed_cap, drag) = if !is_grounded {
            (cfg.in_air_acceleration, cfg.sprint_speed, cfg.in_air_drag)
        } else {
            match current {
                MovementState::Walking => (cfg.walk_acceleration, cfg.walk_speed, cfg.drag),
                MovementState::Sprinting => (cfg.sprint_acceleration, cfg.sprint_speed, cfg.drag),
                _ => (cfg.run_acceleration, cfg.run_speed, cfg.drag),
            }
        };

        let direction = self.rig.camera_right_xz() * input.movement.x
            + self.rig.camera_forward_xz() * input.movement.y;

        // Acceleration and drag are per tick, not scaled by dt
        self.lateral_velocity += direction * acceleration;
        let magnitude = self.lateral_velocity.norm();
        self.lateral_velocity = if magnitude > drag {
            self.lateral_velocity - self.lateral_velocity / magnitude * drag
        } else {
            Vector3::zeros()
        };
        self.lateral_velocity = self.lateral_velocity.cap_magnitude(speed_cap);
        self.lateral_velocity.y = 0.0;

        let mut velocity = self.lateral_velocity + Vector3::y() * self.vertical_velocity;
        if !is_grounded {
            velocity = handle_steep_walls(velocity, motor);
        }

        motor.move_by(velocity * dt);
    }
}

// Slides down walls too steep to stand on instead of sticking to them
fn handle_steep_walls<M: CharacterMotor + ?Sized>(velocity: Vector3<f32>, motor: &M) -> Vector3<f32> {
    let normal = ground_normal(motor);
    let is_steep = slope_angle(&normal) > motor.shape().slope_limit;
    if is_steep && velocity.y < 0.0 {
        project_on_plane(velocity, &normal)
    } else {
        velocity
    }
}
