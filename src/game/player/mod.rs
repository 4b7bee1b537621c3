//! Player locomotion, look, input and animation.

pub mod animation;
pub mod controller;
pub mod input;
pub mod motor;
pub mod rotation;
pub mod state;

pub use animation::{AnimParam, AnimationDriver, ParameterSheet, PlayerAnimation};
pub use controller::PlayerController;
pub use input::{InputState, InteractionInput, Key, LocomotionInput};
pub use motor::{CapsuleShape, CharacterMotor, SurfaceHit};
pub use rotation::LookRig;
pub use state::{MovementState, PlayerState};
