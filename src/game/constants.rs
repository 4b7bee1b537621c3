//! Locomotion, camera and dialogue tuning defaults.
//! Centralizing these keeps config defaults and tests on the same numbers.

/// Lateral and vertical movement defaults.
pub mod locomotion {
    /// Per-tick acceleration while walking (unscaled by dt)
    pub const WALK_ACCELERATION: f32 = 0.15;

    /// Lateral speed cap while walking (units/second)
    pub const WALK_SPEED: f32 = 2.0;

    /// Per-tick acceleration while running
    pub const RUN_ACCELERATION: f32 = 0.25;

    /// Lateral speed cap while running
    pub const RUN_SPEED: f32 = 4.0;

    /// Per-tick acceleration while sprinting
    pub const SPRINT_ACCELERATION: f32 = 50.0;

    /// Lateral speed cap while sprinting, also the airborne cap and the anti-bump bias
    pub const SPRINT_SPEED: f32 = 7.0;

    /// Per-tick acceleration while airborne
    pub const IN_AIR_ACCELERATION: f32 = 0.15;

    /// Fixed drag magnitude subtracted each grounded tick
    pub const DRAG: f32 = 0.1;

    /// Fixed drag magnitude subtracted each airborne tick
    pub const IN_AIR_DRAG: f32 = 0.05;

    /// Gravity in units/s²
    pub const GRAVITY: f32 = 25.0;

    /// Maximum falling speed
    pub const TERMINAL_VELOCITY: f32 = 50.0;

    /// Jump tuning constant, impulse is sqrt(jump_speed * 3 * gravity)
    pub const JUMP_SPEED: f32 = 1.0;

    /// Lateral speed above which the character counts as moving
    pub const MOVING_THRESHOLD: f32 = 0.01;
}

/// Look and body rotation defaults.
pub mod camera {
    pub const LOOK_SENSE_H: f32 = 0.1;
    pub const LOOK_SENSE_V: f32 = 0.1;

    /// Vertical look clamp in degrees
    pub const LOOK_LIMIT_V: f32 = 89.0;

    /// Body slerp rate toward camera yaw (per second)
    pub const PLAYER_MODEL_ROTATION_SPEED: f32 = 10.0;

    /// Length of the idle reorientation window in seconds
    pub const ROTATE_TO_TARGET_TIME: f32 = 0.67;

    /// Idle mismatch in degrees that opens a reorientation window
    pub const ROTATION_TOLERANCE: f32 = 90.0;

    /// Animator blend-input lerp rate
    pub const LOCOMOTION_BLEND_SPEED: f32 = 4.0;
}

/// Character capsule defaults.
pub mod character {
    pub const RADIUS: f32 = 0.5;
    pub const HEIGHT: f32 = 2.0;
    pub const STEP_OFFSET: f32 = 0.3;

    /// Steepest walkable slope in degrees
    pub const SLOPE_LIMIT: f32 = 45.0;

    /// Extra reach added to the downward normal probe
    pub const NORMAL_PROBE_SKIN: f32 = 0.01;
}

/// Dialogue presentation defaults.
pub mod dialogue {
    /// Seconds between the last line and the panel closing
    pub const EXIT_DELAY: f32 = 0.2;

    /// Number of choice buttons the UI provides
    pub const CHOICE_SLOTS: usize = 3;

    /// Priority of the camera following the current speaker
    pub const ACTIVE_CAMERA_PRIORITY: i32 = 20;

    /// Priority of the other dialogue camera
    pub const INACTIVE_CAMERA_PRIORITY: i32 = 10;

    /// Priority both dialogue cameras return to on exit
    pub const RESET_CAMERA_PRIORITY: i32 = 0;

    /// Slerp rate used to turn the player toward an NPC while talking
    pub const FACE_NPC_SPEED: f32 = 5.0;

    pub const NPC_PREFIX: &str = "NPC:";
    pub const PLAYER_PREFIX: &str = "Player:";

    pub const STICKY_TAG: &str = "sticky";
}

/// Physics world defaults.
pub mod physics {
    /// Fixed timestep for the frame loop (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;

    /// Character controller offset kept from surfaces
    pub const CONTROLLER_OFFSET: f32 = 0.02;

    /// Character controller snap to ground distance
    pub const SNAP_TO_GROUND: f32 = 0.2;
}

/// Scene tags and ids.
pub mod scene {
    pub const PLAYER_TAG: &str = "Player";

    /// Character id of the player in the physics world
    pub const PLAYER_ID: u64 = 1;

    /// NPC trigger region ids start here
    pub const FIRST_NPC_REGION_ID: u64 = 1000;
}
