//! Tuning and scene configuration parsing from wayfarer.toml files

use serde::Deserialize;
use std::path::Path;

use crate::game::constants::{camera, character, dialogue, locomotion};

/// Lateral/vertical movement tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    pub walk_acceleration: f32,
    pub walk_speed: f32,
    pub run_acceleration: f32,
    pub run_speed: f32,
    pub sprint_acceleration: f32,
    pub sprint_speed: f32,
    pub in_air_acceleration: f32,
    pub drag: f32,
    pub in_air_drag: f32,
    pub gravity: f32,
    pub terminal_velocity: f32,
    pub jump_speed: f32,
    pub moving_threshold: f32,
    /// Sprint while the key is held instead of toggling on each press
    pub hold_to_sprint: bool,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            walk_acceleration: locomotion::WALK_ACCELERATION,
            walk_speed: locomotion::WALK_SPEED,
            run_acceleration: locomotion::RUN_ACCELERATION,
            run_speed: locomotion::RUN_SPEED,
            sprint_acceleration: locomotion::SPRINT_ACCELERATION,
            sprint_speed: locomotion::SPRINT_SPEED,
            in_air_acceleration: locomotion::IN_AIR_ACCELERATION,
            drag: locomotion::DRAG,
            in_air_drag: locomotion::IN_AIR_DRAG,
            gravity: locomotion::GRAVITY,
            terminal_velocity: locomotion::TERMINAL_VELOCITY,
            jump_speed: locomotion::JUMP_SPEED,
            moving_threshold: locomotion::MOVING_THRESHOLD,
            hold_to_sprint: true,
        }
    }
}

impl LocomotionConfig {
    /// Downward bias applied while grounded. Tied to sprint speed so slopes
    /// taken at full speed keep contact.
    pub fn anti_bump(&self) -> f32 {
        self.sprint_speed
    }
}

/// Look sensitivity and body rotation tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub look_sense_h: f32,
    pub look_sense_v: f32,
    pub look_limit_v: f32,
    pub player_model_rotation_speed: f32,
    pub rotate_to_target_time: f32,
    pub rotation_tolerance: f32,
    pub locomotion_blend_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            look_sense_h: camera::LOOK_SENSE_H,
            look_sense_v: camera::LOOK_SENSE_V,
            look_limit_v: camera::LOOK_LIMIT_V,
            player_model_rotation_speed: camera::PLAYER_MODEL_ROTATION_SPEED,
            rotate_to_target_time: camera::ROTATE_TO_TARGET_TIME,
            rotation_tolerance: camera::ROTATION_TOLERANCE,
            locomotion_blend_speed: camera::LOCOMOTION_BLEND_SPEED,
        }
    }
}

/// Character capsule shape
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    pub radius: f32,
    pub height: f32,
    pub step_offset: f32,
    /// Steepest walkable slope in degrees
    pub slope_limit: f32,
    pub spawn: [f32; 3],
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            radius: character::RADIUS,
            height: character::HEIGHT,
            step_offset: character::STEP_OFFSET,
            slope_limit: character::SLOPE_LIMIT,
            spawn: [0.0, character::HEIGHT / 2.0 + 0.05, 0.0],
        }
    }
}

/// Dialogue presentation tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    pub exit_delay: f32,
    pub choice_slots: usize,
    pub active_camera_priority: i32,
    pub inactive_camera_priority: i32,
    pub reset_camera_priority: i32,
    pub face_npc_speed: f32,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            exit_delay: dialogue::EXIT_DELAY,
            choice_slots: dialogue::CHOICE_SLOTS,
            active_camera_priority: dialogue::ACTIVE_CAMERA_PRIORITY,
            inactive_camera_priority: dialogue::INACTIVE_CAMERA_PRIORITY,
            reset_camera_priority: dialogue::RESET_CAMERA_PRIORITY,
            face_npc_speed: dialogue::FACE_NPC_SPEED,
        }
    }
}

/// Static block in the scene (walls, floors, ramps)
#[derive(Debug, Clone, Deserialize)]
pub struct BlockConfig {
    pub position: [f32; 3],
    pub size: [f32; 3],
    /// Euler rotation in degrees (roll, pitch, yaw)
    #[serde(default)]
    pub rotation: [f32; 3],
}

/// NPC with a dialogue trigger region
#[derive(Debug, Clone, Deserialize)]
pub struct NpcConfig {
    pub name: String,
    pub position: [f32; 3],
    /// Radius of the interaction trigger around the NPC
    #[serde(default = "default_trigger_radius")]
    pub trigger_radius: f32,
    /// Story knot entered when the player interacts
    pub story_path: String,
}

fn default_trigger_radius() -> f32 {
    2.0
}

/// Scene layout section
#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_blocks")]
    pub blocks: Vec<BlockConfig>,
    #[serde(default)]
    pub npcs: Vec<NpcConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            blocks: default_blocks(),
            npcs: Vec::new(),
        }
    }
}

/// A single floor slab with its top face at y=0.
fn default_blocks() -> Vec<BlockConfig> {
    vec![BlockConfig {
        position: [0.0, -0.5, 0.0],
        size: [200.0, 1.0, 200.0],
        rotation: [0.0, 0.0, 0.0],
    }]
}

/// Full configuration from wayfarer.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WayfarerConfig {
    #[serde(default)]
    pub locomotion: LocomotionConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub character: CharacterConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
    #[serde(default)]
    pub scene: SceneConfig,
}

impl WayfarerConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;

        Self::from_toml_str(&content).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load from `path` if given, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::path::PathBuf, std::io::Error),
    ParseError(std::path::PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "Failed to read {}: {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = WayfarerConfig::from_toml_str("").unwrap();
        assert_eq!(config.locomotion.run_speed, 4.0);
        assert_eq!(config.locomotion.anti_bump(), config.locomotion.sprint_speed);
        assert_eq!(config.camera.rotation_tolerance, 90.0);
        assert_eq!(config.dialogue.choice_slots, 3);
        assert_eq!(config.scene.blocks.len(), 1);
        assert!(config.scene.npcs.is_empty());
    }

    #[test]
    fn test_parse_partial_sections() {
        let toml = r#"
            [locomotion]
            run_speed = 5.5
            hold_to_sprint = false

            [dialogue]
            choice_slots = 4

            [[scene.blocks]]
            position = [0.0, -0.5, 0.0]
            size = [10.0, 1.0, 10.0]

            [[scene.blocks]]
            position = [6.0, 1.0, 0.0]
            size = [4.0, 0.2, 4.0]
            rotation = [60.0, 0.0, 0.0]

            [[scene.npcs]]
            name = "guard"
            position = [3.0, 1.0, 0.0]
            story_path = "guard"
        "#;
        let config = WayfarerConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.locomotion.run_speed, 5.5);
        assert_eq!(config.locomotion.walk_speed, 2.0);
        assert!(!config.locomotion.hold_to_sprint);
        assert_eq!(config.dialogue.choice_slots, 4);
        assert_eq!(config.scene.blocks.len(), 2);
        assert_eq!(config.scene.blocks[1].rotation, [60.0, 0.0, 0.0]);
        assert_eq!(config.scene.npcs[0].trigger_radius, 2.0);
        assert_eq!(config.scene.npcs[0].story_path, "guard");
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = WayfarerConfig::from_file(Path::new("/nonexistent/wayfarer.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/wayfarer.toml"));
    }
}
