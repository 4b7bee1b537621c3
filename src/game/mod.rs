pub mod constants;
pub mod dialogue;
pub mod interaction;
pub mod physics;
pub mod player;
pub mod scheduler;
pub mod touch_events;

use nalgebra::Vector3;
use serde::Serialize;
use std::collections::HashSet;

use crate::config::WayfarerConfig;
use constants::scene::{FIRST_NPC_REGION_ID, PLAYER_ID, PLAYER_TAG};
use dialogue::{DialogueGate, DialogueManager, DialoguePhase, HeadlessView, StoryAsset, VirtualCameras};
use interaction::NpcInteraction;
use physics::PhysicsWorld;
use player::{
    CapsuleShape, InputState, MovementState, ParameterSheet, PlayerAnimation, PlayerController,
};
use touch_events::{compute_touch_transitions, OverlapPair};

/// Point-in-time view of the game, printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub frame: u64,
    pub state: String,
    pub position: [f32; 3],
    pub lateral_speed: f32,
    pub vertical_velocity: f32,
    pub camera_yaw: f32,
    pub camera_pitch: f32,
    pub body_yaw: f32,
    pub rotation_mismatch: f32,
    pub weapon_drawn: bool,
    pub dialogue_playing: bool,
    pub dialogue_text: String,
    pub choices: Vec<String>,
    pub npcs_in_range: Vec<String>,
}

/// One player in a static scene, plus NPCs and an optional dialogue runtime.
pub struct Game {
    config: WayfarerConfig,
    physics: PhysicsWorld,
    player: PlayerController,
    animation: PlayerAnimation,
    animator: ParameterSheet,
    input: InputState,
    dialogue: Option<DialogueManager>,
    npcs: Vec<NpcInteraction>,
    /// Index into `npcs` of the NPC whose dialogue is running
    speaking_npc: Option<usize>,
    overlaps: HashSet<OverlapPair>,
    frame_count: u64,
}

impl Game {
    pub fn builder(config: WayfarerConfig) -> GameBuilder {
        GameBuilder::new(config)
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn animator(&self) -> &ParameterSheet {
        &self.animator
    }

    pub fn dialogue(&self) -> Option<&DialogueManager> {
        self.dialogue.as_ref()
    }

    pub fn dialogue_mut(&mut self) -> Option<&mut DialogueManager> {
        self.dialogue.as_mut()
    }

    pub fn npcs(&self) -> &[NpcInteraction] {
        &self.npcs
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn dialogue_is_playing(&self) -> bool {
        self.dialogue
            .as_ref()
            .is_some_and(|d| d.dialogue_is_playing())
    }

    pub fn player_position(&self) -> Vector3<f32> {
        self.physics
            .get_character_position(PLAYER_ID)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Runs one frame: deferred dialogue work, update, physics, animation,
    /// late update, then clears per-frame input.
    pub fn frame(&mut self, dt: f32) {
        if let Some(dialogue) = self.dialogue.as_mut() {
            dialogue.tick(dt);
        }

        let locomotion = self.input.locomotion();
        let interaction = self.input.interaction();

        // Update
        {
            let gate: &dyn DialogueGate = match &self.dialogue {
                Some(d) => d,
                None => &false,
            };
            if let Some(mut motor) = self.physics.character(PLAYER_ID) {
                self.player.update(&locomotion, &mut motor, gate, dt);
            }
        }
        if let Some(dialogue) = self.dialogue.as_mut() {
            dialogue.handle_input(&interaction);
            for (i, npc) in self.npcs.iter_mut().enumerate() {
                if npc.update(&interaction, dialogue) {
                    self.speaking_npc = Some(i);
                }
            }
        }

        // Physics
        self.physics.step(dt);
        self.refresh_overlaps();

        // Animation
        self.animation.update(
            &self.player,
            &locomotion,
            self.config.camera.locomotion_blend_speed,
            &mut self.animator,
            dt,
        );

        // Late update
        if self.dialogue_is_playing() {
            self.face_speaking_npc(dt);
        } else {
            self.speaking_npc = None;
            self.player.late_update(&locomotion, &false, dt);
        }

        self.input.end_frame();
        self.frame_count += 1;
    }

    fn refresh_overlaps(&mut self) {
        let current = self.physics.detect_overlaps();
        let transitions = compute_touch_transitions(&current, &self.overlaps);

        for (character, region) in transitions.entered {
            let tag = self.physics.character_tag(character).unwrap_or_default();
            for npc in self.npcs.iter_mut().filter(|n| n.region_id() == region) {
                npc.on_trigger_enter(tag);
            }
        }
        for (character, region) in transitions.exited {
            let tag = self.physics.character_tag(character).unwrap_or_default();
            for npc in self.npcs.iter_mut().filter(|n| n.region_id() == region) {
                npc.on_trigger_exit(tag);
            }
        }

        self.overlaps = current;
    }

    fn face_speaking_npc(&mut self, dt: f32) {
        let position = self.player_position();
        let Some(npc) = self.speaking_npc.and_then(|i| self.npcs.get(i)) else {
            return;
        };
        let direction = npc.position() - position;
        self.player
            .rig_mut()
            .face_towards(direction, self.config.dialogue.face_npc_speed, dt);
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let rig = self.player.rig();
        let position = self.player_position();
        let (dialogue_text, choices) = match &self.dialogue {
            Some(d) if d.dialogue_is_playing() => (
                d.view().text().to_string(),
                d.current_choices().iter().map(|c| c.text.clone()).collect(),
            ),
            _ => (String::new(), Vec::new()),
        };

        GameSnapshot {
            frame: self.frame_count,
            state: self.player.state().current().to_string(),
            position: [position.x, position.y, position.z],
            lateral_speed: self.player.lateral_velocity().norm(),
            vertical_velocity: self.player.vertical_velocity(),
            camera_yaw: rig.camera_yaw(),
            camera_pitch: rig.camera_pitch(),
            body_yaw: rig.body_yaw(),
            rotation_mismatch: rig.rotation_mismatch(),
            weapon_drawn: self.player.state().is_weapon_drawn(),
            dialogue_playing: self.dialogue_is_playing(),
            dialogue_text,
            choices,
            npcs_in_range: self
                .npcs
                .iter()
                .filter(|n| n.player_in_range())
                .map(|n| n.name().to_string())
                .collect(),
        }
    }

    /// NPC whose dialogue is running, if any.
    pub fn speaking_npc(&self) -> Option<&NpcInteraction> {
        self.speaking_npc.and_then(|i| self.npcs.get(i))
    }

    pub fn movement_state(&self) -> MovementState {
        self.player.state().current()
    }

    pub fn dialogue_phase(&self) -> DialoguePhase {
        self.dialogue
            .as_ref()
            .map(|d| d.phase())
            .unwrap_or_default()
    }
}

/// Assembles a [`Game`] from config.
pub struct GameBuilder {
    config: WayfarerConfig,
    dialogue: Option<DialogueManager>,
}

impl GameBuilder {
    pub fn new(config: WayfarerConfig) -> Self {
        Self {
            config,
            dialogue: None,
        }
    }

    /// Registers the dialogue manager. Only one may exist; a second
    /// registration replaces the first.
    pub fn dialogue_manager(mut self, manager: DialogueManager) -> Self {
        if self.dialogue.is_some() {
            log::warn!("Found more than one dialogue manager in the scene, using the latest");
        }
        self.dialogue = Some(manager);
        self
    }

    /// Registers a dialogue manager over `story` with headless presentation.
    pub fn story(self, story: StoryAsset) -> Self {
        let dialogue_config = self.config.dialogue.clone();
        let view = HeadlessView::new(dialogue_config.choice_slots);
        let manager = DialogueManager::new(story, view, VirtualCameras::new(), dialogue_config);
        self.dialogue_manager(manager)
    }

    pub fn build(self) -> Game {
        let config = self.config;
        let mut physics = PhysicsWorld::new();

        for block in &config.scene.blocks {
            physics.add_block(block.position, block.size, block.rotation);
        }

        let character = &config.character;
        let shape = CapsuleShape {
            radius: character.radius,
            height: character.height,
            step_offset: character.step_offset,
            slope_limit: character.slope_limit,
        };
        physics.add_character(PLAYER_ID, character.spawn, shape, PLAYER_TAG);

        let mut npcs = Vec::with_capacity(config.scene.npcs.len());
        for (i, npc) in config.scene.npcs.iter().enumerate() {
            let region_id = FIRST_NPC_REGION_ID + i as u64;
            physics.add_trigger_region(region_id, npc.position, npc.trigger_radius);
            npcs.push(NpcInteraction::new(
                &npc.name,
                &npc.story_path,
                region_id,
                Vector3::from(npc.position),
            ));
        }
        if self.dialogue.is_none() && !npcs.is_empty() {
            log::warn!("Scene has NPCs but no dialogue manager; interactions are disabled");
        }

        // Populate the query pipeline before the first frame
        physics.step(constants::physics::TIMESTEP);

        log::info!(
            "Scene built: {} blocks, {} npcs",
            config.scene.blocks.len(),
            npcs.len()
        );

        Game {
            player: PlayerController::new(
                config.locomotion.clone(),
                config.camera.clone(),
                character.step_offset,
            ),
            input: InputState::new(config.locomotion.hold_to_sprint),
            physics,
            animation: PlayerAnimation::new(),
            animator: ParameterSheet::new(),
            dialogue: self.dialogue,
            npcs,
            speaking_npc: None,
            overlaps: HashSet::new(),
            frame_count: 0,
            config,
        }
    }
}
