use nalgebra::Vector3;

use super::constants::scene::PLAYER_TAG;
use super::dialogue::{DialogueManager, DialogueView, SpeakerCameras, StorySource};
use super::player::InteractionInput;

/// An NPC the player can talk to by standing in its trigger region.
#[derive(Debug, Clone)]
pub struct NpcInteraction {
    name: String,
    story_path: String,
    region_id: u64,
    position: Vector3<f32>,
    player_in_range: bool,
    visual_cue: bool,
}

impl NpcInteraction {
    pub fn new(name: &str, story_path: &str, region_id: u64, position: Vector3<f32>) -> Self {
        Self {
            name: name.to_string(),
            story_path: story_path.to_string(),
            region_id,
            position,
            player_in_range: false,
            visual_cue: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn story_path(&self) -> &str {
        &self.story_path
    }

    pub fn region_id(&self) -> u64 {
        self.region_id
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn player_in_range(&self) -> bool {
        self.player_in_range
    }

    pub fn visual_cue(&self) -> bool {
        self.visual_cue
    }

    pub fn on_trigger_enter(&mut self, tag: &str) {
        if tag == PLAYER_TAG {
            log::debug!("Player entered range of {}", self.name);
            self.player_in_range = true;
        }
    }

    pub fn on_trigger_exit(&mut self, tag: &str) {
        if tag == PLAYER_TAG {
            log::debug!("Player left range of {}", self.name);
            self.player_in_range = false;
        }
    }

    /// Shows the cue and starts dialogue on interact while the player is
    /// in range and nothing else is being said. Returns true when this NPC
    /// opened a dialogue session.
    pub fn update<S, V, C>(
        &mut self,
        input: &InteractionInput,
        dialogue: &mut DialogueManager<S, V, C>,
    ) -> bool
    where
        S: StorySource,
        V: DialogueView,
        C: SpeakerCameras,
    {
        if !self.player_in_range || dialogue.dialogue_is_playing() {
            self.visual_cue = false;
            return false;
        }

        self.visual_cue = true;
        if !input.interact_pressed {
            return false;
        }
        dialogue.enter_dialogue_mode(&self.story_path);
        dialogue.dialogue_is_playing()
    }
}
