//! Dialogue sessions: stepping a story, presenting lines and choices, and
//! switching speaker cameras.
//!
//! Phases run Idle -> Continuing/AwaitingChoice -> Exiting -> Idle. The
//! exit is deferred by a short delay so the last line's input cannot leak
//! into locomotion on the same frame.

pub mod story;
pub mod view;

pub use story::{Choice, StoryAsset, StoryError, StoryInterpreter, StoryRunner, StorySource};
pub use view::{CameraId, ChoiceColor, DialogueView, HeadlessView, SpeakerCameras, VirtualCameras};

use crate::config::DialogueConfig;
use crate::game::constants::dialogue::{NPC_PREFIX, PLAYER_PREFIX};
use crate::game::player::InteractionInput;
use crate::game::scheduler::{Scheduler, TaskHandle};

/// Read-only view of whether a dialogue currently owns the player.
pub trait DialogueGate {
    fn dialogue_is_playing(&self) -> bool;
}

impl DialogueGate for bool {
    fn dialogue_is_playing(&self) -> bool {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialoguePhase {
    #[default]
    Idle,
    /// Showing a line, waiting for advance input
    Continuing,
    AwaitingChoice,
    /// Content exhausted, exit scheduled
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DialogueTask {
    ExitDialogue,
    FocusFirstChoice,
}

pub struct DialogueManager<
    S: StorySource = StoryAsset,
    V: DialogueView = HeadlessView,
    C: SpeakerCameras = VirtualCameras,
> {
    source: S,
    view: V,
    cameras: C,
    config: DialogueConfig,
    story: Option<S::Interpreter>,
    phase: DialoguePhase,
    pending_exit: Option<TaskHandle>,
    scheduler: Scheduler<DialogueTask>,
}

impl<S: StorySource, V: DialogueView, C: SpeakerCameras> DialogueManager<S, V, C> {
    pub fn new(source: S, mut view: V, cameras: C, config: DialogueConfig) -> Self {
        view.set_panel_visible(false);
        Self {
            source,
            view,
            cameras,
            config,
            story: None,
            phase: DialoguePhase::Idle,
            pending_exit: None,
            scheduler: Scheduler::new(),
        }
    }

    pub fn dialogue_is_playing(&self) -> bool {
        self.phase != DialoguePhase::Idle
    }

    pub fn phase(&self) -> DialoguePhase {
        self.phase
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn cameras(&self) -> &C {
        &self.cameras
    }

    /// Choices of the running story, empty when idle.
    pub fn current_choices(&self) -> &[Choice] {
        self.story
            .as_ref()
            .map(|s| s.current_choices())
            .unwrap_or(&[])
    }

    /// Runs deferred work that has come due. Call once at the top of a frame.
    pub fn tick(&mut self, dt: f32) {
        for task in self.scheduler.advance(dt) {
            match task {
                DialogueTask::ExitDialogue => self.exit_dialogue_mode(),
                DialogueTask::FocusFirstChoice => self.view.focus(Some(0)),
            }
        }
    }

    /// Applies this frame's advance and choice input.
    pub fn handle_input(&mut self, input: &InteractionInput) {
        match self.phase {
            DialoguePhase::AwaitingChoice => {
                if let Some(index) = input.choice_pressed {
                    self.make_choice(index);
                }
            }
            DialoguePhase::Continuing => {
                if input.advance_pressed {
                    self.continue_story();
                }
            }
            DialoguePhase::Idle | DialoguePhase::Exiting => {}
        }
    }

    pub fn enter_dialogue_mode(&mut self, path: &str) {
        let mut story = self.source.instantiate();
        if let Err(e) = story.choose_path(path) {
            log::error!("Cannot start dialogue at '{}': {}", path, e);
            return;
        }

        if let Some(handle) = self.pending_exit.take() {
            self.scheduler.cancel(handle);
            log::debug!("Re-entered dialogue before exit completed");
        }

        log::info!("Entering dialogue at '{}'", path);
        self.story = Some(story);
        self.view.set_panel_visible(true);
        self.phase = DialoguePhase::Continuing;
        self.continue_story();
    }

    pub fn continue_story(&mut self) {
        let Some(story) = self.story.as_mut() else {
            return;
        };

        if !story.can_continue() {
            self.schedule_exit();
            return;
        }

        let line = match story.continue_line() {
            Ok(line) => line,
            Err(e) => {
                log::error!("Story failed to continue: {}", e);
                self.schedule_exit();
                return;
            }
        };

        log::info!("{}", line);
        self.view.set_text(&line);
        self.apply_speaker_camera(&line);
        self.display_choices();
    }

    pub fn make_choice(&mut self, index: usize) {
        let Some(story) = self.story.as_mut() else {
            log::error!("Invalid choice index: {} (no dialogue running)", index);
            return;
        };

        let available = story.current_choices().len();
        if index >= available {
            log::error!("Invalid choice index: {} ({} available)", index, available);
            return;
        }

        let chosen = story.choose_choice_index(index);
        self.hide_choices();
        if let Err(e) = chosen {
            log::error!("Story rejected choice {}: {}", index, e);
            self.schedule_exit();
            return;
        }

        self.phase = DialoguePhase::Continuing;
        self.continue_story();
    }

    fn hide_choices(&mut self) {
        for slot in 0..self.view.slot_count() {
            self.view.hide_choice(slot);
        }
    }

    fn apply_speaker_camera(&mut self, line: &str) {
        let (active, inactive) = if line.starts_with(NPC_PREFIX) {
            (CameraId::Npc, CameraId::Player)
        } else if line.starts_with(PLAYER_PREFIX) {
            (CameraId::Player, CameraId::Npc)
        } else {
            return;
        };
        self.cameras
            .set_priority(active, self.config.active_camera_priority);
        self.cameras
            .set_priority(inactive, self.config.inactive_camera_priority);
    }

    fn display_choices(&mut self) {
        let choices: &[Choice] = self
            .story
            .as_ref()
            .map(|s| s.current_choices())
            .unwrap_or(&[]);
        let slots = self.view.slot_count();

        if choices.len() > slots {
            log::error!(
                "More choices were given than the UI can support. Number of choices given: {}",
                choices.len()
            );
        }

        let shown = choices.len().min(slots);
        for (slot, choice) in choices.iter().take(shown).enumerate() {
            let color = if choice.is_sticky() {
                ChoiceColor::Yellow
            } else {
                ChoiceColor::White
            };
            self.view.show_choice(slot, &choice.text, color);
        }
        for slot in shown..slots {
            self.view.hide_choice(slot);
        }

        self.phase = if shown > 0 {
            DialoguePhase::AwaitingChoice
        } else {
            DialoguePhase::Continuing
        };

        self.view.focus(None);
        self.scheduler.schedule(0.0, DialogueTask::FocusFirstChoice);
    }

    fn schedule_exit(&mut self) {
        if self.pending_exit.is_some() {
            return;
        }
        self.phase = DialoguePhase::Exiting;
        self.pending_exit = Some(
            self.scheduler
                .schedule(self.config.exit_delay, DialogueTask::ExitDialogue),
        );
    }

    fn exit_dialogue_mode(&mut self) {
        self.pending_exit = None;
        self.story = None;
        self.view.set_panel_visible(false);
        self.phase = DialoguePhase::Idle;
        self.view.set_text("");
        let reset = self.config.reset_camera_priority;
        self.cameras.set_priority(CameraId::Npc, reset);
        self.cameras.set_priority(CameraId::Player, reset);
        log::info!("Dialogue ended");
    }
}

impl<S: StorySource, V: DialogueView, C: SpeakerCameras> DialogueGate
    for DialogueManager<S, V, C>
{
    fn dialogue_is_playing(&self) -> bool {
        self.phase != DialoguePhase::Idle
    }
}
