//! Dialogue sessions end to end: story stepping, choice presentation,
//! deferred exit and camera switching, driven through `DialogueManager`.
//!
//! Run with: cargo test --test dialogue_flow_test -- --nocapture

use wayfarer::config::DialogueConfig;
use wayfarer::game::dialogue::{
    CameraId, ChoiceColor, DialogueManager, DialoguePhase, HeadlessView, StoryAsset,
    VirtualCameras,
};
use wayfarer::game::player::InteractionInput;

const STORY: &str = r#"{
    "knots": {
        "greeting": {
            "lines": ["NPC: Good morning.", "Player: Morning."],
            "choices": [{ "text": "See you around." }]
        },
        "hub": {
            "lines": ["NPC: What else?"],
            "choices": [
                { "text": "Ask about the road", "lines": ["NPC: It is long."], "divert": "hub" },
                { "text": "Leave", "tags": ["sticky"] }
            ]
        },
        "narration": {
            "lines": ["The wind picks up."]
        }
    }
}"#;

fn manager() -> DialogueManager {
    let story = StoryAsset::from_json_str(STORY).expect("story should parse");
    DialogueManager::new(
        story,
        HeadlessView::new(3),
        VirtualCameras::new(),
        DialogueConfig::default(),
    )
}

fn advance() -> InteractionInput {
    InteractionInput {
        advance_pressed: true,
        ..Default::default()
    }
}

fn pick(index: usize) -> InteractionInput {
    InteractionInput {
        choice_pressed: Some(index),
        ..Default::default()
    }
}

/// Ticks at 60 Hz until the dialogue closes. Returns the number of frames.
fn run_until_idle(dm: &mut DialogueManager, limit: usize) -> usize {
    for frame in 1..=limit {
        dm.tick(1.0 / 60.0);
        if !dm.dialogue_is_playing() {
            return frame;
        }
    }
    panic!("dialogue still playing after {} frames", limit);
}

// ---------------------------------------------------------------------------
// Full session
// ---------------------------------------------------------------------------

#[test]
fn test_two_lines_one_choice_then_exit() {
    let mut dm = manager();
    assert!(!dm.view().panel_visible());

    dm.enter_dialogue_mode("greeting");
    assert!(dm.dialogue_is_playing());
    assert!(dm.view().panel_visible());
    assert_eq!(dm.view().text(), "NPC: Good morning.");
    assert_eq!(dm.phase(), DialoguePhase::Continuing);
    assert!(dm.view().visible_choices().is_empty());
    assert_eq!(dm.cameras().live(), Some(CameraId::Npc));

    dm.handle_input(&advance());
    assert_eq!(dm.view().text(), "Player: Morning.");
    assert_eq!(dm.phase(), DialoguePhase::AwaitingChoice);
    assert_eq!(
        dm.view().visible_choices(),
        vec![(0, "See you around.", ChoiceColor::White)]
    );
    assert_eq!(dm.cameras().priority(CameraId::Player), 20);
    assert_eq!(dm.cameras().priority(CameraId::Npc), 10);

    // Advance does nothing while a choice is pending
    dm.handle_input(&advance());
    assert_eq!(dm.view().text(), "Player: Morning.");

    dm.handle_input(&pick(0));
    assert_eq!(dm.phase(), DialoguePhase::Exiting);
    assert!(dm.dialogue_is_playing(), "exit is deferred");
    assert!(dm.view().visible_choices().is_empty());

    let frames = run_until_idle(&mut dm, 30);
    println!("Dialogue closed after {} frames", frames);
    assert!((11..=14).contains(&frames), "exit took {} frames", frames);

    assert_eq!(dm.phase(), DialoguePhase::Idle);
    assert!(!dm.view().panel_visible());
    assert_eq!(dm.view().text(), "");
    assert_eq!(dm.cameras().priority(CameraId::Npc), 0);
    assert_eq!(dm.cameras().priority(CameraId::Player), 0);
    assert_eq!(
        dm.view().transcript(),
        &["NPC: Good morning.".to_string(), "Player: Morning.".to_string()]
    );
}

#[test]
fn test_out_of_range_choice_changes_nothing() {
    let mut dm = manager();
    dm.enter_dialogue_mode("greeting");
    dm.handle_input(&advance());

    let choices_before = dm.current_choices().to_vec();
    dm.make_choice(3);
    dm.handle_input(&pick(7));

    assert_eq!(dm.phase(), DialoguePhase::AwaitingChoice);
    assert_eq!(dm.view().text(), "Player: Morning.");
    assert_eq!(dm.current_choices(), choices_before.as_slice());
    assert_eq!(dm.view().visible_choices().len(), 1);
}

#[test]
fn test_choice_without_dialogue_is_ignored() {
    let mut dm = manager();
    dm.make_choice(0);
    assert!(!dm.dialogue_is_playing());
    assert!(!dm.view().panel_visible());
}

// ---------------------------------------------------------------------------
// Once-only and sticky choices
// ---------------------------------------------------------------------------

#[test]
fn test_once_choice_disappears_sticky_remains() {
    let mut dm = manager();
    dm.enter_dialogue_mode("hub");
    assert_eq!(
        dm.view().visible_choices(),
        vec![
            (0, "Ask about the road", ChoiceColor::White),
            (1, "Leave", ChoiceColor::Yellow)
        ]
    );

    dm.handle_input(&pick(0));
    assert_eq!(dm.view().text(), "NPC: It is long.");
    assert_eq!(dm.phase(), DialoguePhase::Continuing);

    dm.handle_input(&advance());
    assert_eq!(dm.view().text(), "NPC: What else?");
    assert_eq!(
        dm.view().visible_choices(),
        vec![(0, "Leave", ChoiceColor::Yellow)]
    );

    dm.handle_input(&pick(0));
    run_until_idle(&mut dm, 30);

    // A new session starts from a fresh interpreter
    dm.enter_dialogue_mode("hub");
    assert_eq!(dm.current_choices().len(), 2);
}

// ---------------------------------------------------------------------------
// Cameras and phases
// ---------------------------------------------------------------------------

#[test]
fn test_unprefixed_line_keeps_cameras() {
    let mut dm = manager();
    dm.enter_dialogue_mode("narration");
    assert_eq!(dm.view().text(), "The wind picks up.");
    assert_eq!(dm.cameras().live(), None);
    assert_eq!(dm.cameras().priority(CameraId::Npc), 0);

    dm.handle_input(&advance());
    assert_eq!(dm.phase(), DialoguePhase::Exiting);
    run_until_idle(&mut dm, 30);
}

#[test]
fn test_input_during_exit_is_ignored() {
    let mut dm = manager();
    dm.enter_dialogue_mode("narration");
    dm.handle_input(&advance());
    assert_eq!(dm.phase(), DialoguePhase::Exiting);

    dm.handle_input(&advance());
    dm.handle_input(&pick(0));
    assert_eq!(dm.phase(), DialoguePhase::Exiting);
    assert_eq!(dm.view().transcript().len(), 1);
}

#[test]
fn test_first_choice_focused_on_following_frame() {
    let mut dm = manager();
    dm.enter_dialogue_mode("hub");
    assert_eq!(dm.view().focused(), None);
    dm.tick(1.0 / 60.0);
    assert_eq!(dm.view().focused(), Some(0));
}

// ---------------------------------------------------------------------------
// Story errors
// ---------------------------------------------------------------------------

#[test]
fn test_story_error_on_choice_closes_dialogue() {
    // Picking "y" consumes the only choice of a knot that diverts to itself
    let json = r#"{
        "knots": {
            "a": { "lines": ["NPC: hi"], "divert": "b" },
            "b": { "choices": [{ "text": "y" }], "divert": "b" }
        }
    }"#;
    let story = StoryAsset::from_json_str(json).expect("story should parse");
    let mut dm = DialogueManager::new(
        story,
        HeadlessView::new(3),
        VirtualCameras::new(),
        DialogueConfig::default(),
    );

    dm.enter_dialogue_mode("a");
    assert_eq!(dm.phase(), DialoguePhase::AwaitingChoice);
    assert_eq!(dm.view().visible_choices(), vec![(0, "y", ChoiceColor::White)]);

    dm.make_choice(0);
    assert_eq!(dm.phase(), DialoguePhase::Exiting);
    assert!(dm.view().visible_choices().is_empty(), "stale choice still shown");

    let frames = run_until_idle(&mut dm, 600);
    println!("Dialogue closed {} frames after the failed choice", frames);
    assert!(!dm.view().panel_visible());
    assert_eq!(dm.current_choices().len(), 0);
}

