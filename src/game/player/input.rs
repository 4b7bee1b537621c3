// Input state tracking for keyboard, mouse and stick
// Folds raw events into per-frame snapshots for locomotion and interaction

use nalgebra::Vector2;
use std::collections::HashSet;

/// Keys the game binds actions to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    LeftShift,
    LeftCtrl,
    /// Advance dialogue
    E,
    /// Interact with an NPC
    F,
    /// Draw or sheath weapon
    R,
    /// Choice hotkeys 1..=9
    Digit(u8),
}

impl Key {
    /// Parses the names used by CLI command scripts (`w`, `space`, `shift`, `1`...).
    pub fn parse(name: &str) -> Option<Key> {
        let key = match name.to_ascii_lowercase().as_str() {
            "w" => Key::W,
            "a" => Key::A,
            "s" => Key::S,
            "d" => Key::D,
            "space" | "jump" => Key::Space,
            "shift" | "sprint" => Key::LeftShift,
            "ctrl" | "walk" => Key::LeftCtrl,
            "e" | "advance" => Key::E,
            "f" | "interact" => Key::F,
            "r" | "weapon" => Key::R,
            other => {
                let digit: u8 = other.parse().ok()?;
                if (1..=9).contains(&digit) {
                    Key::Digit(digit)
                } else {
                    return None;
                }
            }
        };
        Some(key)
    }
}

/// Per-frame snapshot consumed by the player controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionInput {
    /// x = strafe, y = forward, each in [-1, 1]
    pub movement: Vector2<f32>,
    pub look: Vector2<f32>,
    pub jump_pressed: bool,
    pub sprint_toggled_on: bool,
    pub walk_toggled_on: bool,
    pub weapon_toggle_pressed: bool,
}

impl Default for LocomotionInput {
    fn default() -> Self {
        Self {
            movement: Vector2::zeros(),
            look: Vector2::zeros(),
            jump_pressed: false,
            sprint_toggled_on: false,
            walk_toggled_on: false,
            weapon_toggle_pressed: false,
        }
    }
}

/// Per-frame snapshot consumed by dialogue and NPC interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionInput {
    pub interact_pressed: bool,
    pub advance_pressed: bool,
    /// Zero-based choice index from a digit hotkey pressed this frame
    pub choice_pressed: Option<usize>,
}

pub struct InputState {
    keys_held: HashSet<Key>,
    // Edges seen since the last end_frame()
    keys_pressed: HashSet<Key>,

    // Look delta accumulated this frame
    look_delta: Vector2<f32>,

    // Analog stick; overrides WASD when non-zero
    stick: Vector2<f32>,

    hold_to_sprint: bool,
    sprint_toggled_on: bool,
    walk_toggled_on: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl InputState {
    pub fn new(hold_to_sprint: bool) -> Self {
        Self {
            keys_held: HashSet::new(),
            keys_pressed: HashSet::new(),
            look_delta: Vector2::zeros(),
            stick: Vector2::zeros(),
            hold_to_sprint,
            sprint_toggled_on: false,
            walk_toggled_on: false,
        }
    }

    /// Feed a key transition. Repeated presses of a held key are ignored.
    pub fn key(&mut self, key: Key, pressed: bool) {
        if pressed {
            if self.keys_held.insert(key) {
                self.keys_pressed.insert(key);
                self.on_pressed(key);
            }
        } else if self.keys_held.remove(&key) {
            self.on_released(key);
        }
    }

    pub fn look(&mut self, dx: f32, dy: f32) {
        self.look_delta += Vector2::new(dx, dy);
    }

    /// Analog movement, clamped to the unit square.
    pub fn set_stick(&mut self, x: f32, y: f32) {
        self.stick = Vector2::new(x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0));
    }

    pub fn is_key_held(&self, key: Key) -> bool {
        self.keys_held.contains(&key)
    }

    fn on_pressed(&mut self, key: Key) {
        match key {
            Key::LeftShift => {
                self.sprint_toggled_on = self.hold_to_sprint || !self.sprint_toggled_on;
            }
            Key::LeftCtrl => {
                self.walk_toggled_on = !self.walk_toggled_on;
            }
            _ => {}
        }
    }

    fn on_released(&mut self, key: Key) {
        if key == Key::LeftShift {
            self.sprint_toggled_on = !self.hold_to_sprint && self.sprint_toggled_on;
        }
    }

    fn axis(&self, positive: Key, negative: Key) -> f32 {
        let mut v = 0.0;
        if self.is_key_held(positive) {
            v += 1.0;
        }
        if self.is_key_held(negative) {
            v -= 1.0;
        }
        v
    }

    /// Movement vector: the stick when deflected, otherwise normalized WASD.
    pub fn movement(&self) -> Vector2<f32> {
        if self.stick != Vector2::zeros() {
            return self.stick;
        }
        let digital = Vector2::new(self.axis(Key::D, Key::A), self.axis(Key::W, Key::S));
        if digital.norm_squared() > 1.0 {
            digital.normalize()
        } else {
            digital
        }
    }

    pub fn locomotion(&self) -> LocomotionInput {
        LocomotionInput {
            movement: self.movement(),
            look: self.look_delta,
            jump_pressed: self.keys_pressed.contains(&Key::Space),
            sprint_toggled_on: self.sprint_toggled_on,
            walk_toggled_on: self.walk_toggled_on,
            weapon_toggle_pressed: self.keys_pressed.contains(&Key::R),
        }
    }

    pub fn interaction(&self) -> InteractionInput {
        let choice_pressed = self
            .keys_pressed
            .iter()
            .filter_map(|k| match k {
                // Digits are 1-based; Digit(0) selects nothing
                Key::Digit(d) => d.checked_sub(1).map(usize::from),
                _ => None,
            })
            .min();
        InteractionInput {
            interact_pressed: self.keys_pressed.contains(&Key::F),
            advance_pressed: self.keys_pressed.contains(&Key::E),
            choice_pressed,
        }
    }

    /// Call once per frame after every consumer has read the snapshots.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.look_delta = Vector2::zeros();
    }
}
