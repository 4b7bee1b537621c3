//! Presentation collaborators for dialogue: the text panel and speaker cameras.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceColor {
    White,
    /// Sticky choices
    Yellow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraId {
    Npc,
    Player,
}

pub trait DialogueView {
    fn set_panel_visible(&mut self, visible: bool);
    fn set_text(&mut self, text: &str);
    /// Number of choice buttons available.
    fn slot_count(&self) -> usize;
    fn show_choice(&mut self, slot: usize, text: &str, color: ChoiceColor);
    fn hide_choice(&mut self, slot: usize);
    /// `None` clears the selection.
    fn focus(&mut self, slot: Option<usize>);
}

pub trait SpeakerCameras {
    fn set_priority(&mut self, camera: CameraId, priority: i32);
}

/// Records what a dialogue panel would display.
#[derive(Debug, Clone)]
pub struct HeadlessView {
    panel_visible: bool,
    text: String,
    slots: Vec<Option<(String, ChoiceColor)>>,
    focused: Option<usize>,
    transcript: Vec<String>,
}

impl HeadlessView {
    pub fn new(slot_count: usize) -> Self {
        Self {
            panel_visible: false,
            text: String::new(),
            slots: vec![None; slot_count],
            focused: None,
            transcript: Vec::new(),
        }
    }

    pub fn panel_visible(&self) -> bool {
        self.panel_visible
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn slot(&self, slot: usize) -> Option<(&str, ChoiceColor)> {
        self.slots
            .get(slot)
            .and_then(|s| s.as_ref())
            .map(|(text, color)| (text.as_str(), *color))
    }

    /// Visible choices in slot order.
    pub fn visible_choices(&self) -> Vec<(usize, &str, ChoiceColor)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|(text, color)| (i, text.as_str(), *color)))
            .collect()
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// Non-empty lines shown since creation or the last `take_transcript`.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Hands over the recorded lines and starts a fresh transcript.
    pub fn take_transcript(&mut self) -> Vec<String> {
        std::mem::take(&mut self.transcript)
    }
}

impl DialogueView for HeadlessView {
    fn set_panel_visible(&mut self, visible: bool) {
        self.panel_visible = visible;
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        if !text.is_empty() {
            self.transcript.push(self.text.clone());
        }
    }

    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn show_choice(&mut self, slot: usize, text: &str, color: ChoiceColor) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = Some((text.to_string(), color));
        }
    }

    fn hide_choice(&mut self, slot: usize) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = None;
        }
    }

    fn focus(&mut self, slot: Option<usize>) {
        self.focused = slot;
    }
}

/// Priority pair for the NPC and player dialogue cameras.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualCameras {
    npc: i32,
    player: i32,
}

impl VirtualCameras {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn priority(&self, camera: CameraId) -> i32 {
        match camera {
            CameraId::Npc => self.npc,
            CameraId::Player => self.player,
        }
    }

    /// Camera with the strictly highest priority, if any.
    pub fn live(&self) -> Option<CameraId> {
        use std::cmp::Ordering;
        match self.npc.cmp(&self.player) {
            Ordering::Greater => Some(CameraId::Npc),
            Ordering::Less => Some(CameraId::Player),
            Ordering::Equal => None,
        }
    }
}

impl SpeakerCameras for VirtualCameras {
    fn set_priority(&mut self, camera: CameraId, priority: i32) {
        match camera {
            CameraId::Npc => self.npc = priority,
            CameraId::Player => self.player = priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_view_ignores_missing_slots() {
        let mut view = HeadlessView::new(2);
        view.show_choice(0, "Yes", ChoiceColor::White);
        view.show_choice(5, "Out of range", ChoiceColor::Yellow);
        assert_eq!(view.visible_choices(), vec![(0, "Yes", ChoiceColor::White)]);
        view.hide_choice(0);
        assert!(view.visible_choices().is_empty());
    }

    #[test]
    fn test_transcript_skips_cleared_text() {
        let mut view = HeadlessView::new(1);
        view.set_text("NPC: Hi");
        view.set_text("");
        assert_eq!(view.text(), "");
        assert_eq!(view.transcript(), &["NPC: Hi".to_string()]);
    }

    #[test]
    fn test_take_transcript_starts_fresh() {
        let mut view = HeadlessView::new(1);
        view.set_text("NPC: Hi");
        view.set_text("Player: Hello");
        assert_eq!(view.take_transcript(), vec!["NPC: Hi", "Player: Hello"]);
        assert!(view.transcript().is_empty());

        view.set_text("NPC: Bye");
        assert_eq!(view.take_transcript(), vec!["NPC: Bye"]);
    }

    #[test]
    fn test_live_camera() {
        let mut cams = VirtualCameras::new();
        assert_eq!(cams.live(), None);
        cams.set_priority(CameraId::Player, 20);
        cams.set_priority(CameraId::Npc, 10);
        assert_eq!(cams.live(), Some(CameraId::Player));
    }
}
