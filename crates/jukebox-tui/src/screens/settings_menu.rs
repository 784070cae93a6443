use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Position, Rect},
    Frame,
};

use crate::action::{Action, ScreenKind};
use crate::app_state::AppState;
use crate::screen::{Popup, Screen};
use crate::theme::style_focused_border;
use crate::widgets::controls::Controls;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsTag {
    Quit,
    Playback,
    Mpd,
    SystemInfo,
    Back,
}

pub struct SettingsMenu {
    popup: Popup,
    controls: Controls<SettingsTag>,
}

impl SettingsMenu {
    pub fn new() -> Self {
        Self {
            popup: Popup::default(),
            controls: Controls::new()
                .button(0, SettingsTag::Quit, "Quit...")
                .button(1, SettingsTag::Playback, "Playback options")
                .button(2, SettingsTag::Mpd, "MPD settings")
                .button(3, SettingsTag::SystemInfo, "System info")
                .button(4, SettingsTag::Back, "Back"),
        }
    }
}

impl Default for SettingsMenu {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for SettingsMenu {
    type Tag = SettingsTag;

    fn title(&self) -> &str {
        "Settings"
    }

    fn layout(&mut self, area: Rect) {
        self.popup = Popup::layout(area, 36, 0, self.controls.height());
        self.controls.layout(self.popup.controls);
    }

    fn hit_test(&self, pos: Position) -> Option<SettingsTag> {
        self.controls.hit_test(pos)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<SettingsTag> {
        self.controls.handle_key(key, Some(SettingsTag::Back))
    }

    fn on_tag(&mut self, tag: SettingsTag, _state: &AppState) -> Vec<Action> {
        match tag {
            SettingsTag::Quit => vec![Action::Open(ScreenKind::Quit)],
            SettingsTag::Playback => vec![Action::Open(ScreenKind::Playback)],
            SettingsTag::Mpd => vec![Action::Open(ScreenKind::MpdSettings)],
            SettingsTag::SystemInfo => vec![Action::Open(ScreenKind::SystemInfo)],
            SettingsTag::Back => vec![Action::Close],
        }
    }

    fn draw(&self, frame: &mut Frame, _state: &AppState) {
        self.popup.draw_frame(frame, self.title(), style_focused_border());
        self.controls.draw(frame, true);
    }
}
