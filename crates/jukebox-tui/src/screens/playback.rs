//! Playback options: live mode switches and library maintenance.
//!
//! Switches mirror the service directly. Flipping one is applied at once and
//! never goes through a settings transaction.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Position, Rect},
    Frame,
};

use jukebox_proto::PlaybackMode;

use crate::action::Action;
use crate::app_state::AppState;
use crate::screen::{Popup, Screen};
use crate::theme::style_focused_border;
use crate::widgets::controls::Controls;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackTag {
    Toggle(PlaybackMode),
    Rescan,
    Update,
    Back,
}

pub struct PlaybackOptions {
    popup: Popup,
    controls: Controls<PlaybackTag>,
}

impl PlaybackOptions {
    pub fn new(state: &AppState) -> Self {
        let mut controls = Controls::new();
        for (i, mode) in PlaybackMode::ALL.into_iter().enumerate() {
            controls = controls.switch(i as u16 / 2, PlaybackTag::Toggle(mode), mode.label(), state.modes.get(mode));
        }
        let controls = controls
            .button(2, PlaybackTag::Rescan, "Re-scan library")
            .button(2, PlaybackTag::Update, "Update library")
            .button(3, PlaybackTag::Back, "Back");
        Self {
            popup: Popup::default(),
            controls,
        }
    }
}

impl Screen for PlaybackOptions {
    type Tag = PlaybackTag;

    fn title(&self) -> &str {
        "Playback options"
    }

    fn layout(&mut self, area: Rect) {
        self.popup = Popup::layout(area, 50, 0, self.controls.height());
        self.controls.layout(self.popup.controls);
    }

    fn hit_test(&self, pos: Position) -> Option<PlaybackTag> {
        self.controls.hit_test(pos)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<PlaybackTag> {
        self.controls.handle_key(key, Some(PlaybackTag::Back))
    }

    fn on_tag(&mut self, tag: PlaybackTag, _state: &AppState) -> Vec<Action> {
        match tag {
            PlaybackTag::Toggle(mode) => vec![Action::Toggle(mode)],
            PlaybackTag::Rescan => vec![Action::RescanLibrary],
            PlaybackTag::Update => vec![Action::UpdateLibrary],
            PlaybackTag::Back => vec![Action::Close],
        }
    }

    /// Also called by the App after each toggle round trip.
    fn refresh(&mut self, state: &AppState) {
        for mode in PlaybackMode::ALL {
            self.controls.set_switch(PlaybackTag::Toggle(mode), state.modes.get(mode));
        }
    }

    fn draw(&self, frame: &mut Frame, _state: &AppState) {
        self.popup.draw_frame(frame, self.title(), style_focused_border());
        self.controls.draw(frame, true);
    }
}
