//! Root screen: connection status, playback flags, and the way into settings.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use jukebox_proto::PlaybackMode;

use crate::action::{Action, ScreenKind};
use crate::app_state::AppState;
use crate::screen::{Popup, Screen};
use crate::theme::{
    style_default, style_focused_border, style_secondary, C_ACCENT, C_PLAYING, C_SWITCH_OFF,
    C_SWITCH_ON,
};
use crate::widgets::controls::Controls;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeTag {
    Settings,
    Quit,
}

pub struct Home {
    popup: Popup,
    controls: Controls<HomeTag>,
}

const BODY_ROWS: u16 = 4;

impl Home {
    pub fn new() -> Self {
        Self {
            popup: Popup::default(),
            controls: Controls::new()
                .button(0, HomeTag::Settings, "Settings")
                .button(0, HomeTag::Quit, "Quit"),
        }
    }
}

impl Default for Home {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for Home {
    type Tag = HomeTag;

    fn title(&self) -> &str {
        "pi-jukebox"
    }

    fn layout(&mut self, area: Rect) {
        let width = area.width.min(64);
        self.popup = Popup::layout(area, width, BODY_ROWS, self.controls.height());
        self.controls.layout(self.popup.controls);
    }

    fn hit_test(&self, pos: Position) -> Option<HomeTag> {
        self.controls.hit_test(pos)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<HomeTag> {
        match key.code {
            KeyCode::Char('s') => Some(HomeTag::Settings),
            KeyCode::Char('q') => Some(HomeTag::Quit),
            _ => self.controls.handle_key(key, None),
        }
    }

    fn on_tag(&mut self, tag: HomeTag, _state: &AppState) -> Vec<Action> {
        match tag {
            HomeTag::Settings => vec![Action::Open(ScreenKind::Settings)],
            HomeTag::Quit => vec![Action::Open(ScreenKind::Quit)],
        }
    }

    fn draw(&self, frame: &mut Frame, state: &AppState) {
        self.popup.draw_frame(frame, self.title(), style_focused_border());

        let status = if state.connected {
            Span::styled("● connected", Style::default().fg(C_PLAYING))
        } else {
            Span::styled("○ not connected", Style::default().fg(C_ACCENT))
        };
        let mut flags = vec![Span::styled("Playback   ", style_secondary())];
        for mode in PlaybackMode::ALL {
            let color = if state.modes.get(mode) {
                C_SWITCH_ON
            } else {
                C_SWITCH_OFF
            };
            flags.push(Span::styled(format!("{}  ", mode.label()), Style::default().fg(color)));
        }

        let lines = vec![
            Line::from(vec![
                Span::styled("MPD        ", style_secondary()),
                Span::styled(format!("{}  ", state.params), style_default()),
                status,
            ]),
            Line::from(vec![
                Span::styled("Music      ", style_secondary()),
                Span::styled(state.music_directory.display().to_string(), style_default()),
            ]),
            Line::from(""),
            Line::from(flags),
        ];
        frame.render_widget(Paragraph::new(lines), self.popup.body);
        self.controls.draw(frame, true);
    }
}
