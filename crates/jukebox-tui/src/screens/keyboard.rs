//! On-screen keyboard: edits one setting's text and hands it back to the
//! screen that asked for it.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Position, Rect},
    text::Line,
    widgets::Paragraph,
    Frame,
};

use jukebox_proto::SettingKey;

use crate::action::Action;
use crate::app_state::AppState;
use crate::screen::{Popup, Screen};
use crate::theme::{style_focused_border, style_secondary};
use crate::widgets::controls::Controls;
use crate::widgets::text_field::{FieldEvent, TextField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTag {
    Confirm,
    Cancel,
}

pub struct TextPrompt {
    key: SettingKey,
    caption: String,
    field: TextField,
    popup: Popup,
    input_area: Rect,
    controls: Controls<PromptTag>,
}

impl TextPrompt {
    pub fn new(key: SettingKey, initial: impl Into<String>) -> Self {
        Self {
            key,
            caption: caption(key).to_string(),
            field: TextField::new(initial),
            popup: Popup::default(),
            input_area: Rect::default(),
            controls: Controls::new()
                .button(0, PromptTag::Cancel, "Cancel")
                .button(0, PromptTag::Confirm, "OK"),
        }
    }
}

fn caption(key: SettingKey) -> &'static str {
    match key {
        SettingKey::Host => "Set mpd host",
        SettingKey::Port => "Set mpd server port",
        SettingKey::MusicDirectory => "Set music directory",
    }
}

impl Screen for TextPrompt {
    type Tag = PromptTag;

    fn title(&self) -> &str {
        &self.caption
    }

    fn layout(&mut self, area: Rect) {
        // Caption hint, blank, input row.
        self.popup = Popup::layout(area, 60, 3, self.controls.height());
        let body = self.popup.body;
        self.input_area = Rect::new(body.x, body.y + 2, body.width, 1).intersection(body);
        self.controls.layout(self.popup.controls);
    }

    fn hit_test(&self, pos: Position) -> Option<PromptTag> {
        self.controls.hit_test(pos)
    }

    /// Printable keys edit the text; Tab and arrows still reach the buttons.
    fn handle_key(&mut self, key: KeyEvent) -> Option<PromptTag> {
        if matches!(key.code, KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down) {
            return self.controls.handle_key(key, Some(PromptTag::Cancel));
        }
        match self.field.handle_key(key) {
            FieldEvent::Submitted => Some(PromptTag::Confirm),
            FieldEvent::Cancelled => Some(PromptTag::Cancel),
            FieldEvent::Edited | FieldEvent::Ignored => None,
        }
    }

    fn on_tag(&mut self, tag: PromptTag, _state: &AppState) -> Vec<Action> {
        match tag {
            PromptTag::Confirm => vec![
                Action::Close,
                Action::Edited {
                    key: self.key,
                    text: self.field.value().to_string(),
                },
            ],
            PromptTag::Cancel => vec![Action::Close],
        }
    }

    fn draw(&self, frame: &mut Frame, _state: &AppState) {
        self.popup.draw_frame(frame, self.title(), style_focused_border());
        let hint = Line::styled(
            format!("{} (Enter to accept, Esc to cancel)", self.key),
            style_secondary(),
        );
        frame.render_widget(Paragraph::new(hint), self.popup.body);
        self.field.draw(frame, self.input_area, self.field.initial());
        self.controls.draw(frame, false);
    }
}
