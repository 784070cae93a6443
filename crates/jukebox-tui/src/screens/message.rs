use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Position, Rect},
    style::Style,
    text::Line,
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::action::Action;
use crate::app_state::AppState;
use crate::screen::{Popup, Screen};
use crate::theme::style_default;
use crate::widgets::controls::Controls;
use crate::widgets::toast::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTag {
    Ok,
}

/// Modal notice with a single OK button. The border takes the severity color.
pub struct Message {
    title: String,
    text: String,
    severity: Severity,
    popup: Popup,
    controls: Controls<MessageTag>,
}

const WIDTH: u16 = 56;

impl Message {
    pub fn new(title: impl Into<String>, text: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            severity,
            popup: Popup::default(),
            controls: Controls::new().button(0, MessageTag::Ok, "OK"),
        }
    }

    fn body_rows(&self) -> u16 {
        // Rough wrap estimate for the popup's inner width.
        let inner = (WIDTH - 4) as usize;
        self.text
            .lines()
            .map(|l| l.chars().count().max(1).div_ceil(inner) as u16)
            .sum::<u16>()
            .max(1)
    }
}

impl Screen for Message {
    type Tag = MessageTag;

    fn title(&self) -> &str {
        &self.title
    }

    fn layout(&mut self, area: Rect) {
        self.popup = Popup::layout(area, WIDTH, self.body_rows(), self.controls.height());
        self.controls.layout(self.popup.controls);
    }

    fn hit_test(&self, pos: Position) -> Option<MessageTag> {
        self.controls.hit_test(pos)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<MessageTag> {
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Some(MessageTag::Ok),
            _ => None,
        }
    }

    fn on_tag(&mut self, tag: MessageTag, _state: &AppState) -> Vec<Action> {
        match tag {
            MessageTag::Ok => vec![Action::Close],
        }
    }

    fn draw(&self, frame: &mut Frame, _state: &AppState) {
        let border = Style::default().fg(self.severity.color());
        self.popup.draw_frame(frame, self.title(), border);
        let lines: Vec<Line> = self.text.lines().map(|l| Line::styled(l, style_default())).collect();
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), self.popup.body);
        self.controls.draw(frame, true);
    }
}
