//! TextField: single-line editor on top of tui-input.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{style_input, style_muted};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    Edited,
    Submitted,
    Cancelled,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct TextField {
    input: Input,
    initial: String,
}

impl TextField {
    pub fn new(initial: impl Into<String>) -> Self {
        let initial = initial.into();
        Self {
            input: Input::new(initial.clone()),
            initial,
        }
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn initial(&self) -> &str {
        &self.initial
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FieldEvent {
        if key.kind == KeyEventKind::Release {
            return FieldEvent::Ignored;
        }
        match key.code {
            KeyCode::Enter => FieldEvent::Submitted,
            KeyCode::Esc => FieldEvent::Cancelled,
            _ => match self.input.handle_event(&Event::Key(key)) {
                Some(_) => FieldEvent::Edited,
                None => FieldEvent::Ignored,
            },
        }
    }

    /// Render into a one-row `area` and place the terminal cursor.
    pub fn draw(&self, frame: &mut Frame, area: Rect, placeholder: &str) {
        let inner_width = area.width.saturating_sub(2) as usize;
        let scroll = self.input.visual_scroll(inner_width);
        let value = self.input.value();
        let span = if value.is_empty() {
            Span::styled(format!(" {}", placeholder), style_muted())
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            Span::styled(format!(" {}", visible), style_input())
        };
        frame.render_widget(Paragraph::new(Line::from(span)).style(style_input()), area);

        let cursor_x = area.x + 1 + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
        frame.set_cursor_position((cursor_x.min(area.x + area.width.saturating_sub(1)), area.y));
    }
}
