//! Controls: the buttons and switches of one modal screen.
//!
//! Each control carries a tag from the screen's own closed enum. The last
//! laid-out rect of every control is kept so clicks can be hit-tested without
//! recomputing the layout, and a selection cursor lets the keyboard reach the
//! same tags.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::{style_button, style_button_selected, C_SWITCH_OFF, C_SWITCH_ON};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Button,
    Switch(bool),
}

#[derive(Debug, Clone)]
pub struct Control<T> {
    pub tag: T,
    pub label: String,
    pub kind: ControlKind,
    row: u16,
    area: Rect,
}

/// Vertical stack of control rows. Controls sharing a row split its width.
#[derive(Debug, Clone)]
pub struct Controls<T> {
    items: Vec<Control<T>>,
    selected: usize,
}

/// Blank line between rows.
const ROW_PITCH: u16 = 2;
const COLUMN_GAP: u16 = 2;

impl<T: Copy + PartialEq> Controls<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
        }
    }

    pub fn button(mut self, row: u16, tag: T, label: impl Into<String>) -> Self {
        self.push(row, tag, label.into(), ControlKind::Button);
        self
    }

    pub fn switch(mut self, row: u16, tag: T, label: impl Into<String>, on: bool) -> Self {
        self.push(row, tag, label.into(), ControlKind::Switch(on));
        self
    }

    fn push(&mut self, row: u16, tag: T, label: String, kind: ControlKind) {
        self.items.push(Control {
            tag,
            label,
            kind,
            row,
            area: Rect::default(),
        });
    }

    #[cfg(test)]
    pub fn get(&self, tag: T) -> Option<&Control<T>> {
        self.items.iter().find(|c| c.tag == tag)
    }

    pub fn set_label(&mut self, tag: T, label: impl Into<String>) {
        if let Some(c) = self.items.iter_mut().find(|c| c.tag == tag) {
            c.label = label.into();
        }
    }

    pub fn set_switch(&mut self, tag: T, on: bool) {
        if let Some(c) = self.items.iter_mut().find(|c| c.tag == tag) {
            c.kind = ControlKind::Switch(on);
        }
    }

    /// Rows needed to lay out every control.
    pub fn height(&self) -> u16 {
        self.items
            .iter()
            .map(|c| c.row)
            .max()
            .map_or(0, |last| last * ROW_PITCH + 1)
    }

    pub fn layout(&mut self, area: Rect) {
        let rows = self.items.iter().map(|c| c.row).max().map_or(0, |r| r + 1);
        for row in 0..rows {
            let y = area.y + row * ROW_PITCH;
            let members: Vec<usize> = (0..self.items.len())
                .filter(|&i| self.items[i].row == row)
                .collect();
            if members.is_empty() {
                continue;
            }
            let n = members.len() as u16;
            let gaps = COLUMN_GAP * (n - 1);
            let width = area.width.saturating_sub(gaps) / n;
            for (col, &i) in members.iter().enumerate() {
                let col = col as u16;
                let x = area.x + col * (width + COLUMN_GAP);
                // Last column absorbs the rounding remainder.
                let w = if col == n - 1 {
                    (area.x + area.width).saturating_sub(x)
                } else {
                    width
                };
                self.items[i].area = if y < area.y + area.height {
                    Rect::new(x, y, w, 1)
                } else {
                    Rect::default()
                };
            }
        }
    }

    /// Tag of the control under `pos`, as of the last layout.
    pub fn hit_test(&self, pos: Position) -> Option<T> {
        self.items
            .iter()
            .find(|c| c.area.width > 0 && c.area.contains(pos))
            .map(|c| c.tag)
    }

    pub fn selected(&self) -> Option<T> {
        self.items.get(self.selected).map(|c| c.tag)
    }

    pub fn select_next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1) % self.items.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.items.is_empty() {
            self.selected = if self.selected == 0 {
                self.items.len() - 1
            } else {
                self.selected - 1
            };
        }
    }

    /// Move the cursor or activate the selected control. `escape` is the tag
    /// Esc stands for on this screen.
    pub fn handle_key(&mut self, key: KeyEvent, escape: Option<T>) -> Option<T> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        match key.code {
            KeyCode::Down | KeyCode::Right | KeyCode::Tab | KeyCode::Char('j') => {
                self.select_next();
                None
            }
            KeyCode::Up | KeyCode::Left | KeyCode::BackTab | KeyCode::Char('k') => {
                self.select_prev();
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.selected(),
            KeyCode::Esc => escape,
            _ => None,
        }
    }

    pub fn draw(&self, frame: &mut Frame, focused: bool) {
        for (i, control) in self.items.iter().enumerate() {
            if control.area.width == 0 {
                continue;
            }
            let style = if focused && i == self.selected {
                style_button_selected()
            } else {
                style_button()
            };
            frame.render_widget(Paragraph::new(control_line(control, style)), control.area);
        }
    }
}

impl<T: Copy + PartialEq> Default for Controls<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn control_line<T>(control: &Control<T>, style: Style) -> Line<'static> {
    let width = control.area.width as usize;
    match control.kind {
        ControlKind::Button => {
            let label = fit(&control.label, width.saturating_sub(2));
            let pad = width.saturating_sub(label.width());
            let left = pad / 2;
            Line::from(Span::styled(
                format!("{}{}{}", " ".repeat(left), label, " ".repeat(pad - left)),
                style,
            ))
        }
        ControlKind::Switch(on) => {
            let (mark, color) = if on {
                ("[■] ", C_SWITCH_ON)
            } else {
                ("[ ] ", C_SWITCH_OFF)
            };
            let label = fit(&control.label, width.saturating_sub(mark.width() + 1));
            let pad = width.saturating_sub(mark.width() + label.width() + 1);
            Line::from(vec![
                Span::styled(" ", style),
                Span::styled(mark, style.fg(color)),
                Span::styled(format!("{}{}", label, " ".repeat(pad)), style),
            ])
        }
    }
}

/// Truncate to `max` display columns, marking the cut with an ellipsis.
fn fit(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        let next = format!("{}{}", out, ch);
        if next.width() + 1 > max {
            break;
        }
        out = next;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Tag {
        A,
        B,
        C,
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn sample() -> Controls<Tag> {
        let mut c = Controls::new()
            .button(0, Tag::A, "Alpha")
            .button(1, Tag::B, "Cancel")
            .switch(1, Tag::C, "Shuffle", false);
        c.layout(Rect::new(10, 5, 40, 10));
        c
    }

    #[test]
    fn test_layout_rows_and_columns() {
        let c = sample();
        assert_eq!(c.height(), 3);
        assert_eq!(c.hit_test(Position::new(10, 5)), Some(Tag::A));
        assert_eq!(c.hit_test(Position::new(49, 5)), Some(Tag::A));
        // Row 1 is split in two columns with a gap between them.
        assert_eq!(c.hit_test(Position::new(10, 7)), Some(Tag::B));
        assert_eq!(c.hit_test(Position::new(49, 7)), Some(Tag::C));
        assert_eq!(c.hit_test(Position::new(29, 7)), None);
        // Blank spacer row.
        assert_eq!(c.hit_test(Position::new(10, 6)), None);
    }

    #[test]
    fn test_keyboard_selection_wraps() {
        let mut c = sample();
        assert_eq!(c.handle_key(key(KeyCode::Enter), None), Some(Tag::A));
        c.handle_key(key(KeyCode::Up), None);
        assert_eq!(c.selected(), Some(Tag::C));
        c.handle_key(key(KeyCode::Down), None);
        assert_eq!(c.selected(), Some(Tag::A));
        assert_eq!(c.handle_key(key(KeyCode::Esc), Some(Tag::B)), Some(Tag::B));
    }

    #[test]
    fn test_fit_truncates_with_ellipsis() {
        assert_eq!(fit("Change host: localhost", 100), "Change host: localhost");
        assert_eq!(fit("Change host", 6), "Chang…");
    }

    #[test]
    fn test_set_label_and_switch() {
        let mut c = sample();
        c.set_label(Tag::A, "Beta");
        c.set_switch(Tag::C, true);
        assert_eq!(c.get(Tag::A).unwrap().label, "Beta");
        assert_eq!(c.get(Tag::C).unwrap().kind, ControlKind::Switch(true));
    }
}
