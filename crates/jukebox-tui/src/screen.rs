//! Screen trait: the interface every modal screen implements.
//!
//! - Screens own their widgets and render themselves.
//! - Interactive elements carry a tag from the screen's own closed enum;
//!   clicks and keys are both turned into tags before anything happens.
//! - A tag is turned into `Vec<Action>`; the App applies those, screens never
//!   touch the service or the store directly.

use std::fmt;

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Margin, Position, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Borders, Clear},
    Frame,
};

use crate::action::Action;
use crate::app_state::AppState;
use crate::theme::{style_heading, C_POPUP_BG};

pub trait Screen {
    type Tag: Copy + PartialEq + fmt::Debug;

    fn title(&self) -> &str;

    /// Compute the rects of every interactive element inside `area`.
    fn layout(&mut self, area: Rect);

    /// Tag of the element under `pos`, as of the last `layout`.
    fn hit_test(&self, pos: Position) -> Option<Self::Tag>;

    /// Keyboard navigation. Returns a tag when a key activates an element.
    fn handle_key(&mut self, key: KeyEvent) -> Option<Self::Tag>;

    fn on_tag(&mut self, tag: Self::Tag, state: &AppState) -> Vec<Action>;

    /// Re-read displayed values. Called when the screen above closes.
    fn refresh(&mut self, _state: &AppState) {}

    fn draw(&self, frame: &mut Frame, state: &AppState);
}

/// Rects of a bordered popup: the frame, a text body, and a controls area
/// below it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Popup {
    pub outer: Rect,
    pub body: Rect,
    pub controls: Rect,
}

impl Popup {
    /// Center a popup of `width` columns holding `body_height` text rows and
    /// `controls_height` control rows, clamped to `area`.
    pub fn layout(area: Rect, width: u16, body_height: u16, controls_height: u16) -> Self {
        let gap = u16::from(body_height > 0);
        let height = body_height + gap + controls_height + 4;
        let outer = centered_rect(width, height, area);
        let inner = outer.inner(Margin::new(2, 2));
        let body_h = body_height.min(inner.height);
        let body = Rect::new(inner.x, inner.y, inner.width, body_h);
        let controls_y = (inner.y + body_h + gap).min(inner.y + inner.height);
        let controls = Rect::new(
            inner.x,
            controls_y,
            inner.width,
            (inner.y + inner.height).saturating_sub(controls_y),
        );
        Self {
            outer,
            body,
            controls,
        }
    }

    pub fn draw_frame(&self, frame: &mut Frame, title: &str, border: Style) {
        frame.render_widget(Clear, self.outer);
        frame.render_widget(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(Span::styled(format!(" {} ", title), style_heading()))
                .style(Style::default().bg(C_POPUP_BG)),
            self.outer,
        );
    }
}

/// A `width` x `height` rect centered in `r`, shrunk to fit.
pub fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let w = width.min(r.width);
    let h = height.min(r.height);
    Rect::new(
        r.x + (r.width - w) / 2,
        r.y + (r.height - h) / 2,
        w,
        h,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_clamps() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(centered_rect(40, 10, area), Rect::new(20, 7, 40, 10));
        assert_eq!(centered_rect(100, 50, area), area);
    }

    #[test]
    fn test_popup_stacks_body_above_controls() {
        let popup = Popup::layout(Rect::new(0, 0, 80, 24), 40, 3, 5);
        assert_eq!(popup.outer.height, 13);
        assert_eq!(popup.body.height, 3);
        assert_eq!(popup.controls.y, popup.body.y + 4);
        assert_eq!(popup.controls.height, 5);
    }
}
