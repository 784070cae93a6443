//! Quit menu. Shutdown and reboot only reach the host when power commands
//! are enabled in the config; otherwise they behave like Quit.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Position, Rect},
    text::Line,
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::action::{Action, Exit};
use crate::app_state::AppState;
use crate::screen::{Popup, Screen};
use crate::theme::{style_focused_border, style_muted};
use crate::widgets::controls::Controls;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitTag {
    Quit,
    Shutdown,
    Reboot,
    Cancel,
}

pub struct QuitMenu {
    popup: Popup,
    controls: Controls<QuitTag>,
}

impl QuitMenu {
    pub fn new() -> Self {
        Self {
            popup: Popup::default(),
            controls: Controls::new()
                .button(0, QuitTag::Quit, "Quit")
                .button(1, QuitTag::Shutdown, "Shutdown Pi")
                .button(2, QuitTag::Reboot, "Reboot Pi")
                .button(3, QuitTag::Cancel, "Cancel"),
        }
    }
}

impl Default for QuitMenu {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for QuitMenu {
    type Tag = QuitTag;

    fn title(&self) -> &str {
        "Quit"
    }

    fn layout(&mut self, area: Rect) {
        self.popup = Popup::layout(area, 36, 1, self.controls.height());
        self.controls.layout(self.popup.controls);
    }

    fn hit_test(&self, pos: Position) -> Option<QuitTag> {
        self.controls.hit_test(pos)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<QuitTag> {
        self.controls.handle_key(key, Some(QuitTag::Cancel))
    }

    fn on_tag(&mut self, tag: QuitTag, _state: &AppState) -> Vec<Action> {
        match tag {
            QuitTag::Quit => vec![Action::Exit(Exit::Quit)],
            QuitTag::Shutdown => vec![Action::Exit(Exit::Shutdown)],
            QuitTag::Reboot => vec![Action::Exit(Exit::Reboot)],
            QuitTag::Cancel => vec![Action::Close],
        }
    }

    fn draw(&self, frame: &mut Frame, state: &AppState) {
        self.popup.draw_frame(frame, self.title(), style_focused_border());
        let note = if state.power_commands {
            "Shutdown and reboot act on this machine."
        } else {
            "Power commands are off; all options just quit."
        };
        frame.render_widget(
            Paragraph::new(Line::styled(note, style_muted())).wrap(Wrap { trim: true }),
            self.popup.body,
        );
        self.controls.draw(frame, true);
    }
}
