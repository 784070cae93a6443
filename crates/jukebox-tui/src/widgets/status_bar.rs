//! Status bar: bottom line with connection state and keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use jukebox_proto::ConnectionParams;

use crate::theme::{C_ACCENT, C_MUTED, C_PLAYING, C_SECONDARY, C_SEPARATOR};

const KEYS: &str = "↑↓/Tab select  Enter activate  Esc back  click buttons";

/// Draw the one-row footer: connection dot, endpoint, then the open screens
/// (`trail`) or, on the root screen, the key hints.
pub fn draw_status_bar(
    frame: &mut Frame,
    area: Rect,
    params: &ConnectionParams,
    connected: bool,
    trail: &[&str],
) {
    let conn_span = if connected {
        Span::styled(" ●", Style::default().fg(C_PLAYING))
    } else {
        Span::styled(" ○", Style::default().fg(C_ACCENT))
    };
    let endpoint = Span::styled(
        format!(" {} ", params),
        Style::default().fg(C_SECONDARY).add_modifier(Modifier::BOLD),
    );
    let tail = if trail.is_empty() {
        Span::styled(format!(" {}", KEYS), Style::default().fg(C_MUTED))
    } else {
        Span::styled(format!(" {}", trail.join(" › ")), Style::default().fg(C_SECONDARY))
    };

    let line = Line::from(vec![conn_span, endpoint, tail]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw a horizontal separator line.
pub fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}
