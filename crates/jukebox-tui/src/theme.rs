//! Color palette and style constants for the jukebox TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(18, 18, 18);
pub const C_POPUP_BG: Color = Color::Rgb(18, 18, 26);
pub const C_ACCENT: Color = Color::Rgb(255, 95, 95);
pub const C_PLAYING: Color = Color::Rgb(80, 200, 120);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SEPARATOR: Color = Color::Rgb(40, 40, 52);
pub const C_SECONDARY: Color = Color::Rgb(115, 115, 138);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(120, 100, 200);
pub const C_BUTTON_BG: Color = Color::Rgb(32, 32, 46);
pub const C_BUTTON_SELECTED_BG: Color = Color::Rgb(120, 100, 200);
pub const C_INPUT_BG: Color = Color::Rgb(20, 20, 32);
pub const C_INPUT_FG: Color = Color::Rgb(255, 200, 80);
pub const C_HEADING: Color = Color::Rgb(80, 180, 170); // teal section headings
pub const C_SWITCH_ON: Color = Color::Rgb(80, 200, 120);
pub const C_SWITCH_OFF: Color = Color::Rgb(115, 115, 138);
pub const C_TOAST_INFO: Color = Color::Rgb(80, 160, 220);
pub const C_TOAST_SUCCESS: Color = Color::Rgb(80, 200, 120);
pub const C_TOAST_WARNING: Color = Color::Rgb(255, 184, 80);
pub const C_TOAST_ERROR: Color = Color::Rgb(255, 95, 95);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_heading() -> Style {
    Style::default().fg(C_HEADING).add_modifier(Modifier::BOLD)
}

pub fn style_button() -> Style {
    Style::default().bg(C_BUTTON_BG).fg(C_PRIMARY)
}

pub fn style_button_selected() -> Style {
    Style::default()
        .bg(C_BUTTON_SELECTED_BG)
        .fg(C_PRIMARY)
        .add_modifier(Modifier::BOLD)
}

pub fn style_focused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_input() -> Style {
    Style::default().fg(C_INPUT_FG).bg(C_INPUT_BG)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}
