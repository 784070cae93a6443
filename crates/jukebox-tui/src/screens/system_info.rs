//! System info: library statistics from MPD plus this machine's name and
//! address.

use std::net::{IpAddr, UdpSocket};

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Position, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use sysinfo::System;
use tracing::debug;

use jukebox_proto::ServerStats;

use crate::action::Action;
use crate::app_state::AppState;
use crate::screen::{Popup, Screen};
use crate::theme::{style_default, style_focused_border, style_heading, style_muted, style_secondary};
use crate::widgets::controls::Controls;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTag {
    Back,
}

pub struct SystemInfo {
    stats: Option<ServerStats>,
    host_name: String,
    ip: Option<IpAddr>,
    popup: Popup,
    controls: Controls<SystemTag>,
}

impl SystemInfo {
    pub fn new(state: &AppState) -> Self {
        Self {
            stats: state.stats,
            host_name: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            ip: local_ip(),
            popup: Popup::default(),
            controls: Controls::new().button(0, SystemTag::Back, "Back"),
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![Line::styled("Music database", style_heading())];
        match self.stats {
            Some(stats) => {
                lines.push(Line::from(vec![
                    field("Artists: "),
                    value(thousands(stats.artists)),
                    field("   Albums: "),
                    value(thousands(stats.albums)),
                    field("   Songs: "),
                    value(thousands(stats.songs)),
                ]));
                lines.push(Line::from(vec![
                    field("Total time: "),
                    value(play_time(stats.db_playtime)),
                ]));
            }
            None => lines.push(Line::styled("Statistics unavailable", style_muted())),
        }
        lines.push(Line::from(""));
        lines.push(Line::styled("Server", style_heading()));
        lines.push(Line::from(vec![field("Host name: "), value(self.host_name.clone())]));
        if let Some(ip) = self.ip {
            lines.push(Line::from(vec![field("IP address: "), value(ip.to_string())]));
        }
        lines
    }
}

fn field(text: &'static str) -> Span<'static> {
    Span::styled(text, style_secondary())
}

fn value(text: String) -> Span<'static> {
    Span::styled(text, style_default())
}

/// `1234567` → `1,234,567`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Seconds as "N days N hrs N mins N secs", leaving out zero parts.
pub fn play_time(seconds: u64) -> String {
    let parts = [
        (seconds / 86_400, "days"),
        (seconds % 86_400 / 3_600, "hrs"),
        (seconds % 3_600 / 60, "mins"),
        (seconds % 60, "secs"),
    ];
    let text: Vec<String> = parts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{} {}", n, unit))
        .collect();
    if text.is_empty() {
        "0 secs".to_string()
    } else {
        text.join(" ")
    }
}

/// Address of the interface that routes to the outside world. Connecting a
/// UDP socket sends nothing; it only selects the route.
fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    match socket.connect("8.8.8.8:80").and_then(|_| socket.local_addr()) {
        Ok(addr) if !addr.ip().is_unspecified() => Some(addr.ip()),
        Ok(_) => None,
        Err(e) => {
            debug!("system info: no route for address lookup: {}", e);
            None
        }
    }
}

impl Screen for SystemInfo {
    type Tag = SystemTag;

    fn title(&self) -> &str {
        "System info"
    }

    fn layout(&mut self, area: Rect) {
        let rows = self.lines().len() as u16;
        self.popup = Popup::layout(area, 60, rows, self.controls.height());
        self.controls.layout(self.popup.controls);
    }

    fn hit_test(&self, pos: Position) -> Option<SystemTag> {
        self.controls.hit_test(pos)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<SystemTag> {
        self.controls.handle_key(key, Some(SystemTag::Back))
    }

    fn on_tag(&mut self, tag: SystemTag, _state: &AppState) -> Vec<Action> {
        match tag {
            SystemTag::Back => vec![Action::Close],
        }
    }

    fn draw(&self, frame: &mut Frame, _state: &AppState) {
        self.popup.draw_frame(frame, self.title(), style_focused_border());
        frame.render_widget(Paragraph::new(self.lines()), self.popup.body);
        self.controls.draw(frame, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1234), "1,234");
        assert_eq!(thousands(2718281), "2,718,281");
    }

    #[test]
    fn test_play_time_skips_zero_parts() {
        assert_eq!(play_time(93784), "1 days 2 hrs 3 mins 4 secs");
        assert_eq!(play_time(3600), "1 hrs");
        assert_eq!(play_time(61), "1 mins 1 secs");
        assert_eq!(play_time(0), "0 secs");
    }

    #[test]
    fn test_missing_stats_are_reported() {
        let screen = SystemInfo {
            stats: None,
            host_name: "jukebox".into(),
            ip: None,
            popup: Popup::default(),
            controls: Controls::new(),
        };
        let text: Vec<String> = screen.lines().iter().map(|l| l.to_string()).collect();
        assert!(text.contains(&"Statistics unavailable".to_string()));
        assert!(text.contains(&"Host name: jukebox".to_string()));
        assert!(!text.iter().any(|l| l.starts_with("IP address")));
    }
}
