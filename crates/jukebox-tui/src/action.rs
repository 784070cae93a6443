//! Action enum: everything a screen can ask the App to do.

use jukebox_proto::{PlaybackMode, SettingKey};

use crate::widgets::toast::Severity;

/// Screens the App knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Settings,
    Quit,
    Playback,
    MpdSettings,
    SystemInfo,
}

/// How the program ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    Shutdown,
    Reboot,
}

/// Screens produce Actions; the App applies them in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Navigation ───────────────────────────────────────────────────────────
    Open(ScreenKind),
    /// Pop the active screen; the one beneath refreshes.
    Close,

    // ── Settings edits ───────────────────────────────────────────────────────
    /// Open the on-screen keyboard for `key`, pre-filled with `initial`.
    Prompt { key: SettingKey, initial: String },
    /// Text confirmed on the keyboard, delivered to the screen beneath it.
    Edited { key: SettingKey, text: String },
    CheckAndSave,

    // ── Live service ─────────────────────────────────────────────────────────
    Toggle(PlaybackMode),
    UpdateLibrary,
    RescanLibrary,

    // ── Feedback ─────────────────────────────────────────────────────────────
    Message {
        title: String,
        text: String,
        severity: Severity,
    },
    Toast(String, Severity),

    Exit(Exit),
}
