//! Every modal screen of the application, gathered into one enum so the
//! navigator can stack them without boxing.

pub mod home;
pub mod keyboard;
pub mod message;
pub mod mpd_settings;
pub mod playback;
pub mod quit;
pub mod settings_menu;
pub mod system_info;

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Position, Rect},
    Frame,
};

use crate::action::Action;
use crate::app_state::AppState;
use crate::screen::Screen;

use home::{Home, HomeTag};
use keyboard::{PromptTag, TextPrompt};
use message::{Message, MessageTag};
use mpd_settings::{MpdSettings, MpdTag};
use playback::{PlaybackOptions, PlaybackTag};
use quit::{QuitMenu, QuitTag};
use settings_menu::{SettingsMenu, SettingsTag};
use system_info::{SystemInfo, SystemTag};

pub enum ModalScreen {
    Home(Home),
    Settings(SettingsMenu),
    Quit(QuitMenu),
    Playback(PlaybackOptions),
    Mpd(MpdSettings),
    SystemInfo(SystemInfo),
    Keyboard(TextPrompt),
    Message(Message),
}

/// A tag together with the screen kind that produced it. Variant names match
/// `ModalScreen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenTag {
    Home(HomeTag),
    Settings(SettingsTag),
    Quit(QuitTag),
    Playback(PlaybackTag),
    Mpd(MpdTag),
    SystemInfo(SystemTag),
    Keyboard(PromptTag),
    Message(MessageTag),
}

/// Run `$body` with `$s` bound to the inner screen.
macro_rules! each_screen {
    ($screen:expr, $s:ident => $body:expr) => {
        match $screen {
            ModalScreen::Home($s) => $body,
            ModalScreen::Settings($s) => $body,
            ModalScreen::Quit($s) => $body,
            ModalScreen::Playback($s) => $body,
            ModalScreen::Mpd($s) => $body,
            ModalScreen::SystemInfo($s) => $body,
            ModalScreen::Keyboard($s) => $body,
            ModalScreen::Message($s) => $body,
        }
    };
}

/// Like `each_screen!`, wrapping the `Option<Tag>` result in `ScreenTag`.
macro_rules! each_tag {
    ($screen:expr, $s:ident => $body:expr) => {
        match $screen {
            ModalScreen::Home($s) => $body.map(ScreenTag::Home),
            ModalScreen::Settings($s) => $body.map(ScreenTag::Settings),
            ModalScreen::Quit($s) => $body.map(ScreenTag::Quit),
            ModalScreen::Playback($s) => $body.map(ScreenTag::Playback),
            ModalScreen::Mpd($s) => $body.map(ScreenTag::Mpd),
            ModalScreen::SystemInfo($s) => $body.map(ScreenTag::SystemInfo),
            ModalScreen::Keyboard($s) => $body.map(ScreenTag::Keyboard),
            ModalScreen::Message($s) => $body.map(ScreenTag::Message),
        }
    };
}

impl Screen for ModalScreen {
    type Tag = ScreenTag;

    fn title(&self) -> &str {
        each_screen!(self, s => s.title())
    }

    fn layout(&mut self, area: Rect) {
        each_screen!(self, s => s.layout(area))
    }

    fn hit_test(&self, pos: Position) -> Option<ScreenTag> {
        each_tag!(self, s => s.hit_test(pos))
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<ScreenTag> {
        each_tag!(self, s => s.handle_key(key))
    }

    /// A tag from another kind of screen is ignored.
    fn on_tag(&mut self, tag: ScreenTag, state: &AppState) -> Vec<Action> {
        match (self, tag) {
            (ModalScreen::Home(s), ScreenTag::Home(t)) => s.on_tag(t, state),
            (ModalScreen::Settings(s), ScreenTag::Settings(t)) => s.on_tag(t, state),
            (ModalScreen::Quit(s), ScreenTag::Quit(t)) => s.on_tag(t, state),
            (ModalScreen::Playback(s), ScreenTag::Playback(t)) => s.on_tag(t, state),
            (ModalScreen::Mpd(s), ScreenTag::Mpd(t)) => s.on_tag(t, state),
            (ModalScreen::SystemInfo(s), ScreenTag::SystemInfo(t)) => s.on_tag(t, state),
            (ModalScreen::Keyboard(s), ScreenTag::Keyboard(t)) => s.on_tag(t, state),
            (ModalScreen::Message(s), ScreenTag::Message(t)) => s.on_tag(t, state),
            _ => Vec::new(),
        }
    }

    fn refresh(&mut self, state: &AppState) {
        each_screen!(self, s => s.refresh(state))
    }

    fn draw(&self, frame: &mut Frame, state: &AppState) {
        each_screen!(self, s => s.draw(frame, state))
    }
}
