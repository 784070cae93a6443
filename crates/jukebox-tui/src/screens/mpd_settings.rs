//! MPD settings: edit host, port and music directory through one settings
//! transaction.
//!
//! Every edit is staged and checked straight away, so a bad host or a
//! missing directory is reported while the operator still has the field in
//! mind. Nothing is written until "Check and save". Cancel or Esc throws the
//! staged values away.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Position, Rect},
    text::Line,
    widgets::Paragraph,
    Frame,
};
use tracing::{info, warn};

use jukebox_proto::{
    ConnectionProbe, ServiceHandle, SettingKey, SettingValue, SettingsError, SettingsStore,
    SettingsTransaction,
};

use crate::action::Action;
use crate::app_state::AppState;
use crate::screen::{Popup, Screen};
use crate::theme::{style_focused_border, style_muted};
use crate::widgets::controls::Controls;
use crate::widgets::toast::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpdTag {
    Edit(SettingKey),
    Cancel,
    Save,
}

pub struct MpdSettings {
    transaction: SettingsTransaction,
    /// Values from the store, shown for keys with nothing staged.
    committed: [SettingValue; 3],
    popup: Popup,
    controls: Controls<MpdTag>,
}

impl MpdSettings {
    pub fn new<P: SettingsStore>(probe: ConnectionProbe, store: &P) -> Self {
        let controls = Controls::new()
            .button(0, MpdTag::Edit(SettingKey::Host), "")
            .button(1, MpdTag::Edit(SettingKey::Port), "")
            .button(2, MpdTag::Edit(SettingKey::MusicDirectory), "")
            .button(3, MpdTag::Cancel, "Cancel")
            .button(3, MpdTag::Save, "Check and save");
        let mut screen = Self {
            transaction: SettingsTransaction::new(probe, store),
            committed: SettingKey::ALL.map(|key| store.get(key)),
            popup: Popup::default(),
            controls,
        };
        screen.relabel();
        screen
    }

    /// Value shown for `key`: staged if there is one, else committed.
    pub fn current(&self, key: SettingKey) -> &SettingValue {
        self.transaction
            .staged(key)
            .unwrap_or(&self.committed[key as usize])
    }

    /// Stage keyboard text for `key` and check it against the live service.
    pub async fn apply_edit<S: ServiceHandle>(
        &mut self,
        key: SettingKey,
        raw: &str,
        service: &mut S,
    ) -> Vec<Action> {
        if let Err(e) = self.transaction.stage_raw(key, raw) {
            return vec![error_message(&e)];
        }
        let verdict = self.transaction.validate(key, service).await;
        self.relabel();
        match verdict {
            Ok(()) => vec![Action::Toast(format!("{} looks good", key), Severity::Info)],
            Err(e) => {
                warn!("mpd settings: {} rejected: {}", key, e);
                vec![error_message(&e)]
            }
        }
    }

    /// Check whatever is still unchecked, commit, and close.
    pub async fn save<S: ServiceHandle, P: SettingsStore>(
        &mut self,
        service: &mut S,
        store: &mut P,
    ) -> Vec<Action> {
        if self.transaction.is_empty() {
            let _ = self.transaction.cancel();
            return vec![Action::Close];
        }
        let checked = self.transaction.validate_all(service).await;
        self.relabel();
        if let Err(e) = checked {
            return vec![error_message(&e)];
        }
        match self.transaction.commit(service, store).await {
            Ok(summary) if summary.connected => {
                info!("mpd settings: saved {:?}", summary.keys);
                vec![
                    Action::Close,
                    Action::Toast("Settings saved".into(), Severity::Success),
                ]
            }
            Ok(summary) => vec![
                Action::Close,
                Action::Message {
                    title: "Settings saved".into(),
                    text: format!(
                        "The settings were saved but the mpd server {} did not answer again.",
                        service.params()
                    ),
                    severity: Severity::Warning,
                },
                Action::Toast(format!("{} setting(s) saved", summary.keys.len()), Severity::Info),
            ],
            Err(e) => vec![error_message(&e)],
        }
    }

    fn cancel(&mut self) {
        if self.transaction.cancel().is_ok() {
            info!("mpd settings: edits discarded");
        }
    }

    fn relabel(&mut self) {
        for key in SettingKey::ALL {
            let mark = match self.transaction.staged(key) {
                None => "",
                Some(_) if self.transaction.is_validated(key) => " ✓",
                Some(_) => " ✗",
            };
            let label = match key {
                SettingKey::Host => format!("Change host: {}{}", self.current(key), mark),
                SettingKey::Port => format!("Change port: {}{}", self.current(key), mark),
                SettingKey::MusicDirectory => format!("Change music directory{}", mark),
            };
            self.controls.set_label(MpdTag::Edit(key), label);
        }
    }
}

/// Connection and directory problems are the operator's to fix, so they are
/// warnings; store failures are errors.
fn error_message(e: &SettingsError) -> Action {
    let (title, severity) = match e {
        SettingsError::ConnectionFailed { .. } => ("Connection error", Severity::Warning),
        SettingsError::InvalidDirectory { .. } => ("Music directory", Severity::Warning),
        SettingsError::Store(_) => ("Could not save", Severity::Error),
        _ => ("Settings", Severity::Warning),
    };
    Action::Message {
        title: title.to_string(),
        text: e.to_string(),
        severity,
    }
}

impl Screen for MpdSettings {
    type Tag = MpdTag;

    fn title(&self) -> &str {
        "MPD settings"
    }

    fn layout(&mut self, area: Rect) {
        self.popup = Popup::layout(area, 60, 1, self.controls.height());
        self.controls.layout(self.popup.controls);
    }

    fn hit_test(&self, pos: Position) -> Option<MpdTag> {
        self.controls.hit_test(pos)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<MpdTag> {
        self.controls.handle_key(key, Some(MpdTag::Cancel))
    }

    fn on_tag(&mut self, tag: MpdTag, _state: &AppState) -> Vec<Action> {
        match tag {
            MpdTag::Edit(key) => vec![Action::Prompt {
                key,
                initial: self.current(key).to_string(),
            }],
            MpdTag::Cancel => {
                self.cancel();
                vec![Action::Close]
            }
            MpdTag::Save => vec![Action::CheckAndSave],
        }
    }

    /// Keeps staged values. The store cannot change while this screen is
    /// open, so the committed fallbacks stay as read.
    fn refresh(&mut self, _state: &AppState) {
        self.relabel();
    }

    fn draw(&self, frame: &mut Frame, _state: &AppState) {
        self.popup.draw_frame(frame, self.title(), style_focused_border());
        let dir = self.current(SettingKey::MusicDirectory).to_string();
        frame.render_widget(
            Paragraph::new(Line::styled(format!("Music: {}", dir), style_muted())),
            self.popup.body,
        );
        self.controls.draw(frame, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use jukebox_proto::fake::{FakeService, MemoryStore};
    use jukebox_proto::{ConnectionParams, TransactionState};

    fn probe() -> ConnectionProbe {
        ConnectionProbe::new(Duration::from_millis(50))
    }

    /// Begun against the default store, which holds localhost:6600.
    fn screen() -> MpdSettings {
        MpdSettings::new(probe(), &MemoryStore::default())
    }

    fn label(screen: &MpdSettings, key: SettingKey) -> String {
        screen
            .controls
            .get(MpdTag::Edit(key))
            .map(|c| c.label.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_unreachable_host_shows_warning_and_keeps_service() {
        let mut service = FakeService::connected("localhost", 6600);
        let mut screen = screen();
        let actions = screen.apply_edit(SettingKey::Host, "10.0.0.5", &mut service).await;

        assert!(matches!(
            actions.as_slice(),
            [Action::Message { severity: Severity::Warning, .. }]
        ));
        assert_eq!(service.params(), &ConnectionParams::new("localhost", 6600));
        assert!(service.is_connected());
        assert_eq!(label(&screen, SettingKey::Host), "Change host: 10.0.0.5 ✗");
    }

    #[tokio::test]
    async fn test_bad_port_text_is_not_staged() {
        let mut service = FakeService::connected("localhost", 6600);
        let mut screen = screen();
        let actions = screen.apply_edit(SettingKey::Port, "66000", &mut service).await;
        assert_eq!(actions.len(), 1);
        assert_eq!(label(&screen, SettingKey::Port), "Change port: 6600");
        assert!(service.connect_log.is_empty());
    }

    #[tokio::test]
    async fn test_save_commits_and_closes() {
        let mut service = FakeService::connected("localhost", 6600);
        service.allow("jukebox.local", 6600);
        let mut store = MemoryStore::default();
        let mut screen = screen();

        screen.apply_edit(SettingKey::Host, "jukebox.local", &mut service).await;
        assert_eq!(label(&screen, SettingKey::Host), "Change host: jukebox.local ✓");

        let actions = screen.save(&mut service, &mut store).await;
        assert_eq!(actions[0], Action::Close);
        assert_eq!(store.config.service.host, "jukebox.local");
        assert_eq!(service.params().host, "jukebox.local");
        assert_eq!(screen.transaction.state(), TransactionState::Committed);
    }

    #[tokio::test]
    async fn test_save_with_nothing_staged_just_closes() {
        let mut service = FakeService::connected("localhost", 6600);
        let mut store = MemoryStore::default();
        let mut screen = screen();
        assert_eq!(screen.save(&mut service, &mut store).await, vec![Action::Close]);
        assert_eq!(store.writes, 0);
    }

    #[tokio::test]
    async fn test_cancel_discards_staged_values() {
        let mut service = FakeService::connected("localhost", 6600);
        let dir = tempfile::tempdir().unwrap();
        let mut screen = screen();
        let raw = dir.path().display().to_string();
        screen.apply_edit(SettingKey::MusicDirectory, &raw, &mut service).await;

        let state = AppState::new(&service, false);
        assert_eq!(screen.on_tag(MpdTag::Cancel, &state), vec![Action::Close]);
        assert_eq!(screen.transaction.state(), TransactionState::Cancelled);
        assert_ne!(service.music_directory(), dir.path());
    }

    #[test]
    fn test_edit_prompts_with_current_value() {
        let service = FakeService::connected("localhost", 6600);
        let mut screen = screen();
        let state = AppState::new(&service, false);
        assert_eq!(
            screen.on_tag(MpdTag::Edit(SettingKey::Port), &state),
            vec![Action::Prompt {
                key: SettingKey::Port,
                initial: "6600".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_labels_and_save_follow_store_when_live_differs() {
        let mut service = FakeService::connected("override.host", 6600);
        service.allow("localhost", 6601);
        let mut store = MemoryStore::default();
        let mut screen = MpdSettings::new(probe(), &store);
        assert_eq!(label(&screen, SettingKey::Host), "Change host: localhost");

        screen.apply_edit(SettingKey::Port, "6601", &mut service).await;
        assert_eq!(label(&screen, SettingKey::Port), "Change port: 6601 ✓");
        let actions = screen.save(&mut service, &mut store).await;

        assert_eq!(actions[0], Action::Close);
        assert_eq!(store.config.service.params(), ConnectionParams::new("localhost", 6601));
        assert_eq!(service.params(), &ConnectionParams::new("localhost", 6601));
    }
}
