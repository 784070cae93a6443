//! App: the event loop.
//!
//! Architecture:
//! - `App` owns the service handle, the settings store, the navigator and
//!   `AppState` (read-only data for screens).
//! - A blocking task forwards terminal events over a `tokio::mpsc` channel.
//! - Each key or click becomes a tag on the active screen; the screen turns it
//!   into `Vec<Action>` and the App applies them in order.
//! - Service calls (probes included) are awaited inline, so no other input is
//!   handled while one is running. Every one of them carries a timeout.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Position},
    style::Style,
    widgets::Block,
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use jukebox_proto::config::InterfaceConfig;
use jukebox_proto::{ConnectionProbe, ServiceHandle, SettingsStore};

use crate::action::{Action, Exit, ScreenKind};
use crate::app_state::AppState;
use crate::navigator::Navigator;
use crate::screen::Screen;
use crate::screens::home::Home;
use crate::screens::keyboard::TextPrompt;
use crate::screens::message::Message;
use crate::screens::mpd_settings::MpdSettings;
use crate::screens::playback::PlaybackOptions;
use crate::screens::quit::QuitMenu;
use crate::screens::settings_menu::SettingsMenu;
use crate::screens::system_info::SystemInfo;
use crate::screens::{ModalScreen, ScreenTag};
use crate::theme::C_BG;
use crate::widgets::status_bar::{draw_separator, draw_status_bar};
use crate::widgets::toast::{Severity, ToastManager};

/// How often the status line re-reads the service while idle.
const STATUS_REFRESH: Duration = Duration::from_secs(5);

pub struct App<S, P> {
    service: S,
    store: P,
    navigator: Navigator<ModalScreen>,
    state: AppState,
    toast: ToastManager,
    probe_timeout: Duration,
    tick: Duration,
    exit: Option<Exit>,
}

impl<S: ServiceHandle, P: SettingsStore> App<S, P> {
    pub fn new(service: S, store: P, interface: &InterfaceConfig, power_commands: bool) -> Self {
        let state = AppState::new(&service, power_commands);
        Self {
            service,
            store,
            navigator: Navigator::new(ModalScreen::Home(Home::new())),
            state,
            toast: ToastManager::new(),
            probe_timeout: interface.probe_timeout(),
            tick: interface.tick(),
            exit: None,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<Exit> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<Event>(256);

        // ── Background task: keyboard/mouse events ────────────────────────────
        // Polls so the task notices a closed channel and the runtime can exit.
        let poll = self.tick;
        tokio::task::spawn_blocking(move || loop {
            if tx.is_closed() {
                break;
            }
            match event::poll(poll) {
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if tx.blocking_send(ev).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                Ok(false) => {}
                Err(_) => break,
            }
        });

        self.sync_state().await;

        let mut toast_tick = tokio::time::interval(self.tick);
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut status_refresh = tokio::time::interval(STATUS_REFRESH);
        status_refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        let exit = loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if let Some(exit) = self.exit {
                break exit;
            }

            tokio::select! {
                ev = rx.recv() => match ev {
                    Some(ev) => needs_redraw = self.handle_event(ev).await,
                    None => break Exit::Quit,
                },

                _ = toast_tick.tick() => {
                    needs_redraw = self.toast.tick();
                }

                _ = status_refresh.tick() => {
                    let before = self.state.clone();
                    self.sync_state().await;
                    needs_redraw = before != self.state;
                }
            }
        };

        // ── Teardown ──────────────────────────────────────────────────────────
        drop(rx);
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        info!("app: exiting with {:?}", exit);
        Ok(exit)
    }

    /// Handle one terminal event. Returns whether a redraw is needed.
    pub async fn handle_event(&mut self, ev: Event) -> bool {
        match ev {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                self.handle_key(key).await;
                true
            }
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                let pos = Position::new(mouse.column, mouse.row);
                if let Some(tag) = self.navigator.dispatch(pos) {
                    self.activate(tag).await;
                }
                true
            }
            Event::Resize(_, _) => true,
            _ => false,
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.dispatch(vec![Action::Exit(Exit::Quit)]).await;
            return;
        }
        if let Some(tag) = self.navigator.dispatch_key(key) {
            self.activate(tag).await;
        }
    }

    async fn activate(&mut self, tag: ScreenTag) {
        debug!("app: {:?} on {}", tag, self.navigator.active().title());
        let actions = self.navigator.active_mut().on_tag(tag, &self.state);
        self.dispatch(actions).await;
    }

    /// Apply `actions` in order, along with whatever they produce in turn.
    pub async fn dispatch(&mut self, actions: Vec<Action>) {
        let mut queue: VecDeque<Action> = actions.into();
        while let Some(action) = queue.pop_front() {
            let follow_up = self.apply(action).await;
            queue.extend(follow_up);
        }
    }

    async fn apply(&mut self, action: Action) -> Vec<Action> {
        match action {
            Action::Open(kind) => {
                let screen = self.build(kind).await;
                self.navigator.open(screen);
            }
            Action::Close => {
                self.sync_state().await;
                self.navigator.close(&self.state);
            }
            Action::Prompt { key, initial } => {
                self.navigator
                    .open(ModalScreen::Keyboard(TextPrompt::new(key, initial)));
            }
            Action::Edited { key, text } => {
                if let ModalScreen::Mpd(screen) = self.navigator.active_mut() {
                    return screen.apply_edit(key, &text, &mut self.service).await;
                }
                warn!("app: edit of {} arrived with no settings screen open", key);
            }
            Action::CheckAndSave => {
                if let ModalScreen::Mpd(screen) = self.navigator.active_mut() {
                    return screen.save(&mut self.service, &mut self.store).await;
                }
            }
            Action::Toggle(mode) => match self.service.toggle(mode).await {
                Ok(on) => {
                    self.state.modes.set(mode, on);
                    self.navigator.active_mut().refresh(&self.state);
                }
                Err(e) => {
                    warn!("app: toggle {} failed: {:#}", mode.mpd_name(), e);
                    self.toast
                        .push(format!("{} failed: {}", mode.label(), e), Severity::Error);
                    self.state.capture(&self.service);
                }
            },
            Action::UpdateLibrary => match self.service.update_library().await {
                Ok(()) => self.toast.push("Updating library", Severity::Success),
                Err(e) => self.toast.push(format!("Update failed: {}", e), Severity::Error),
            },
            Action::RescanLibrary => match self.service.rescan_library().await {
                Ok(()) => self.toast.push("Re-scanning library", Severity::Success),
                Err(e) => self.toast.push(format!("Re-scan failed: {}", e), Severity::Error),
            },
            Action::Message {
                title,
                text,
                severity,
            } => {
                self.navigator
                    .open(ModalScreen::Message(Message::new(title, text, severity)));
            }
            Action::Toast(text, severity) => self.toast.push(text, severity),
            Action::Exit(exit) => {
                self.service.disconnect().await;
                self.exit = Some(exit);
            }
        }
        Vec::new()
    }

    async fn build(&mut self, kind: ScreenKind) -> ModalScreen {
        match kind {
            ScreenKind::Settings => ModalScreen::Settings(SettingsMenu::new()),
            ScreenKind::Quit => ModalScreen::Quit(QuitMenu::new()),
            ScreenKind::Playback => {
                self.sync_state().await;
                ModalScreen::Playback(PlaybackOptions::new(&self.state))
            }
            ScreenKind::MpdSettings => {
                let probe = ConnectionProbe::new(self.probe_timeout);
                ModalScreen::Mpd(MpdSettings::new(probe, &self.store))
            }
            ScreenKind::SystemInfo => {
                self.state.stats = match self.service.stats().await {
                    Ok(stats) => Some(stats),
                    Err(e) => {
                        warn!("app: stats unavailable: {:#}", e);
                        None
                    }
                };
                ModalScreen::SystemInfo(SystemInfo::new(&self.state))
            }
        }
    }

    /// Re-read endpoint, connection flag and playback modes from the service.
    async fn sync_state(&mut self) {
        if self.service.is_connected() {
            match self.service.playback_modes().await {
                Ok(modes) => self.state.modes = modes,
                Err(e) => debug!("app: status unavailable: {:#}", e),
            }
        }
        self.state.capture(&self.service);
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);
        let [main, separator, status] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)])
                .areas(area);

        self.navigator.layout(main);
        for screen in self.navigator.iter() {
            screen.draw(frame, &self.state);
        }
        draw_separator(frame, separator);
        let trail: Vec<&str> = self.navigator.iter().skip(1).map(|s| s.title()).collect();
        draw_status_bar(frame, status, &self.state.params, self.state.connected, &trail);
        self.toast.draw(frame, main);
    }
}
