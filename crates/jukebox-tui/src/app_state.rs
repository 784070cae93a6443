//! AppState: shared read-only data passed to every screen during
//! render and event handling.
//!
//! Screens read this for live service state but never mutate it. The App
//! event loop is the only writer.

use std::path::PathBuf;

use jukebox_proto::{ConnectionParams, PlaybackModes, ServerStats, ServiceHandle};

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// Endpoint the service is configured for right now.
    pub params: ConnectionParams,
    pub connected: bool,
    pub music_directory: PathBuf,
    pub modes: PlaybackModes,
    /// Last `stats` reply; `None` until the system info screen asks.
    pub stats: Option<ServerStats>,
    pub power_commands: bool,
}

impl AppState {
    pub fn new<S: ServiceHandle>(service: &S, power_commands: bool) -> Self {
        Self {
            params: service.params().clone(),
            connected: service.is_connected(),
            music_directory: service.music_directory().to_path_buf(),
            modes: PlaybackModes::default(),
            stats: None,
            power_commands,
        }
    }

    /// Copy the service's current endpoint and connection flag.
    pub fn capture<S: ServiceHandle>(&mut self, service: &S) {
        self.params = service.params().clone();
        self.connected = service.is_connected();
        self.music_directory = service.music_directory().to_path_buf();
    }
}
