//! In-memory service and store for tests, here and in the TUI crate
//! (`test-util` feature).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::bail;

use crate::config::{Config, SettingsStore};
use crate::error::StoreError;
use crate::mpd::{ServerStats, ServiceHandle};
use crate::settings::{ConnectionParams, PlaybackMode, PlaybackModes, SettingKey, SettingValue};

/// A service that only accepts connections to an allow-list of endpoints and
/// records every endpoint it was asked to connect to.
pub struct FakeService {
    params: ConnectionParams,
    music_directory: PathBuf,
    connected: bool,
    reachable: HashSet<(String, u16)>,
    pub modes: PlaybackModes,
    pub stats: ServerStats,
    pub library_updates: usize,
    pub connect_log: Vec<ConnectionParams>,
    pub disconnects: usize,
}

impl FakeService {
    /// Connected to `host:port`, which is reachable.
    pub fn connected(host: &str, port: u16) -> Self {
        let mut reachable = HashSet::new();
        reachable.insert((host.to_string(), port));
        Self {
            params: ConnectionParams::new(host, port),
            music_directory: PathBuf::from("/var/lib/mpd/music"),
            connected: true,
            reachable,
            modes: PlaybackModes::default(),
            stats: ServerStats::default(),
            library_updates: 0,
            connect_log: Vec::new(),
            disconnects: 0,
        }
    }

    pub fn allow(&mut self, host: &str, port: u16) {
        self.reachable.insert((host.to_string(), port));
    }

    pub fn forbid(&mut self, host: &str, port: u16) {
        self.reachable.remove(&(host.to_string(), port));
    }
}

impl ServiceHandle for FakeService {
    fn params(&self) -> &ConnectionParams {
        &self.params
    }

    fn set_params(&mut self, params: ConnectionParams) {
        self.params = params;
    }

    fn music_directory(&self) -> &Path {
        &self.music_directory
    }

    fn set_music_directory(&mut self, dir: PathBuf) {
        self.music_directory = dir;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self, _timeout: Duration) -> anyhow::Result<()> {
        self.connected = false;
        self.connect_log.push(self.params.clone());
        if !self
            .reachable
            .contains(&(self.params.host.clone(), self.params.port))
        {
            bail!("connection refused by {}", self.params);
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) {
        if self.connected {
            self.disconnects += 1;
        }
        self.connected = false;
    }

    async fn playback_modes(&mut self) -> anyhow::Result<PlaybackModes> {
        if !self.connected {
            bail!("not connected");
        }
        Ok(self.modes)
    }

    async fn toggle(&mut self, mode: PlaybackMode) -> anyhow::Result<bool> {
        let on = !self.playback_modes().await?.get(mode);
        self.modes.set(mode, on);
        Ok(on)
    }

    async fn stats(&mut self) -> anyhow::Result<ServerStats> {
        if !self.connected {
            bail!("not connected");
        }
        Ok(self.stats)
    }

    async fn update_library(&mut self) -> anyhow::Result<()> {
        self.library_updates += 1;
        Ok(())
    }

    async fn rescan_library(&mut self) -> anyhow::Result<()> {
        self.library_updates += 1;
        Ok(())
    }
}

/// Store that keeps values in memory and can be told to fail writes.
#[derive(Default)]
pub struct MemoryStore {
    pub config: Config,
    pub writes: usize,
    pub fail_writes: bool,
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: SettingKey) -> SettingValue {
        self.config.get(key)
    }

    fn set_many(&mut self, values: &[SettingValue]) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Write {
                path: PathBuf::from("memory"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        for value in values {
            self.config.apply(value);
        }
        self.writes += 1;
        Ok(())
    }
}
