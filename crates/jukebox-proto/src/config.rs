use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use super::error::StoreError;
use super::platform;
use super::settings::{ConnectionParams, SettingKey, SettingValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, rename = "service settings")]
    pub service: ServiceSettings,
    #[serde(default)]
    pub interface: InterfaceConfig,
    #[serde(default)]
    pub system: SystemConfig,
}

/// Where the MPD server lives and which directory it serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_music_directory", rename = "music directory")]
    pub music_directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Upper bound on a single connect attempt, including the greeting.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Upper bound on one MPD command round trip.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Run `sudo shutdown` for the shutdown/reboot buttons. When false those
    /// buttons only quit the application.
    #[serde(default)]
    pub power_commands: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            music_directory: default_music_directory(),
        }
    }
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout_ms(),
            command_timeout_ms: default_command_timeout_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

fn default_host() -> String {
    platform::DEFAULT_MPD_HOST.to_string()
}

fn default_port() -> u16 {
    platform::DEFAULT_MPD_PORT
}

fn default_music_directory() -> PathBuf {
    platform::default_music_dir()
}

fn default_probe_timeout_ms() -> u64 {
    3000
}

fn default_command_timeout_ms() -> u64 {
    5000
}

fn default_tick_ms() -> u64 {
    100
}

impl ServiceSettings {
    pub fn params(&self) -> ConnectionParams {
        ConnectionParams::new(self.host.clone(), self.port)
    }
}

impl InterfaceConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(10))
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    pub fn get(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::Host => SettingValue::Host(self.service.host.clone()),
            SettingKey::Port => SettingValue::Port(self.service.port),
            SettingKey::MusicDirectory => {
                SettingValue::MusicDirectory(self.service.music_directory.clone())
            }
        }
    }

    pub fn apply(&mut self, value: &SettingValue) {
        match value {
            SettingValue::Host(host) => self.service.host = host.clone(),
            SettingValue::Port(port) => self.service.port = *port,
            SettingValue::MusicDirectory(dir) => self.service.music_directory = dir.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            interface: InterfaceConfig::default(),
            system: SystemConfig::default(),
        }
    }
}

/// Durable key/value access to the settings, addressed by [`SettingKey`]
/// (each key knows its section).
pub trait SettingsStore {
    fn get(&self, key: SettingKey) -> SettingValue;

    /// Overwrite every value in one write. Either all of them become
    /// visible or, on error, none of them do.
    fn set_many(&mut self, values: &[SettingValue]) -> Result<(), StoreError>;

    fn set(&mut self, value: SettingValue) -> Result<(), StoreError> {
        self.set_many(std::slice::from_ref(&value))
    }
}

/// The TOML settings file plus its parsed contents.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    config: Config,
}

impl ConfigFile {
    /// Load `path`, writing the defaults there first if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if !path.exists() {
            info!("settings file {} missing, writing defaults", path.display());
            let file = Self {
                path,
                config: Config::default(),
            };
            file.save()?;
            return Ok(file);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| StoreError::Read {
            path: path.clone(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| StoreError::Parse {
            path: path.clone(),
            source: e,
        })?;
        debug!("loaded settings from {}", path.display());
        Ok(Self { path, config })
    }

    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(Config::config_path())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<(), StoreError> {
        write_atomically(&self.path, &self.config)
    }
}

impl SettingsStore for ConfigFile {
    fn get(&self, key: SettingKey) -> SettingValue {
        self.config.get(key)
    }

    fn set_many(&mut self, values: &[SettingValue]) -> Result<(), StoreError> {
        let mut next = self.config.clone();
        for value in values {
            next.apply(value);
        }
        write_atomically(&self.path, &next)?;
        self.config = next;
        info!(
            "saved {} setting(s) to {}",
            values.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Serialise to a sibling temp file and rename it over `path`, so readers
/// never observe a half-written file.
fn write_atomically(path: &Path, config: &Config) -> Result<(), StoreError> {
    let content = toml::to_string_pretty(config)?;
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
