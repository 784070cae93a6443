//! The fixed set of editable settings and the values they carry.

use std::fmt;
use std::path::PathBuf;

use crate::error::SettingsError;

/// Named group of keys inside the persistent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    ServiceSettings,
}

impl Section {
    pub fn name(self) -> &'static str {
        match self {
            Section::ServiceSettings => "service settings",
        }
    }
}

/// One of the recognised setting keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingKey {
    Host,
    Port,
    MusicDirectory,
}

impl SettingKey {
    pub const ALL: [SettingKey; 3] = [SettingKey::Host, SettingKey::Port, SettingKey::MusicDirectory];

    pub fn section(self) -> Section {
        Section::ServiceSettings
    }

    /// Key name as it appears in the config file.
    pub fn name(self) -> &'static str {
        match self {
            SettingKey::Host => "host",
            SettingKey::Port => "port",
            SettingKey::MusicDirectory => "music directory",
        }
    }

    /// Host and port are validated together against the live service.
    pub fn is_connection(self) -> bool {
        matches!(self, SettingKey::Host | SettingKey::Port)
    }

    /// Parse raw keyboard text into a typed value for this key.
    ///
    /// Surrounding whitespace is ignored. Ports must lie in `1..=65535`,
    /// hosts must be non-empty, and a leading `~` in a directory expands to
    /// the home directory.
    pub fn parse(self, raw: &str) -> Result<SettingValue, SettingsError> {
        let text = raw.trim();
        let invalid = || SettingsError::InvalidValue {
            key: self,
            raw: raw.to_string(),
        };
        match self {
            SettingKey::Host => {
                if text.is_empty() || text.contains(char::is_whitespace) {
                    return Err(invalid());
                }
                Ok(SettingValue::Host(text.to_string()))
            }
            SettingKey::Port => match text.parse::<u16>() {
                Ok(port) if port > 0 => Ok(SettingValue::Port(port)),
                _ => Err(invalid()),
            },
            SettingKey::MusicDirectory => {
                if text.is_empty() {
                    return Err(invalid());
                }
                Ok(SettingValue::MusicDirectory(expand_home(text)))
            }
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn expand_home(text: &str) -> PathBuf {
    if text == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = text.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(text)
}

/// A typed value for one [`SettingKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Host(String),
    Port(u16),
    MusicDirectory(PathBuf),
}

impl SettingValue {
    pub fn key(&self) -> SettingKey {
        match self {
            SettingValue::Host(_) => SettingKey::Host,
            SettingValue::Port(_) => SettingKey::Port,
            SettingValue::MusicDirectory(_) => SettingKey::MusicDirectory,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Host(host) => f.write_str(host),
            SettingValue::Port(port) => write!(f, "{}", port),
            SettingValue::MusicDirectory(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Where the media service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
}

impl ConnectionParams {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Playback modes mirrored from the live service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackMode {
    Shuffle,
    Repeat,
    Single,
    Consume,
}

impl PlaybackMode {
    pub const ALL: [PlaybackMode; 4] = [
        PlaybackMode::Shuffle,
        PlaybackMode::Repeat,
        PlaybackMode::Single,
        PlaybackMode::Consume,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PlaybackMode::Shuffle => "Shuffle",
            PlaybackMode::Repeat => "Repeat",
            PlaybackMode::Single => "Single",
            PlaybackMode::Consume => "Consume playlist",
        }
    }

    /// MPD command name, which is also the `status` field name.
    pub fn mpd_name(self) -> &'static str {
        match self {
            PlaybackMode::Shuffle => "random",
            PlaybackMode::Repeat => "repeat",
            PlaybackMode::Single => "single",
            PlaybackMode::Consume => "consume",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackModes {
    pub shuffle: bool,
    pub repeat: bool,
    pub single: bool,
    pub consume: bool,
}

impl PlaybackModes {
    pub fn get(&self, mode: PlaybackMode) -> bool {
        match mode {
            PlaybackMode::Shuffle => self.shuffle,
            PlaybackMode::Repeat => self.repeat,
            PlaybackMode::Single => self.single,
            PlaybackMode::Consume => self.consume,
        }
    }

    pub fn set(&mut self, mode: PlaybackMode, on: bool) {
        match mode {
            PlaybackMode::Shuffle => self.shuffle = on,
            PlaybackMode::Repeat => self.repeat = on,
            PlaybackMode::Single => self.single = on,
            PlaybackMode::Consume => self.consume = on,
        }
    }
}
