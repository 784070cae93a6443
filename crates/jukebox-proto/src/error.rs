use std::path::PathBuf;

use thiserror::Error;

use crate::settings::SettingKey;

/// Failures of the settings-change protocol. All of them are recoverable by
/// the operator: correct the input and retry, or cancel.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("couldn't connect to the mpd server {host} on port {port}")]
    ConnectionFailed { host: String, port: u16 },

    #[error("the music directory {} does not exist", path.display())]
    InvalidDirectory { path: PathBuf },

    #[error("not every changed setting has been checked yet")]
    PartialValidationFailure,

    #[error("there are no changes to save")]
    NothingStaged,

    #[error("{raw:?} is not a valid {key}")]
    InvalidValue { key: SettingKey, raw: String },

    #[error("settings transaction is already finished")]
    TransactionClosed,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures reading or writing the settings file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read settings file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialise settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write settings file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
