//! Settings core for pi-jukebox: the persisted MPD settings, the live MPD
//! connection, and the transaction that moves one safely to the other.

pub mod config;
pub mod error;
pub mod mpd;
pub mod platform;
pub mod probe;
pub mod settings;
pub mod transaction;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

pub use config::{Config, ConfigFile, SettingsStore};
pub use error::{SettingsError, StoreError};
pub use mpd::{MpdClient, ServerStats, ServiceHandle};
pub use probe::{ConnectionProbe, ProbeOutcome};
pub use settings::{ConnectionParams, PlaybackMode, PlaybackModes, SettingKey, SettingValue};
pub use transaction::{CommitSummary, SettingsTransaction, TransactionState};
