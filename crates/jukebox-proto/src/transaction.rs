//! SettingsTransaction: stage → validate → commit-or-rollback.
//!
//! # States
//! ```text
//!  Empty ──stage──▶ Staging ──validate (all ok)──▶ Validated ──commit──▶ Committed
//!                      ▲                              │
//!                      └──── validate fails / stage ──┘
//!  cancel() from Empty | Staging | Validated ──▶ Cancelled
//! ```
//!
//! `Committed` and `Cancelled` are terminal; every operation on a finished
//! transaction fails with `TransactionClosed`.
//!
//! Host/port validation probes the candidate and then always reconnects to
//! the endpoint that was live before, so a candidate only becomes live on
//! `commit()`. The service and store are lent to each call rather than held,
//! which lets a screen keep the transaction across several input events.
//!
//! A host or port that is not staged is taken from the store as it was when
//! the transaction began, never from the live service. The pair that is
//! probed is therefore the pair that gets persisted and connected on commit,
//! even when the service was started on some other endpoint.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::SettingsStore;
use crate::error::SettingsError;
use crate::mpd::ServiceHandle;
use crate::probe::{ConnectionProbe, ProbeOutcome};
use crate::settings::{ConnectionParams, SettingKey, SettingValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Empty,
    Staging,
    Validated,
    Committed,
    Cancelled,
}

impl TransactionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionState::Committed | TransactionState::Cancelled)
    }
}

#[derive(Debug, Clone)]
struct Staged {
    value: SettingValue,
    validated: bool,
}

/// What a successful commit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub keys: Vec<SettingKey>,
    /// Whether the service is connected after the new values were applied.
    pub connected: bool,
}

/// Steps of a host/port check. Every path passes through `Restore`.
enum ProbeStep {
    Probe {
        snapshot: ConnectionParams,
        candidate: ConnectionParams,
    },
    Restore {
        snapshot: ConnectionParams,
        verdict: Result<(), SettingsError>,
    },
    Done(Result<(), SettingsError>),
}

#[derive(Debug)]
pub struct SettingsTransaction {
    probe: ConnectionProbe,
    /// Host and port as persisted when the transaction began.
    committed: ConnectionParams,
    staged: BTreeMap<SettingKey, Staged>,
    state: TransactionState,
}

impl SettingsTransaction {
    pub fn new<P: SettingsStore>(probe: ConnectionProbe, store: &P) -> Self {
        Self {
            probe,
            committed: stored_params(store),
            staged: BTreeMap::new(),
            state: TransactionState::Empty,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn staged(&self, key: SettingKey) -> Option<&SettingValue> {
        self.staged.get(&key).map(|s| &s.value)
    }

    pub fn is_validated(&self, key: SettingKey) -> bool {
        self.staged.get(&key).is_some_and(|s| s.validated)
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Record a candidate value. Touches neither the store nor the service.
    ///
    /// Re-staging a key clears its validation; re-staging host or port clears
    /// both, since they are checked as a pair.
    pub fn stage(&mut self, value: SettingValue) -> Result<(), SettingsError> {
        self.ensure_open()?;
        let key = value.key();
        debug!("transaction: staged {} = {}", key, value);
        self.staged.insert(
            key,
            Staged {
                value,
                validated: false,
            },
        );
        if key.is_connection() {
            self.mark_connection(false);
        }
        self.refresh_state();
        Ok(())
    }

    /// Parse keyboard text for `key` and stage it.
    pub fn stage_raw(&mut self, key: SettingKey, raw: &str) -> Result<(), SettingsError> {
        self.ensure_open()?;
        let value = key.parse(raw)?;
        self.stage(value)
    }

    /// Run the check for `key`. Validating a key that is not staged succeeds
    /// without doing anything.
    pub async fn validate<S: ServiceHandle>(
        &mut self,
        key: SettingKey,
        service: &mut S,
    ) -> Result<(), SettingsError> {
        self.ensure_open()?;
        let Some(staged) = self.staged.get(&key) else {
            return Ok(());
        };

        let verdict = match &staged.value {
            SettingValue::MusicDirectory(path) => check_directory(path),
            SettingValue::Host(_) | SettingValue::Port(_) => {
                let candidate = self.candidate_params();
                self.check_connection(service, candidate).await
            }
        };

        let ok = verdict.is_ok();
        if key.is_connection() {
            self.mark_connection(ok);
        } else if let Some(entry) = self.staged.get_mut(&key) {
            entry.validated = ok;
        }
        self.refresh_state();
        verdict
    }

    /// Validate every staged key that has not passed yet, stopping at the
    /// first failure.
    pub async fn validate_all<S: ServiceHandle>(&mut self, service: &mut S) -> Result<(), SettingsError> {
        self.ensure_open()?;
        let pending: Vec<SettingKey> = self
            .staged
            .iter()
            .filter(|(_, s)| !s.validated)
            .map(|(k, _)| *k)
            .collect();
        for key in pending {
            // Host and port share one probe.
            if self.is_validated(key) {
                continue;
            }
            self.validate(key, service).await?;
        }
        Ok(())
    }

    /// Persist every staged value, then apply them to the live service.
    ///
    /// Nothing is written unless every staged key has validated. The store is
    /// written before the service is touched; a failed write leaves both
    /// unchanged and the transaction open.
    pub async fn commit<S: ServiceHandle, P: SettingsStore>(
        &mut self,
        service: &mut S,
        store: &mut P,
    ) -> Result<CommitSummary, SettingsError> {
        self.ensure_open()?;
        if self.staged.is_empty() {
            return Err(SettingsError::NothingStaged);
        }
        if self.staged.values().any(|s| !s.validated) {
            return Err(SettingsError::PartialValidationFailure);
        }

        let values: Vec<SettingValue> = self.staged.values().map(|s| s.value.clone()).collect();
        store.set_many(&values)?;

        let mut connected = service.is_connected();
        if self.staged.keys().any(|k| k.is_connection()) {
            let params = self.candidate_params();
            match self.probe.try_connect(service, &params).await {
                ProbeOutcome::Connected => connected = true,
                ProbeOutcome::Failed { reason } => {
                    warn!("transaction: saved {} but reconnect failed: {}", params, reason);
                    connected = false;
                }
            }
        }
        if let Some(SettingValue::MusicDirectory(dir)) = self.staged(SettingKey::MusicDirectory) {
            service.set_music_directory(dir.clone());
        }

        self.state = TransactionState::Committed;
        let keys: Vec<SettingKey> = self.staged.keys().copied().collect();
        info!("transaction: committed {:?}", keys);
        Ok(CommitSummary { keys, connected })
    }

    /// Drop every staged value. Nothing outside the transaction changes.
    pub fn cancel(&mut self) -> Result<(), SettingsError> {
        self.ensure_open()?;
        self.staged.clear();
        self.state = TransactionState::Cancelled;
        debug!("transaction: cancelled");
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), SettingsError> {
        if self.state.is_terminal() {
            return Err(SettingsError::TransactionClosed);
        }
        Ok(())
    }

    fn refresh_state(&mut self) {
        self.state = if self.staged.is_empty() {
            TransactionState::Empty
        } else if self.staged.values().all(|s| s.validated) {
            TransactionState::Validated
        } else {
            TransactionState::Staging
        };
    }

    fn mark_connection(&mut self, validated: bool) {
        for key in [SettingKey::Host, SettingKey::Port] {
            if let Some(entry) = self.staged.get_mut(&key) {
                entry.validated = validated;
            }
        }
    }

    /// Staged host/port, falling back to the persisted ones for whichever is
    /// not staged.
    fn candidate_params(&self) -> ConnectionParams {
        let host = match self.staged(SettingKey::Host) {
            Some(SettingValue::Host(host)) => host.clone(),
            _ => self.committed.host.clone(),
        };
        let port = match self.staged(SettingKey::Port) {
            Some(SettingValue::Port(port)) => *port,
            _ => self.committed.port,
        };
        ConnectionParams::new(host, port)
    }

    async fn check_connection<S: ServiceHandle>(
        &self,
        service: &mut S,
        candidate: ConnectionParams,
    ) -> Result<(), SettingsError> {
        let mut step = ProbeStep::Probe {
            snapshot: service.params().clone(),
            candidate,
        };
        loop {
            step = match step {
                ProbeStep::Probe {
                    snapshot,
                    candidate,
                } => {
                    let verdict = match self.probe.try_connect(service, &candidate).await {
                        ProbeOutcome::Connected => {
                            debug!("transaction: {} answered", candidate);
                            Ok(())
                        }
                        ProbeOutcome::Failed { reason } => {
                            warn!("transaction: {} unreachable: {}", candidate, reason);
                            Err(SettingsError::ConnectionFailed {
                                host: candidate.host,
                                port: candidate.port,
                            })
                        }
                    };
                    ProbeStep::Restore { snapshot, verdict }
                }
                ProbeStep::Restore { snapshot, verdict } => {
                    self.probe.restore(service, &snapshot).await;
                    ProbeStep::Done(verdict)
                }
                ProbeStep::Done(verdict) => return verdict,
            };
        }
    }
}

fn stored_params<P: SettingsStore>(store: &P) -> ConnectionParams {
    let mut params = ConnectionParams::new(String::new(), 0);
    for key in [SettingKey::Host, SettingKey::Port] {
        match store.get(key) {
            SettingValue::Host(host) => params.host = host,
            SettingValue::Port(port) => params.port = port,
            SettingValue::MusicDirectory(_) => {}
        }
    }
    params
}

fn check_directory(path: &Path) -> Result<(), SettingsError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(SettingsError::InvalidDirectory {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeService, MemoryStore};
    use std::path::PathBuf;
    use std::time::Duration;

    fn probe() -> ConnectionProbe {
        ConnectionProbe::new(Duration::from_millis(50))
    }

    /// Begun against the default store, which holds localhost:6600.
    fn transaction() -> SettingsTransaction {
        SettingsTransaction::new(probe(), &MemoryStore::default())
    }

    fn localhost() -> ConnectionParams {
        ConnectionParams::new("localhost", 6600)
    }

    #[tokio::test]
    async fn test_stage_has_no_side_effects() {
        let mut service = FakeService::connected("localhost", 6600);
        let mut tx = transaction();
        assert_eq!(tx.state(), TransactionState::Empty);

        tx.stage_raw(SettingKey::Host, "10.0.0.5").unwrap();

        assert_eq!(tx.state(), TransactionState::Staging);
        assert_eq!(tx.staged(SettingKey::Host), Some(&SettingValue::Host("10.0.0.5".into())));
        assert!(service.connect_log.is_empty());
        assert_eq!(service.params(), &localhost());
        // Validating something that was never staged is a no-op.
        tx.validate(SettingKey::MusicDirectory, &mut service).await.unwrap();
        assert!(service.connect_log.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_rolls_back() {
        let mut service = FakeService::connected("localhost", 6600);
        let mut tx = transaction();
        tx.stage_raw(SettingKey::Host, "10.0.0.5").unwrap();
        tx.stage_raw(SettingKey::Port, "6600").unwrap();

        let err = tx.validate(SettingKey::Host, &mut service).await.unwrap_err();

        match err {
            SettingsError::ConnectionFailed { host, port } => {
                assert_eq!(host, "10.0.0.5");
                assert_eq!(port, 6600);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(service.params(), &localhost());
        assert!(service.is_connected());
        assert_eq!(tx.state(), TransactionState::Staging);
        assert!(!tx.is_validated(SettingKey::Host));
    }

    #[tokio::test]
    async fn test_reachable_host_still_reverts_until_commit() {
        let mut service = FakeService::connected("localhost", 6600);
        service.allow("10.0.0.5", 6600);
        let mut tx = transaction();
        tx.stage_raw(SettingKey::Host, "10.0.0.5").unwrap();

        tx.validate(SettingKey::Host, &mut service).await.unwrap();

        assert_eq!(tx.state(), TransactionState::Validated);
        assert_eq!(service.params(), &localhost());
        assert!(service.is_connected());
        assert_eq!(
            service.connect_log,
            vec![ConnectionParams::new("10.0.0.5", 6600), localhost()]
        );
    }

    #[tokio::test]
    async fn test_validate_is_idempotent() {
        for reachable in [true, false] {
            let mut service = FakeService::connected("localhost", 6600);
            if reachable {
                service.allow("jukebox", 6601);
            }
            let mut tx = transaction();
            tx.stage_raw(SettingKey::Host, "jukebox").unwrap();
            tx.stage_raw(SettingKey::Port, "6601").unwrap();

            let first = tx.validate(SettingKey::Port, &mut service).await.is_ok();
            let after_first = service.params().clone();
            let second = tx.validate(SettingKey::Port, &mut service).await.is_ok();

            assert_eq!(first, reachable);
            assert_eq!(first, second);
            assert_eq!(after_first, localhost());
            assert_eq!(service.params(), &localhost());
        }
    }

    #[tokio::test]
    async fn test_commit_refuses_unvalidated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = FakeService::connected("localhost", 6600);
        let mut store = MemoryStore::default();
        let before = store.config.clone();
        let mut tx = transaction();
        tx.stage(SettingValue::MusicDirectory(dir.path().to_path_buf()))
            .unwrap();
        tx.validate(SettingKey::MusicDirectory, &mut service).await.unwrap();
        tx.stage_raw(SettingKey::Port, "6601").unwrap();

        let err = tx.commit(&mut service, &mut store).await.unwrap_err();

        assert!(matches!(err, SettingsError::PartialValidationFailure));
        assert_eq!(store.writes, 0);
        assert_eq!(store.config, before);
        assert!(service.connect_log.is_empty());
        assert_eq!(tx.state(), TransactionState::Staging);
    }

    #[tokio::test]
    async fn test_commit_writes_everything_and_goes_live() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = FakeService::connected("localhost", 6600);
        service.allow("10.0.0.5", 6601);
        let mut store = MemoryStore::default();
        let mut tx = transaction();
        tx.stage_raw(SettingKey::Host, "10.0.0.5").unwrap();
        tx.stage_raw(SettingKey::Port, "6601").unwrap();
        tx.stage(SettingValue::MusicDirectory(dir.path().to_path_buf()))
            .unwrap();
        tx.validate_all(&mut service).await.unwrap();
        assert_eq!(tx.state(), TransactionState::Validated);

        let summary = tx.commit(&mut service, &mut store).await.unwrap();

        assert!(summary.connected);
        assert_eq!(summary.keys.len(), 3);
        assert_eq!(store.writes, 1);
        assert_eq!(store.get(SettingKey::Host), SettingValue::Host("10.0.0.5".into()));
        assert_eq!(store.get(SettingKey::Port), SettingValue::Port(6601));
        assert_eq!(
            store.get(SettingKey::MusicDirectory),
            SettingValue::MusicDirectory(dir.path().to_path_buf())
        );
        assert_eq!(service.params(), &ConnectionParams::new("10.0.0.5", 6601));
        assert!(service.is_connected());
        assert_eq!(service.music_directory(), dir.path());
        assert_eq!(tx.state(), TransactionState::Committed);
    }

    #[tokio::test]
    async fn test_validate_all_probes_pair_once() {
        let mut service = FakeService::connected("localhost", 6600);
        service.allow("jukebox", 6601);
        let mut tx = transaction();
        tx.stage_raw(SettingKey::Host, "jukebox").unwrap();
        tx.stage_raw(SettingKey::Port, "6601").unwrap();

        tx.validate_all(&mut service).await.unwrap();

        // One probe plus one restore.
        assert_eq!(service.connect_log.len(), 2);
        assert!(tx.is_validated(SettingKey::Host));
        assert!(tx.is_validated(SettingKey::Port));
    }

    #[tokio::test]
    async fn test_directory_validation() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("song.flac");
        std::fs::write(&file, b"").unwrap();
        let mut service = FakeService::connected("localhost", 6600);
        let mut tx = transaction();

        tx.stage(SettingValue::MusicDirectory(PathBuf::from("/no/such/dir")))
            .unwrap();
        match tx.validate(SettingKey::MusicDirectory, &mut service).await {
            Err(SettingsError::InvalidDirectory { path }) => {
                assert_eq!(path, PathBuf::from("/no/such/dir"))
            }
            other => panic!("unexpected result: {other:?}"),
        }

        tx.stage(SettingValue::MusicDirectory(file)).unwrap();
        assert!(tx.validate(SettingKey::MusicDirectory, &mut service).await.is_err());

        tx.stage(SettingValue::MusicDirectory(dir.path().to_path_buf()))
            .unwrap();
        tx.validate(SettingKey::MusicDirectory, &mut service).await.unwrap();
        assert_eq!(tx.state(), TransactionState::Validated);
        assert!(service.connect_log.is_empty());
    }

    #[tokio::test]
    async fn test_restaging_clears_validation() {
        let mut service = FakeService::connected("localhost", 6600);
        service.allow("jukebox", 6600);
        let mut tx = transaction();
        tx.stage_raw(SettingKey::Host, "jukebox").unwrap();
        tx.validate(SettingKey::Host, &mut service).await.unwrap();
        assert_eq!(tx.state(), TransactionState::Validated);

        tx.stage_raw(SettingKey::Port, "7000").unwrap();

        assert!(!tx.is_validated(SettingKey::Host));
        assert_eq!(tx.state(), TransactionState::Staging);
    }

    #[tokio::test]
    async fn test_failed_store_write_keeps_service_untouched() {
        let mut service = FakeService::connected("localhost", 6600);
        service.allow("jukebox", 6600);
        let mut store = MemoryStore {
            fail_writes: true,
            ..Default::default()
        };
        let mut tx = transaction();
        tx.stage_raw(SettingKey::Host, "jukebox").unwrap();
        tx.validate(SettingKey::Host, &mut service).await.unwrap();
        let probes = service.connect_log.len();

        let err = tx.commit(&mut service, &mut store).await.unwrap_err();

        assert!(matches!(err, SettingsError::Store(_)));
        assert_eq!(service.params(), &localhost());
        assert_eq!(service.connect_log.len(), probes);
        assert_eq!(tx.state(), TransactionState::Validated);
    }

    #[tokio::test]
    async fn test_empty_commit_and_closed_transactions() {
        let mut service = FakeService::connected("localhost", 6600);
        let mut store = MemoryStore::default();
        let mut tx = transaction();

        assert!(matches!(
            tx.commit(&mut service, &mut store).await,
            Err(SettingsError::NothingStaged)
        ));

        tx.stage_raw(SettingKey::Port, "6601").unwrap();
        tx.cancel().unwrap();
        assert_eq!(tx.state(), TransactionState::Cancelled);
        assert!(tx.is_empty());
        assert_eq!(store.writes, 0);
        assert!(service.connect_log.is_empty());

        assert!(matches!(
            tx.stage_raw(SettingKey::Port, "6602"),
            Err(SettingsError::TransactionClosed)
        ));
        assert!(matches!(tx.cancel(), Err(SettingsError::TransactionClosed)));
        assert!(matches!(
            tx.validate(SettingKey::Port, &mut service).await,
            Err(SettingsError::TransactionClosed)
        ));
    }

    #[tokio::test]
    async fn test_unstaged_key_comes_from_store_not_live_service() {
        // Started on an endpoint the store does not know about.
        let mut service = FakeService::connected("override.host", 6600);
        service.allow("localhost", 6601);
        let mut store = MemoryStore::default();
        let mut tx = SettingsTransaction::new(probe(), &store);
        tx.stage_raw(SettingKey::Port, "6601").unwrap();

        tx.validate(SettingKey::Port, &mut service).await.unwrap();
        assert_eq!(
            service.connect_log,
            vec![
                ConnectionParams::new("localhost", 6601),
                ConnectionParams::new("override.host", 6600),
            ]
        );
        assert_eq!(service.params(), &ConnectionParams::new("override.host", 6600));

        tx.commit(&mut service, &mut store).await.unwrap();

        let persisted = store.config.service.params();
        assert_eq!(persisted, ConnectionParams::new("localhost", 6601));
        assert_eq!(service.params(), &persisted);
        assert!(service.is_connected());
    }

    #[tokio::test]
    async fn test_commit_keeps_values_when_reconnect_fails() {
        let mut service = FakeService::connected("localhost", 6600);
        service.allow("jukebox", 6600);
        let mut store = MemoryStore::default();
        let mut tx = transaction();
        tx.stage_raw(SettingKey::Host, "jukebox").unwrap();
        tx.validate(SettingKey::Host, &mut service).await.unwrap();
        let disconnects = service.disconnects;
        service.forbid("jukebox", 6600);

        let summary = tx.commit(&mut service, &mut store).await.unwrap();

        assert!(!summary.connected);
        assert_eq!(store.config.service.host, "jukebox");
        assert_eq!(service.params(), &ConnectionParams::new("jukebox", 6600));
        assert!(!service.is_connected());
        // The live connection was dropped once to try the new endpoint.
        assert_eq!(service.disconnects, disconnects + 1);
        assert_eq!(tx.state(), TransactionState::Committed);
    }

    #[test]
    fn test_invalid_raw_value_is_not_staged() {
        let mut tx = transaction();
        assert!(matches!(
            tx.stage_raw(SettingKey::Port, "99999"),
            Err(SettingsError::InvalidValue { .. })
        ));
        assert!(tx.is_empty());
        assert_eq!(tx.state(), TransactionState::Empty);
    }
}
