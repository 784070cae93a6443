//! End-to-end checks of the settings protocol against a real TCP server and a
//! settings file on disk.

mod common;

use std::path::PathBuf;
use std::time::Duration;

use common::mpd_server::{unused_port, FakeMpd};
use jukebox_proto::{
    ConfigFile, ConnectionParams, ConnectionProbe, MpdClient, ServiceHandle, SettingKey,
    SettingValue, SettingsError, SettingsStore, SettingsTransaction, TransactionState,
};

const TIMEOUT: Duration = Duration::from_millis(500);

struct Rig {
    _dir: tempfile::TempDir,
    store: ConfigFile,
    mpd: MpdClient,
    music: PathBuf,
}

/// A settings file pointing at a running fake server, and a client connected
/// to it.
async fn rig(server: &FakeMpd) -> Rig {
    let dir = tempfile::tempdir().unwrap();
    let music = dir.path().join("music");
    std::fs::create_dir(&music).unwrap();

    let mut store = ConfigFile::open(dir.path().join("config.toml")).unwrap();
    store
        .set_many(&[
            SettingValue::Host("127.0.0.1".into()),
            SettingValue::Port(server.port),
        ])
        .unwrap();

    let settings = &store.config().service;
    let mut mpd = MpdClient::new(settings.params(), settings.music_directory.clone(), TIMEOUT);
    mpd.connect(TIMEOUT).await.unwrap();

    Rig {
        _dir: dir,
        store,
        mpd,
        music,
    }
}

fn transaction(store: &ConfigFile) -> SettingsTransaction {
    SettingsTransaction::new(ConnectionProbe::new(TIMEOUT), store)
}

#[tokio::test]
async fn unreachable_candidate_restores_live_connection() {
    let server = FakeMpd::start().await;
    let mut rig = rig(&server).await;
    let before = rig.mpd.params().clone();
    let dead_port = unused_port().await;

    let mut tx = transaction(&rig.store);
    tx.stage_raw(SettingKey::Port, &dead_port.to_string()).unwrap();
    let err = tx.validate(SettingKey::Port, &mut rig.mpd).await.unwrap_err();

    match err {
        SettingsError::ConnectionFailed { host, port } => {
            assert_eq!(host, "127.0.0.1");
            assert_eq!(port, dead_port);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(rig.mpd.params(), &before);
    assert!(rig.mpd.is_connected());
    assert_eq!(
        rig.store.get(SettingKey::Port),
        SettingValue::Port(server.port)
    );
}

#[tokio::test]
async fn commit_moves_service_to_new_server() {
    let old = FakeMpd::start().await;
    let new = FakeMpd::start().await;
    let mut rig = rig(&old).await;

    let mut tx = transaction(&rig.store);
    tx.stage_raw(SettingKey::Port, &new.port.to_string()).unwrap();
    tx.validate(SettingKey::Port, &mut rig.mpd).await.unwrap();
    // Validation alone never leaves the candidate live.
    assert_eq!(rig.mpd.params().port, old.port);

    let summary = tx.commit(&mut rig.mpd, &mut rig.store).await.unwrap();

    assert!(summary.connected);
    assert_eq!(rig.mpd.params(), &ConnectionParams::new("127.0.0.1", new.port));
    assert!(rig.mpd.is_connected());
    let reopened = ConfigFile::open(rig.store.path()).unwrap();
    assert_eq!(reopened.get(SettingKey::Port), SettingValue::Port(new.port));
    // probe + final connect
    assert_eq!(new.accepted(), 2);
}

#[tokio::test]
async fn music_directory_commit_then_fresh_validation() {
    let server = FakeMpd::start().await;
    let mut rig = rig(&server).await;

    let mut tx = transaction(&rig.store);
    tx.stage(SettingValue::MusicDirectory(rig.music.clone())).unwrap();
    tx.validate_all(&mut rig.mpd).await.unwrap();
    tx.commit(&mut rig.mpd, &mut rig.store).await.unwrap();

    assert_eq!(
        rig.store.get(SettingKey::MusicDirectory),
        SettingValue::MusicDirectory(rig.music.clone())
    );
    assert_eq!(rig.mpd.music_directory(), rig.music.as_path());

    let mut again = transaction(&rig.store);
    again
        .stage(SettingValue::MusicDirectory(rig.music.clone()))
        .unwrap();
    again
        .validate(SettingKey::MusicDirectory, &mut rig.mpd)
        .await
        .unwrap();
    assert_eq!(again.state(), TransactionState::Validated);
}

#[tokio::test]
async fn partial_validation_writes_nothing() {
    let server = FakeMpd::start().await;
    let mut rig = rig(&server).await;
    let on_disk = std::fs::read_to_string(rig.store.path()).unwrap();

    let mut tx = transaction(&rig.store);
    tx.stage(SettingValue::MusicDirectory(rig.music.clone())).unwrap();
    tx.validate(SettingKey::MusicDirectory, &mut rig.mpd).await.unwrap();
    tx.stage_raw(SettingKey::Host, "localhost").unwrap();

    let err = tx.commit(&mut rig.mpd, &mut rig.store).await.unwrap_err();

    assert!(matches!(err, SettingsError::PartialValidationFailure));
    assert_eq!(std::fs::read_to_string(rig.store.path()).unwrap(), on_disk);
    assert_eq!(rig.mpd.params().port, server.port);
}

#[tokio::test]
async fn service_started_elsewhere_commits_the_probed_pair() {
    let stored = FakeMpd::start().await;
    let started_on = FakeMpd::start().await;
    let mut rig = rig(&stored).await;
    // Live on a different server than the file names, as after --port.
    rig.mpd.set_params(ConnectionParams::new("127.0.0.1", started_on.port));
    rig.mpd.connect(TIMEOUT).await.unwrap();
    let target = FakeMpd::start().await;

    let mut tx = transaction(&rig.store);
    tx.stage_raw(SettingKey::Port, &target.port.to_string()).unwrap();
    tx.validate(SettingKey::Port, &mut rig.mpd).await.unwrap();
    assert_eq!(rig.mpd.params().port, started_on.port);
    tx.commit(&mut rig.mpd, &mut rig.store).await.unwrap();

    let reopened = ConfigFile::open(rig.store.path()).unwrap();
    let persisted = reopened.config().service.params();
    assert_eq!(persisted, ConnectionParams::new("127.0.0.1", target.port));
    assert_eq!(rig.mpd.params(), &persisted);
    assert!(rig.mpd.is_connected());
}
