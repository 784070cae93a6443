//! MPD client speaking the line-based text protocol over TCP.
//!
//! Protocol shape:
//!
//! ```text
//!   connect   → server greets "OK MPD <version>"
//!   "<cmd>\n" → zero or more "key: value" lines, then "OK" or "ACK [..] {cmd} msg"
//! ```
//!
//! Public API:
//!   - `ServiceHandle`: what the settings protocol and the screens need from
//!     the live service.
//!   - `MpdClient`: the real implementation. Every network step is bounded by
//!     a timeout so a dead host cannot hang the interface forever.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::settings::{ConnectionParams, PlaybackMode, PlaybackModes};

/// Library statistics as reported by the `stats` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerStats {
    pub artists: u64,
    pub albums: u64,
    pub songs: u64,
    /// Sum of all song durations in the database, in seconds.
    pub db_playtime: u64,
}

/// A live, owned connection to the media service.
///
/// Connection parameters are only meant to be changed by the settings
/// transaction and the connection probe; screens get read access.
#[allow(async_fn_in_trait)]
pub trait ServiceHandle {
    fn params(&self) -> &ConnectionParams;
    fn set_params(&mut self, params: ConnectionParams);
    fn music_directory(&self) -> &Path;
    fn set_music_directory(&mut self, dir: PathBuf);
    fn is_connected(&self) -> bool;

    /// Drop any existing connection and connect to `params()`.
    async fn connect(&mut self, timeout: Duration) -> anyhow::Result<()>;
    async fn disconnect(&mut self);

    async fn playback_modes(&mut self) -> anyhow::Result<PlaybackModes>;
    /// Flip one mode and return its new state.
    async fn toggle(&mut self, mode: PlaybackMode) -> anyhow::Result<bool>;
    async fn stats(&mut self) -> anyhow::Result<ServerStats>;
    async fn update_library(&mut self) -> anyhow::Result<()>;
    async fn rescan_library(&mut self) -> anyhow::Result<()>;
}

// ── connection ────────────────────────────────────────────────────────────────

enum Reply {
    Ok(Vec<(String, String)>),
    Ack(String),
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    version: String,
}

impl Connection {
    /// Connect and read the greeting, all within one `timeout`.
    async fn open(params: &ConnectionParams, timeout: Duration) -> anyhow::Result<Self> {
        tokio::time::timeout(timeout, Self::handshake(params))
            .await
            .map_err(|_| anyhow!("connect to {} timed out", params))?
    }

    async fn handshake(params: &ConnectionParams) -> anyhow::Result<Self> {
        let stream = TcpStream::connect((params.host.as_str(), params.port))
            .await
            .with_context(|| format!("connect to {}", params))?;

        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let mut greeting = String::new();
        if reader.read_line(&mut greeting).await? == 0 {
            bail!("{} closed the connection before greeting", params);
        }
        let greeting = greeting.trim_end_matches(['\r', '\n']);
        let version = greeting
            .strip_prefix("OK MPD ")
            .ok_or_else(|| anyhow!("{} is not an MPD server (greeting {:?})", params, greeting))?
            .to_string();

        Ok(Self {
            reader,
            writer: write_half,
            version,
        })
    }

    async fn exchange(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> anyhow::Result<Reply> {
        let mut line = command.to_string();
        line.push('\n');
        tokio::time::timeout(timeout, self.writer.write_all(line.as_bytes()))
            .await
            .map_err(|_| anyhow!("mpd write timeout for {:?}", command))??;

        let mut pairs = Vec::new();
        loop {
            let reply = read_line(&mut self.reader, timeout).await?;
            if reply == "OK" {
                return Ok(Reply::Ok(pairs));
            }
            if let Some(ack) = reply.strip_prefix("ACK ") {
                return Ok(Reply::Ack(ack.to_string()));
            }
            match reply.split_once(": ") {
                Some((key, value)) => pairs.push((key.to_string(), value.to_string())),
                None => warn!("mpd: unexpected reply line {:?}", reply),
            }
        }
    }
}

async fn read_line(reader: &mut BufReader<OwnedReadHalf>, timeout: Duration) -> anyhow::Result<String> {
    let mut buf = String::new();
    let n = tokio::time::timeout(timeout, reader.read_line(&mut buf))
        .await
        .map_err(|_| anyhow!("mpd read timeout"))??;
    if n == 0 {
        bail!("mpd closed the connection");
    }
    Ok(buf.trim_end_matches(['\r', '\n']).to_string())
}

fn field<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn flag(pairs: &[(String, String)], key: &str) -> bool {
    // `single` may also report "oneshot", which counts as on.
    matches!(field(pairs, key), Some(v) if v != "0")
}

fn count(pairs: &[(String, String)], key: &str) -> u64 {
    field(pairs, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

// ── client ────────────────────────────────────────────────────────────────────

pub struct MpdClient {
    params: ConnectionParams,
    music_directory: PathBuf,
    command_timeout: Duration,
    conn: Option<Connection>,
}

impl MpdClient {
    pub fn new(params: ConnectionParams, music_directory: PathBuf, command_timeout: Duration) -> Self {
        Self {
            params,
            music_directory,
            command_timeout,
            conn: None,
        }
    }

    /// Protocol version announced by the server, while connected.
    pub fn server_version(&self) -> Option<&str> {
        self.conn.as_ref().map(|c| c.version.as_str())
    }

    /// Run one command. An I/O failure (not an `ACK`) drops the connection
    /// so that `is_connected()` reflects reality afterwards.
    pub async fn command(&mut self, command: &str) -> anyhow::Result<Vec<(String, String)>> {
        let timeout = self.command_timeout;
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| anyhow!("not connected to mpd at {}", self.params))?;
        debug!("mpd: > {}", command);
        match conn.exchange(command, timeout).await {
            Ok(Reply::Ok(pairs)) => Ok(pairs),
            Ok(Reply::Ack(message)) => bail!("mpd rejected {:?}: {}", command, message),
            Err(e) => {
                warn!("mpd: dropping connection after error: {}", e);
                self.conn = None;
                Err(e)
            }
        }
    }
}

impl ServiceHandle for MpdClient {
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
        self.conn.is_some()
    }

    async fn connect(&mut self, timeout: Duration) -> anyhow::Result<()> {
        self.disconnect().await;
        let conn = Connection::open(&self.params, timeout).await?;
        info!("mpd: connected to {} (protocol {})", self.params, conn.version);
        self.conn = Some(conn);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            // Best effort: the server also cleans up when the socket closes.
            let _ = tokio::time::timeout(self.command_timeout, async {
                conn.writer.write_all(b"close\n").await?;
                conn.writer.shutdown().await
            })
            .await;
            debug!("mpd: disconnected from {}", self.params);
        }
    }

    async fn playback_modes(&mut self) -> anyhow::Result<PlaybackModes> {
        let status = self.command("status").await?;
        let mut modes = PlaybackModes::default();
        for mode in PlaybackMode::ALL {
            modes.set(mode, flag(&status, mode.mpd_name()));
        }
        Ok(modes)
    }

    async fn toggle(&mut self, mode: PlaybackMode) -> anyhow::Result<bool> {
        let on = !self.playback_modes().await?.get(mode);
        self.command(&format!("{} {}", mode.mpd_name(), u8::from(on)))
            .await?;
        info!("mpd: {} -> {}", mode.mpd_name(), on);
        Ok(on)
    }

    async fn stats(&mut self) -> anyhow::Result<ServerStats> {
        let pairs = self.command("stats").await?;
        Ok(ServerStats {
            artists: count(&pairs, "artists"),
            albums: count(&pairs, "albums"),
            songs: count(&pairs, "songs"),
            db_playtime: count(&pairs, "db_playtime"),
        })
    }

    async fn update_library(&mut self) -> anyhow::Result<()> {
        self.command("update").await.map(|_| ())
    }

    async fn rescan_library(&mut self) -> anyhow::Result<()> {
        self.command("rescan").await.map(|_| ())
    }
}
