mod action;
mod app;
mod app_state;
mod navigator;
mod screen;
mod screens;
mod theme;
mod widgets;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use jukebox_proto::{platform, ConfigFile, MpdClient, ServiceHandle};

use crate::action::Exit;

#[derive(Debug, Parser)]
#[command(name = "pi-jukebox", version, about = "Touch-style MPD settings console")]
struct Cli {
    /// Settings file to use instead of the default one.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Connect to this MPD host for this run only.
    #[arg(long)]
    host: Option<String>,

    /// Connect to this MPD port for this run only.
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = platform::log_path();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // RUST_LOG overrides the default filter.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("pi-jukebox log: {}", log_path.display());
    info!("pi-jukebox starting…");

    // ── Load settings ────────────────────────────────────────────────────────
    let store = match &cli.config {
        Some(path) => ConfigFile::open(path.clone()),
        None => ConfigFile::open_default(),
    }
    .context("could not load settings")?;
    let config = store.config().clone();
    info!("settings: {}", store.path().display());

    // Overrides apply to the live connection only; the file keeps its values.
    let mut params = config.service.params();
    if let Some(host) = cli.host {
        params.host = host;
    }
    if let Some(port) = cli.port {
        params.port = port;
    }

    // ── Connect to MPD ───────────────────────────────────────────────────────
    let mut client = MpdClient::new(
        params,
        config.service.music_directory.clone(),
        config.interface.command_timeout(),
    );
    match client.connect(config.interface.probe_timeout()).await {
        Ok(()) => info!(
            "mpd {} answered (protocol {})",
            client.params(),
            client.server_version().unwrap_or("?")
        ),
        Err(e) => warn!("mpd {} unavailable at start-up: {:#}", client.params(), e),
    }

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let power_commands = config.system.power_commands;
    let app = app::App::new(client, store, &config.interface, power_commands);
    let exit = app.run().await?;

    if power_commands {
        power_off(exit).await?;
    } else if exit != Exit::Quit {
        info!("{:?} requested but power commands are disabled", exit);
    }
    Ok(())
}

/// Hand shutdown or reboot to the host. Quit needs nothing.
async fn power_off(exit: Exit) -> anyhow::Result<()> {
    let flag = match exit {
        Exit::Quit => return Ok(()),
        Exit::Shutdown => "-h",
        Exit::Reboot => "-r",
    };
    info!("running sudo shutdown {} now", flag);
    let status = tokio::process::Command::new("sudo")
        .args(["shutdown", flag, "now"])
        .status()
        .await
        .context("failed to run shutdown")?;
    if !status.success() {
        anyhow::bail!("shutdown {} exited with {}", flag, status);
    }
    Ok(())
}
