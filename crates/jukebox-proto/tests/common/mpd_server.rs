#![allow(dead_code)]

//! Minimal MPD server for exercising the client over real TCP.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Default)]
pub struct ServerState {
    pub random: bool,
    pub repeat: bool,
    pub single: bool,
    pub consume: bool,
    pub accepted: usize,
    pub commands: Vec<String>,
}

pub struct FakeMpd {
    pub port: u16,
    pub state: Arc<Mutex<ServerState>>,
}

impl FakeMpd {
    pub async fn start() -> Self {
        Self::start_with_greeting(Some("OK MPD 0.23.5")).await
    }

    /// A server that accepts TCP but does not speak MPD.
    pub async fn start_impostor() -> Self {
        Self::start_with_greeting(Some("SSH-2.0-OpenSSH_9.6")).await
    }

    /// A server that accepts TCP and then never says anything.
    pub async fn start_silent() -> Self {
        Self::start_with_greeting(None).await
    }

    async fn start_with_greeting(greeting: Option<&'static str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake mpd");
        let port = listener.local_addr().expect("local addr").port();
        let state = Arc::new(Mutex::new(ServerState::default()));

        let shared = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                shared.lock().unwrap().accepted += 1;
                tokio::spawn(serve(stream, shared.clone(), greeting));
            }
        });

        Self { port, state }
    }

    pub fn accepted(&self) -> usize {
        self.state.lock().unwrap().accepted
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }
}

async fn serve(stream: TcpStream, state: Arc<Mutex<ServerState>>, greeting: Option<&str>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    let Some(greeting) = greeting else {
        // Hold the socket open until the client gives up.
        while let Ok(Some(_)) = lines.next_line().await {}
        return;
    };
    if write_half
        .write_all(format!("{}\n", greeting).as_bytes())
        .await
        .is_err()
    {
        return;
    }

    while let Ok(Some(line)) = lines.next_line().await {
        if line == "close" {
            return;
        }
        let reply = respond(&line, &state);
        if write_half.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }
}

fn respond(line: &str, state: &Arc<Mutex<ServerState>>) -> String {
    let mut s = state.lock().unwrap();
    s.commands.push(line.to_string());
    let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
    let on = arg == "1";
    match cmd {
        "status" => format!(
            "volume: 50\nrandom: {}\nrepeat: {}\nsingle: {}\nconsume: {}\nstate: stop\nOK\n",
            u8::from(s.random),
            u8::from(s.repeat),
            u8::from(s.single),
            u8::from(s.consume)
        ),
        "random" => {
            s.random = on;
            "OK\n".to_string()
        }
        "repeat" => {
            s.repeat = on;
            "OK\n".to_string()
        }
        "single" => {
            s.single = on;
            "OK\n".to_string()
        }
        "consume" => {
            s.consume = on;
            "OK\n".to_string()
        }
        "stats" => "artists: 1234\nalbums: 210\nsongs: 2718\nuptime: 60\nplaytime: 0\ndb_playtime: 93784\nOK\n"
            .to_string(),
        "update" | "rescan" => "updating_db: 1\nOK\n".to_string(),
        "ping" => "OK\n".to_string(),
        other => format!("ACK [5@0] {{{}}} unknown command \"{}\"\n", other, other),
    }
}

/// A localhost port with nothing listening on it.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe port");
    listener.local_addr().expect("local addr").port()
}
