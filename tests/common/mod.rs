//! Shared helpers for binary-level tests: a loopback RESP server and a
//! command builder isolated from the caller's environment.

#![allow(dead_code)]

use assert_cmd::prelude::*;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// How the mock server answers
#[derive(Clone, Debug)]
pub enum Behaviour {
    /// PONG to every PING
    Healthy,
    /// Require AUTH with this password before answering PING
    RequirePassword(String),
    /// `-ERR` to every PING
    FailPings,
}

/// RESP server on 127.0.0.1 running on its own runtime thread
pub struct MockServer {
    pub port: u16,
    pings: Arc<AtomicU64>,
    connections: Arc<AtomicU64>,
}

impl MockServer {
    pub fn start(behaviour: Behaviour) -> Self {
        let pings = Arc::new(AtomicU64::new(0));
        let connections = Arc::new(AtomicU64::new(0));
        let (port_tx, port_rx) = std::sync::mpsc::channel();

        let server_pings = pings.clone();
        let server_connections = connections.clone();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async move {
                let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                port_tx.send(listener.local_addr().unwrap().port()).unwrap();

                loop {
                    let Ok((socket, _)) = listener.accept().await else { continue };
                    server_connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve(socket, behaviour.clone(), server_pings.clone()));
                }
            });
        });

        let port = port_rx.recv().unwrap();
        Self { port, pings, connections }
    }

    /// PINGs answered with PONG so far
    pub fn pings(&self) -> u64 {
        self.pings.load(Ordering::SeqCst)
    }

    pub fn connections(&self) -> u64 {
        self.connections.load(Ordering::SeqCst)
    }
}

async fn serve(socket: TcpStream, behaviour: Behaviour, pings: Arc<AtomicU64>) {
    let (read, mut write) = socket.into_split();
    let mut reader = BufReader::new(read);
    let mut authenticated = !matches!(behaviour, Behaviour::RequirePassword(_));

    while let Some(command) = read_command(&mut reader).await {
        let verb = command.first().map(|v| v.to_ascii_uppercase()).unwrap_or_default();
        let reply: &[u8] = match (verb.as_str(), &behaviour) {
            ("AUTH", Behaviour::RequirePassword(expected)) => {
                if command.get(1) == Some(expected) {
                    authenticated = true;
                    b"+OK\r\n"
                } else {
                    b"-WRONGPASS invalid username-password pair\r\n"
                }
            }
            ("AUTH", _) => b"-ERR AUTH called without any password configured\r\n",
            ("PING", Behaviour::FailPings) => b"-ERR server is shutting down\r\n",
            ("PING", _) if !authenticated => b"-NOAUTH Authentication required.\r\n",
            ("PING", _) => {
                pings.fetch_add(1, Ordering::SeqCst);
                b"+PONG\r\n"
            }
            _ => b"-ERR unknown command\r\n",
        };

        if write.write_all(reply).await.is_err() {
            return;
        }
    }
}

/// Read one `*N` array of bulk strings; `None` on EOF or garbage
async fn read_command<R: AsyncBufReadExt + AsyncReadExt + Unpin>(reader: &mut R) -> Option<Vec<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await.ok()?;
        let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;

        let mut data = vec![0u8; len + 2];
        reader.read_exact(&mut data).await.ok()?;
        data.truncate(len);
        args.push(String::from_utf8(data).ok()?);
    }
    Some(args)
}

/// A port on 127.0.0.1 with nothing listening
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// The binary, run from `dir` with no REDIS_* variables inherited
pub fn klt(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("klt").unwrap();
    cmd.current_dir(dir);
    for var in [
        "REDIS_SERVER",
        "REDIS_PORT",
        "REDIS_PASSWORD",
        "REDIS_WRITES",
        "REDIS_CLIENTS",
        "REDIS_RATE_LIMIT",
        "REDIS_LOGFILE",
        "REDIS_OUTFILE",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Lines of a result file
pub fn csv_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}
