//! Probe client for Redis-compatible servers
//!
//! A worker owns one [`Prober`]. The RESP implementation holds a single TCP
//! connection, dials it lazily through the [`EndpointResolver`], and redials
//! transparently when it breaks, within the worker's [`RetryPolicy`].

pub mod resp;
pub mod retry;

pub use retry::RetryPolicy;

use crate::{
    dns::{ConnectionTarget, EndpointResolver},
    error::{AppError, Result},
    logging::Logger,
    models::{RunConfig, WorkerId},
};
use async_trait::async_trait;
use resp::{encode_command, read_reply, Reply};
use std::{io, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::TcpStream,
    time::{sleep, timeout},
};

/// One round-trip probe against the service under test
#[async_trait]
pub trait Prober: Send {
    /// Issue a single probe and wait for its reply
    async fn ping(&mut self) -> Result<()>;
}

/// Hands each worker its own prober
pub trait ProbeFactory: Send + Sync {
    fn prober(&self, worker: WorkerId) -> Box<dyn Prober>;
}

/// Connection settings shared by every worker's client
pub struct ClientSettings {
    pub resolver: EndpointResolver,
    pub password: Option<String>,
    pub retry: RetryPolicy,
    pub dial_timeout: Duration,
    pub read_timeout: Duration,
}

/// Creates RESP probers that share resolver and settings
pub struct RespClientFactory {
    settings: Arc<ClientSettings>,
    logger: Logger,
}

impl RespClientFactory {
    pub fn new(settings: ClientSettings, logger: Logger) -> Self {
        Self {
            settings: Arc::new(settings),
            logger,
        }
    }

    /// Build the factory from run configuration
    pub fn from_config(config: &RunConfig, resolver: EndpointResolver, logger: Logger) -> Self {
        Self::new(
            ClientSettings {
                resolver,
                password: config.password.clone(),
                retry: config.retry,
                dial_timeout: config.dial_timeout,
                read_timeout: config.read_timeout,
            },
            logger,
        )
    }
}

impl ProbeFactory for RespClientFactory {
    fn prober(&self, worker: WorkerId) -> Box<dyn Prober> {
        Box::new(RespClient {
            settings: self.settings.clone(),
            worker,
            conn: None,
            logger: self.logger.child(&format!("client-{}", worker)),
        })
    }
}

/// Outcome of one attempt; only transport failures are retried
enum AttemptError {
    Transport(io::Error),
    Fatal(AppError),
}

impl From<io::Error> for AttemptError {
    fn from(error: io::Error) -> Self {
        AttemptError::Transport(error)
    }
}

struct Connection {
    stream: BufReader<TcpStream>,
    target: ConnectionTarget,
}

/// RESP client owning at most one live connection
pub struct RespClient {
    settings: Arc<ClientSettings>,
    worker: WorkerId,
    conn: Option<Connection>,
    logger: Logger,
}

impl RespClient {
    async fn dial(&self) -> std::result::Result<Connection, AttemptError> {
        // Resolution failures are not retried
        let target = self.settings.resolver.next_target().await.map_err(AttemptError::Fatal)?;

        let stream = timeout(self.settings.dial_timeout, TcpStream::connect(target.socket_addr()))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, format!("dial {} timed out", target)))??;
        stream.set_nodelay(true)?;

        let mut conn = Connection {
            stream: BufReader::new(stream),
            target,
        };

        if let Some(password) = &self.settings.password {
            let command = encode_command(&[b"AUTH", password.as_bytes()]);
            match self.round_trip(&mut conn, &command).await? {
                Reply::Simple(_) => {}
                Reply::Error(msg) => {
                    return Err(AttemptError::Fatal(AppError::probe(format!("AUTH rejected by {}: {}", target, msg))));
                }
                other => {
                    return Err(AttemptError::Fatal(AppError::probe(format!("unexpected AUTH reply from {}: {:?}", target, other))));
                }
            }
        }

        crate::log_debug!(self.logger, "Connected to {}", target);
        Ok(conn)
    }

    async fn round_trip(&self, conn: &mut Connection, command: &[u8]) -> io::Result<Reply> {
        conn.stream.get_mut().write_all(command).await?;
        timeout(self.settings.read_timeout, read_reply(&mut conn.stream))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, format!("no reply from {}", conn.target)))?
    }

    async fn try_ping(&mut self) -> std::result::Result<(), AttemptError> {
        if self.conn.is_none() {
            self.conn = Some(self.dial().await?);
        }

        let command = encode_command(&[b"PING"]);
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => return Err(AttemptError::Fatal(AppError::internal("connection missing after dial"))),
        };
        let reply = self.round_trip(&mut conn, &command).await;
        let target = conn.target;
        // A broken connection is dropped here and redialed on the next attempt
        let reply = reply?;
        self.conn = Some(conn);

        match reply {
            Reply::Simple(_) | Reply::Bulk(Some(_)) => Ok(()),
            Reply::Error(msg) => Err(AttemptError::Fatal(AppError::probe(format!("PING failed on {}: {}", target, msg)))),
            other => Err(AttemptError::Fatal(AppError::probe(format!("unexpected PING reply from {}: {:?}", target, other)))),
        }
    }
}

#[async_trait]
impl Prober for RespClient {
    async fn ping(&mut self) -> Result<()> {
        let policy = self.settings.retry;
        let mut retry = 0u32;

        loop {
            match self.try_ping().await {
                Ok(()) => return Ok(()),
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Transport(e)) => {
                    self.conn = None;
                    if retry >= policy.max_retries {
                        return Err(AppError::connection(format!(
                            "worker {} gave up on {}:{} after {} retries: {}",
                            self.worker,
                            self.settings.resolver.host(),
                            self.settings.resolver.port(),
                            retry,
                            e
                        )));
                    }

                    let delay = policy.backoff(retry, &mut rand::rng());
                    self.logger
                        .debug("Connection failed, retrying")
                        .field("retry", retry + 1)
                        .field("delay_us", delay.as_micros() as u64)
                        .field("error", e.to_string())
                        .log();
                    sleep(delay).await;
                    retry += 1;
                }
            }
        }
    }
}
