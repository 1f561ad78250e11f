//! Hostname resolution and endpoint selection
//!
//! Every new connection re-resolves the server hostname, orders the answer
//! deterministically and picks one address uniformly at random. Nothing is
//! cached, so connections spread over every address the name currently maps
//! to, and membership changes are picked up by the next dial.

use crate::{
    error::{AppError, Result},
    logging::Logger,
};
use async_trait::async_trait;
use rand::Rng;
use std::{
    fmt,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use trust_dns_resolver::{
    config::{ResolverConfig, ResolverOpts},
    system_conf,
    TokioAsyncResolver,
};

/// Source of address records for a hostname
#[async_trait]
pub trait HostLookup: Send + Sync {
    /// Return every address currently associated with `host`
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// Lookup through the system's DNS configuration
pub struct SystemLookup {
    resolver: TokioAsyncResolver,
}

impl SystemLookup {
    /// Build a resolver from the system configuration, falling back to the
    /// resolver library defaults when none can be read
    pub fn new() -> Self {
        let (config, opts) = system_conf::read_system_conf()
            .unwrap_or_else(|_| (ResolverConfig::default(), ResolverOpts::default()));

        Self {
            resolver: TokioAsyncResolver::tokio(config, uncached(opts)),
        }
    }
}

/// Disable the resolver's answer cache so every lookup hits DNS
fn uncached(mut opts: ResolverOpts) -> ResolverOpts {
    opts.cache_size = 0;
    opts
}

impl Default for SystemLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostLookup for SystemLookup {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let response = self.resolver.lookup_ip(host).await
            .map_err(|e| AppError::dns_resolution(format!("Failed to resolve {}: {}", host, e)))?;

        Ok(response.iter().collect())
    }
}

/// One address and port to dial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub ip: IpAddr,
    pub port: u16,
}

impl ConnectionTarget {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

/// Picks the endpoint for each new connection
pub struct EndpointResolver {
    lookup: Arc<dyn HostLookup>,
    host: String,
    port: u16,
    logger: Logger,
}

impl EndpointResolver {
    pub fn new(lookup: Arc<dyn HostLookup>, host: impl Into<String>, port: u16, logger: Logger) -> Self {
        Self {
            lookup,
            host: host.into(),
            port,
            logger,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolve the hostname into a sorted, duplicate-free address list
    ///
    /// Resolver libraries do not promise a stable answer order, so the list is
    /// sorted to give every index a fixed meaning for a given answer set.
    pub async fn resolve(&self) -> Result<Vec<IpAddr>> {
        let mut addrs = self.lookup.lookup(&self.host).await?;
        addrs.sort_unstable();
        addrs.dedup();

        if addrs.is_empty() {
            return Err(AppError::dns_resolution(format!(
                "{} resolved to no addresses",
                self.host
            )));
        }

        Ok(addrs)
    }

    /// Uniformly pick one address by index
    pub fn select<R: Rng + ?Sized>(addrs: &[IpAddr], rng: &mut R) -> Option<IpAddr> {
        if addrs.is_empty() {
            return None;
        }
        Some(addrs[rng.random_range(0..addrs.len())])
    }

    /// Resolve afresh and pick the endpoint for the next dial
    pub async fn next_target(&self) -> Result<ConnectionTarget> {
        let addrs = self.resolve().await?;

        let ip = Self::select(&addrs, &mut rand::rng())
            .ok_or_else(|| AppError::dns_resolution(format!("{} resolved to no addresses", self.host)))?;
        let target = ConnectionTarget { ip, port: self.port };

        self.logger
            .info(&format!("Dialing: {}", target))
            .field("candidates", addrs.len())
            .log();

        Ok(target)
    }
}
