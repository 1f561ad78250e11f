//! Command-line interface

use crate::logging::{LogFormat, LogLevel};
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

/// KV Latency Tester - measure PING round-trip latency of a Redis-compatible server
#[derive(Parser, Debug, Clone)]
#[command(name = "klt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Server hostname or IP address
    #[arg(short = 's', long, env = "REDIS_SERVER", default_value = crate::defaults::DEFAULT_HOST)]
    pub redis_host: String,

    /// Server port
    #[arg(short = 'p', long, env = "REDIS_PORT", default_value_t = crate::defaults::DEFAULT_PORT)]
    pub redis_port: u16,

    /// Password for AUTH; empty disables authentication
    #[arg(short = 'a', long, env = "REDIS_PASSWORD", default_value = "", hide_env_values = true, hide_default_value = true)]
    pub redis_password: String,

    /// Number of PING probes to issue
    #[arg(short = 'w', long, env = "REDIS_WRITES", default_value_t = crate::defaults::DEFAULT_JOB_COUNT)]
    pub writes: u64,

    /// Number of concurrent clients
    #[arg(short = 'c', long, env = "REDIS_CLIENTS", value_parser = parse_positive::<usize>,
          default_value_t = crate::defaults::DEFAULT_WORKER_COUNT)]
    pub clients: usize,

    /// Aggregate probes per second across all clients
    #[arg(short = 'r', long, env = "REDIS_RATE_LIMIT", value_parser = parse_positive::<u32>,
          default_value_t = crate::defaults::DEFAULT_RATE_LIMIT)]
    pub rate_limit: u32,

    /// Log file (appended to); logs go to the console when unset
    #[arg(short = 'l', long, env = "REDIS_LOGFILE")]
    pub logfile: Option<PathBuf>,

    /// CSV file for per-probe latencies
    #[arg(short = 'o', long, env = "REDIS_OUTFILE", default_value = crate::defaults::DEFAULT_OUT_FILE)]
    pub out_file: PathBuf,

    /// Smallest delay before reconnecting, in milliseconds
    #[arg(long, default_value_t = crate::defaults::DEFAULT_MIN_RETRY_BACKOFF.as_millis() as u64)]
    pub min_retry_backoff_ms: u64,

    /// Largest delay before reconnecting, in milliseconds
    #[arg(long, default_value_t = crate::defaults::DEFAULT_MAX_RETRY_BACKOFF.as_millis() as u64)]
    pub max_retry_backoff_ms: u64,

    /// Reconnect attempts per probe before giving up
    #[arg(long, default_value_t = crate::defaults::DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// TCP connect timeout, in milliseconds
    #[arg(long, value_parser = parse_positive::<u64>,
          default_value_t = crate::defaults::DEFAULT_DIAL_TIMEOUT.as_millis() as u64)]
    pub dial_timeout_ms: u64,

    /// Reply timeout, in milliseconds
    #[arg(long, value_parser = parse_positive::<u64>,
          default_value_t = crate::defaults::DEFAULT_READ_TIMEOUT.as_millis() as u64)]
    pub read_timeout_ms: u64,

    /// Minimum log level (trace, debug, info, warn, error, fatal)
    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format (console, json, compact)
    #[arg(long, default_value = "console")]
    pub log_format: LogFormat,
}

impl Cli {
    /// Password to send with AUTH, if any
    pub fn password(&self) -> Option<&str> {
        if self.redis_password.is_empty() {
            None
        } else {
            Some(self.redis_password.as_str())
        }
    }

    /// Check argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.min_retry_backoff_ms > self.max_retry_backoff_ms {
            return Err(format!(
                "--min-retry-backoff-ms ({}) cannot exceed --max-retry-backoff-ms ({})",
                self.min_retry_backoff_ms, self.max_retry_backoff_ms
            ));
        }

        if self.redis_host.trim().is_empty() {
            return Err("--redis-host cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Parse a strictly positive decimal number
fn parse_positive<T>(s: &str) -> Result<T, String>
where
    T: FromStr + Default + PartialEq,
{
    // Reject forms `str::parse` would accept but an operator would not type
    if s.starts_with('+') {
        return Err(format!("Invalid number: {}", s));
    }

    let value = s.parse::<T>().map_err(|_| format!("Invalid number: {}", s))?;
    if value == T::default() {
        return Err("Value must be greater than 0".to_string());
    }
    Ok(value)
}

/// Serializes tests that read or write the REDIS_* environment
#[cfg(test)]
pub(crate) mod test_env {
    use std::sync::{Mutex, MutexGuard};

    pub const VARS: [&str; 8] = [
        "REDIS_SERVER",
        "REDIS_PORT",
        "REDIS_PASSWORD",
        "REDIS_WRITES",
        "REDIS_CLIENTS",
        "REDIS_RATE_LIMIT",
        "REDIS_LOGFILE",
        "REDIS_OUTFILE",
    ];

    static LOCK: Mutex<()> = Mutex::new(());

    /// Take the lock and clear every variable
    pub fn clean() -> MutexGuard<'static, ()> {
        let guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear();
        guard
    }

    pub fn clear() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }
}
