//! Run configuration data model and validation

use crate::client::RetryPolicy;
use crate::error::{AppError, Result};
use crate::logging::{LogFormat, LogLevel};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Everything a benchmark run needs, fixed before the first worker starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Hostname (or IP literal) of the server under test
    pub host: String,

    /// Server TCP port
    pub port: u16,

    /// Password sent with AUTH on every new connection
    #[serde(default)]
    pub password: Option<String>,

    /// Number of concurrent workers
    pub workers: usize,

    /// Total number of probes
    pub jobs: u64,

    /// Aggregate probes per second across all workers
    pub rate_limit: u32,

    /// Log destination; `None` logs to the console
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// CSV result destination
    pub out_file: PathBuf,

    /// Reconnect envelope for each worker's connection
    pub retry: RetryPolicy,

    /// Limit on a single TCP connect
    pub dial_timeout: Duration,

    /// Limit on waiting for a single reply
    pub read_timeout: Duration,

    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        use crate::defaults::*;

        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: None,
            workers: DEFAULT_WORKER_COUNT,
            jobs: DEFAULT_JOB_COUNT,
            rate_limit: DEFAULT_RATE_LIMIT,
            log_file: None,
            out_file: PathBuf::from(DEFAULT_OUT_FILE),
            retry: RetryPolicy::default(),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            log_level: LogLevel::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl RunConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// `host:port` as given, before resolution
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(AppError::config("Server host cannot be empty"));
        }

        if self.port == 0 {
            return Err(AppError::config("Server port must be greater than 0"));
        }

        if self.workers == 0 {
            return Err(AppError::config("Client count must be at least 1"));
        }

        if self.jobs > crate::defaults::MAX_JOB_COUNT {
            return Err(AppError::config(format!(
                "Write count {} exceeds the maximum of {}",
                self.jobs,
                crate::defaults::MAX_JOB_COUNT
            )));
        }

        if self.rate_limit == 0 {
            return Err(AppError::config("Rate limit must be at least 1 operation per second"));
        }

        if self.out_file.as_os_str().is_empty() {
            return Err(AppError::config("Output file path cannot be empty"));
        }

        if self.dial_timeout.is_zero() {
            return Err(AppError::config("Dial timeout must be greater than 0"));
        }

        if self.read_timeout.is_zero() {
            return Err(AppError::config("Read timeout must be greater than 0"));
        }

        self.retry.validate()?;

        Ok(())
    }

    /// Human readable summary for debug logging; never prints the password
    pub fn display_summary(&self) -> String {
        let mut summary = Vec::new();

        summary.push(format!("Server: {}", self.server_address()));
        summary.push(format!("Auth: {}", if self.password.is_some() { "enabled" } else { "disabled" }));
        summary.push(format!("Jobs: {}", self.jobs));
        summary.push(format!("Clients: {}", self.workers));
        summary.push(format!("Rate limit: {}/s", self.rate_limit));
        summary.push(format!(
            "Retry backoff: {}ms..{}ms, max {} retries",
            self.retry.min_backoff.as_millis(),
            self.retry.max_backoff.as_millis(),
            self.retry.max_retries
        ));
        summary.push(format!("Output: {}", self.out_file.display()));
        summary.push(format!(
            "Log: {}",
            self.log_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "console".to_string())
        ));

        summary.join("\n")
    }
}
