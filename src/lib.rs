//! KV Latency Tester
//!
//! A latency benchmark for Redis-compatible key-value services. A fixed pool
//! of workers issues `PING` probes at a globally limited rate, spreading
//! connections across every address the server hostname resolves to, and the
//! per-probe latency is written to a CSV file for offline analysis.

pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod dns;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;

// Re-export commonly used types
pub use app::{Orchestrator, RunPhase, RunSummary};
pub use error::{AppError, Result};
pub use models::{Job, RunConfig, TimingRecord, WorkerId};
pub use output::ResultCollector;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_HOST: &str = "localhost";
    pub const DEFAULT_PORT: u16 = 6379;
    pub const DEFAULT_JOB_COUNT: u64 = 100_000;
    pub const DEFAULT_WORKER_COUNT: usize = 10;
    pub const DEFAULT_RATE_LIMIT: u32 = 1000;
    pub const DEFAULT_OUT_FILE: &str = "results.csv";

    /// Upper bound on jobs per run; the queue is sized to hold every job
    pub const MAX_JOB_COUNT: u64 = 100_000_000;

    // Reconnect envelope, one per worker connection
    pub const DEFAULT_MIN_RETRY_BACKOFF: Duration = Duration::from_millis(1);
    pub const DEFAULT_MAX_RETRY_BACKOFF: Duration = Duration::from_millis(50);
    pub const DEFAULT_MAX_RETRIES: u32 = 1000;

    pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);
}
