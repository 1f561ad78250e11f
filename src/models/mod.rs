//! Data models and structures for the latency tester

pub mod config;
pub mod record;

// Re-export main model types
pub use config::RunConfig;
pub use record::{Job, TimingRecord, WorkerId};
