//! Units of work and their measured outcomes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Sequence number of one probe; jobs are numbered `0..jobs`
pub type Job = u64;

/// Identity of a worker in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub usize);

impl WorkerId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Measured latency of a single completed probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingRecord {
    /// Wall-clock time from issuing the probe to receiving its reply
    pub elapsed: Duration,
    /// Job this probe belonged to
    pub job: Job,
    /// Worker that ran the probe
    pub worker: WorkerId,
}

impl TimingRecord {
    pub fn new(elapsed: Duration, job: Job, worker: WorkerId) -> Self {
        Self { elapsed, job, worker }
    }

    /// Elapsed time truncated to whole microseconds
    pub fn elapsed_micros(&self) -> u128 {
        self.elapsed.as_micros()
    }
}
