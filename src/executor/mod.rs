//! Concurrent probe execution
//!
//! This module contains:
//! - The global rate limiter every worker paces through
//! - The worker loop (dequeue, pace, probe, report)
//! - The pool that runs a fixed number of workers as parallel tasks

pub mod rate_limiter;
pub mod worker;

pub use rate_limiter::RateLimiter;
pub use worker::{JobQueue, JobResult, Worker};

use crate::{
    client::ProbeFactory,
    error::{AppError, Result},
    logging::Logger,
    models::WorkerId,
};
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinSet};

/// Fixed-size set of running workers
///
/// Dropping the pool aborts any worker still running.
pub struct WorkerPool {
    tasks: JoinSet<u64>,
    size: usize,
}

impl WorkerPool {
    /// Start `size` workers, each with its own prober from `factory`
    pub fn spawn(
        size: usize,
        jobs: JobQueue,
        results: &mpsc::Sender<JobResult>,
        limiter: Arc<RateLimiter>,
        factory: &dyn ProbeFactory,
        logger: &Logger,
    ) -> Self {
        let mut tasks = JoinSet::new();

        for index in 0..size {
            let id = WorkerId(index);
            let worker = Worker::new(
                id,
                jobs.clone(),
                results.clone(),
                limiter.clone(),
                factory.prober(id),
                logger.child(&format!("worker-{}", index)),
            );
            tasks.spawn(worker.run());
        }

        Self { tasks, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Stop every worker that is still running
    pub fn abort(&mut self) {
        self.tasks.abort_all();
    }

    /// Wait for all workers to exit; returns the total jobs they completed
    pub async fn join(mut self) -> Result<u64> {
        let mut completed = 0;
        while let Some(joined) = self.tasks.join_next().await {
            completed += joined.map_err(|e| AppError::internal(format!("worker task failed: {}", e)))?;
        }
        Ok(completed)
    }
}
