//! Worker loop: dequeue, pace, probe, report

use crate::{
    client::Prober,
    error::Result,
    executor::rate_limiter::RateLimiter,
    logging::Logger,
    models::{Job, TimingRecord, WorkerId},
};
use std::{sync::Arc, time::Instant};
use tokio::sync::{mpsc, Mutex};

/// Job queue shared by every worker; closed once the last job is enqueued
pub type JobQueue = Arc<Mutex<mpsc::Receiver<Job>>>;

/// Per-job outcome sent back to the orchestrator
pub type JobResult = Result<TimingRecord>;

/// A single pool member with its own connection
pub struct Worker {
    id: WorkerId,
    jobs: JobQueue,
    results: mpsc::Sender<JobResult>,
    limiter: Arc<RateLimiter>,
    prober: Box<dyn Prober>,
    logger: Logger,
}

impl Worker {
    pub fn new(
        id: WorkerId,
        jobs: JobQueue,
        results: mpsc::Sender<JobResult>,
        limiter: Arc<RateLimiter>,
        prober: Box<dyn Prober>,
        logger: Logger,
    ) -> Self {
        Self {
            id,
            jobs,
            results,
            limiter,
            prober,
            logger,
        }
    }

    /// Run until the queue is closed and drained, or the first error.
    /// Returns the number of jobs completed.
    pub async fn run(mut self) -> u64 {
        let mut completed = 0u64;

        loop {
            let next = {
                let mut jobs = self.jobs.lock().await;
                jobs.recv().await
            };
            let Some(job) = next else { break };

            match self.execute(job).await {
                Ok(record) => {
                    if self.results.send(Ok(record)).await.is_err() {
                        // Collector stopped listening; the run is over
                        break;
                    }
                    completed += 1;
                }
                Err(e) => {
                    self.logger
                        .debug(&format!("Job {} failed: {}", job, e))
                        .error_info(&e)
                        .field("job", job)
                        .log();
                    let _ = self.results.send(Err(e)).await;
                    break;
                }
            }
        }

        self.logger
            .debug("Worker finished")
            .field("completed", completed)
            .log();
        completed
    }

    async fn execute(&mut self, job: Job) -> Result<TimingRecord> {
        self.limiter.wait().await;

        let start = Instant::now();
        self.prober.ping().await?;
        let elapsed = start.elapsed();

        Ok(TimingRecord::new(elapsed, job, self.id))
    }
}
