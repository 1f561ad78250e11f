//! Run orchestration: INIT → DISPATCH → COLLECT → DONE

use crate::{
    client::ProbeFactory,
    error::{AppError, Result},
    executor::{JobResult, RateLimiter, WorkerPool},
    log_warn,
    logging::Logger,
    models::{Job, RunConfig},
    output::ResultCollector,
};
use serde::Serialize;
use std::{
    io::Write,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{mpsc, Mutex};

/// Stage of a benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    Init,
    Dispatch,
    Collect,
    Done,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub jobs_completed: u64,
    pub workers: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Achieved probe rate over the whole run
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.jobs_completed as f64 / secs
        } else {
            0.0
        }
    }
}

/// Wires queue, workers, limiter and collector together for one run
pub struct Orchestrator {
    config: Arc<RunConfig>,
    factory: Arc<dyn ProbeFactory>,
    logger: Logger,
    phase: RunPhase,
}

impl Orchestrator {
    pub fn new(config: RunConfig, factory: Arc<dyn ProbeFactory>, logger: Logger) -> Self {
        Self {
            config: Arc::new(config),
            factory,
            logger,
            phase: RunPhase::Init,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn enter(&mut self, phase: RunPhase) {
        self.phase = phase;
        self.logger.debug("Run phase").field("phase", phase).log();
    }

    /// Run every job and write one row per result to `sink`
    ///
    /// The first error from any worker ends the run: remaining workers are
    /// aborted, rows collected so far are flushed, and the error is returned.
    pub async fn run<W: Write>(&mut self, sink: W) -> Result<RunSummary> {
        let started = Instant::now();
        let jobs: Job = self.config.jobs;
        let workers = self.config.workers;

        // INIT
        self.enter(RunPhase::Init);
        let limiter = Arc::new(RateLimiter::new(self.config.rate_limit)?);
        let mut collector = ResultCollector::new(sink)?;
        let capacity = usize::try_from(jobs)
            .map_err(|_| AppError::config(format!("{} jobs do not fit in memory on this platform", jobs)))?
            .max(1);
        let (job_tx, job_rx) = mpsc::channel::<Job>(capacity);
        let (result_tx, mut result_rx) = mpsc::channel::<JobResult>(capacity);

        self.logger
            .info("Starting run")
            .field("server", self.config.server_address())
            .field("jobs", jobs)
            .field("clients", workers)
            .field("rate_limit", limiter.rate())
            .field("spacing_us", limiter.period().as_micros() as u64)
            .log();

        // DISPATCH
        self.enter(RunPhase::Dispatch);
        let mut pool = WorkerPool::spawn(
            workers,
            Arc::new(Mutex::new(job_rx)),
            &result_tx,
            limiter,
            self.factory.as_ref(),
            &self.logger,
        );
        // Only workers hold senders from here on
        drop(result_tx);
        self.logger.debug("Workers started").field("workers", pool.size()).log();

        for job in 0..jobs {
            if job_tx.send(job).await.is_err() {
                // Every worker has exited; the reason is waiting in the result channel
                break;
            }
        }
        drop(job_tx);

        // COLLECT
        self.enter(RunPhase::Collect);
        for received in 0..jobs {
            let outcome = match result_rx.recv().await {
                Some(Ok(record)) => collector.record(&record),
                Some(Err(e)) => Err(e),
                None => Err(AppError::internal(format!(
                    "workers exited after {} of {} results",
                    received, jobs
                ))),
            };

            if let Err(e) = outcome {
                pool.abort();
                if let Err(flush_error) = collector.finish() {
                    log_warn!(self.logger, "Partial results could not be flushed: {}", flush_error);
                }
                return Err(e);
            }
        }

        // DONE
        self.enter(RunPhase::Done);
        let rows = collector.rows();
        collector.finish()?;
        let completed = pool.join().await?;
        if completed != rows {
            return Err(AppError::internal(format!(
                "workers reported {} completed jobs but {} rows were written",
                completed, rows
            )));
        }

        let summary = RunSummary {
            jobs_completed: rows,
            workers,
            elapsed: started.elapsed(),
        };
        self.logger
            .info("Run complete")
            .field("jobs", summary.jobs_completed)
            .field("elapsed_ms", summary.elapsed.as_millis() as u64)
            .field("ops_per_sec", (summary.throughput() * 10.0).round() / 10.0)
            .log();

        Ok(summary)
    }
}
