//! Threaded job executor.

use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use flowforge_core::{EngineError, JobId};
use flowforge_events::{EventBus, Subscription};

use super::backoff::BackoffPolicy;
use super::handler::HandlerRegistry;
use crate::command::{CommandExecutor, NotificationBus};
use crate::event::EngineEvent;
use crate::jobs::commands::{ExecuteJobCmd, FailJobCmd, FindDueJobsCmd, LockJobCmd};
use crate::jobs::entity::{ExceptionInfo, Job};

/// Job executor configuration.
#[derive(Debug, Clone)]
pub struct JobExecutorConfig {
    /// Number of worker threads
    pub worker_count: usize,
    /// How long an idle worker waits for a wake-up hint before polling anyway
    pub poll_interval: Duration,
    /// How long an acquired job stays leased
    pub lock_duration: Duration,
    /// Acquisition batch size per cycle
    pub max_jobs_per_cycle: usize,
    /// Delay curve for failed jobs
    pub backoff: BackoffPolicy,
    /// Name prefix for worker threads and logging
    pub name: String,
}

impl Default for JobExecutorConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            poll_interval: Duration::from_millis(500),
            lock_duration: Duration::from_secs(300),
            max_jobs_per_cycle: 3,
            backoff: BackoffPolicy::default(),
            name: "flowforge-worker".to_string(),
        }
    }
}

impl JobExecutorConfig {
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_lock_duration(mut self, duration: Duration) -> Self {
        self.lock_duration = duration;
        self
    }

    pub fn with_max_jobs_per_cycle(mut self, max: usize) -> Self {
        self.max_jobs_per_cycle = max;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Executor runtime statistics, accumulated across all workers.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ExecutorStats {
    pub cycles: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub jobs_exhausted: u64,
    pub lease_conflicts: u64,
}

/// Handle to control a running executor.
#[derive(Debug)]
pub struct JobExecutorHandle {
    workers: Vec<(mpsc::Sender<()>, thread::JoinHandle<()>)>,
    stats: Arc<Mutex<ExecutorStats>>,
}

impl JobExecutorHandle {
    /// Request graceful shutdown of every worker and wait for them.
    ///
    /// A worker finishes the job it is currently executing; acquired but
    /// unstarted jobs stay leased until their lease expires.
    pub fn shutdown(self) {
        for (tx, _) in &self.workers {
            let _ = tx.send(());
        }
        for (_, join) in self.workers {
            let _ = join.join();
        }
    }

    /// Get current executor statistics.
    pub fn stats(&self) -> ExecutorStats {
        self.stats.lock().unwrap().clone()
    }
}

/// Background job executor.
///
/// Runs a pool of worker threads, each repeating the acquire/execute/book
/// cycle. Workers never bypass the command pipeline, so every guarantee it
/// gives (atomic commits, lease re-validation, post-commit notifications)
/// holds for scheduled work too.
pub struct JobExecutor {
    executor: Arc<CommandExecutor>,
    bus: Arc<NotificationBus>,
    handlers: Arc<HandlerRegistry>,
    config: JobExecutorConfig,
}

impl JobExecutor {
    pub(crate) fn new(
        executor: Arc<CommandExecutor>,
        bus: Arc<NotificationBus>,
        handlers: Arc<HandlerRegistry>,
        config: JobExecutorConfig,
    ) -> Self {
        Self {
            executor,
            bus,
            handlers,
            config,
        }
    }

    /// Spawn the worker threads.
    pub fn start(self) -> JobExecutorHandle {
        let stats = Arc::new(Mutex::new(ExecutorStats::default()));
        let mut workers = Vec::with_capacity(self.config.worker_count);

        for index in 0..self.config.worker_count {
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
            let name = format!("{}-{index}", self.config.name);
            let worker = Worker {
                // Unique per start, so a worker restarted under the same name
                // never mistakes a predecessor's lease for its own.
                owner: format!("{name}-{}", Uuid::now_v7()),
                name: name.clone(),
                executor: self.executor.clone(),
                handlers: self.handlers.clone(),
                config: self.config.clone(),
                stats: stats.clone(),
                wake: self.bus.subscribe(),
            };

            let join = thread::Builder::new()
                .name(name)
                .spawn(move || worker.run(shutdown_rx))
                .expect("failed to spawn job executor worker thread");

            workers.push((shutdown_tx, join));
        }

        JobExecutorHandle { workers, stats }
    }
}

struct Worker {
    name: String,
    owner: String,
    executor: Arc<CommandExecutor>,
    handlers: Arc<HandlerRegistry>,
    config: JobExecutorConfig,
    stats: Arc<Mutex<ExecutorStats>>,
    wake: Subscription<EngineEvent>,
}

impl Worker {
    fn run(self, shutdown_rx: mpsc::Receiver<()>) {
        info!(worker = %self.name, "job worker started");

        'outer: loop {
            // Shutdown check (non-blocking)
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            {
                let mut s = self.stats.lock().unwrap();
                s.cycles += 1;
            }

            let due = match self
                .executor
                .execute(&FindDueJobsCmd::new(Utc::now(), self.config.max_jobs_per_cycle))
            {
                Ok(due) => due,
                Err(e) => {
                    error!(worker = %self.name, error = %e, "failed to query due jobs");
                    thread::sleep(self.config.poll_interval);
                    continue;
                }
            };

            if due.is_empty() {
                self.idle();
                continue;
            }

            for job in due {
                if shutdown_rx.try_recv().is_ok() {
                    break 'outer;
                }
                self.process(job);
            }
        }

        info!(worker = %self.name, "job worker stopped");
    }

    /// Wait out the poll interval, cutting it short if a notification
    /// arrives.
    fn idle(&self) {
        // Hints that piled up while we were busy describe work the query
        // above already saw; drain them so the wait only reacts to news.
        while self.wake.try_recv().is_ok() {}

        match self.wake.recv_timeout(self.config.poll_interval) {
            Ok(_) | Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => thread::sleep(self.config.poll_interval),
        }
    }

    fn process(&self, job: Job) {
        let now = Utc::now();
        let lock_until =
            now + chrono::Duration::from_std(self.config.lock_duration).unwrap_or_default();

        let acquired = match self.executor.execute(&LockJobCmd::new(
            job.id,
            self.owner.as_str(),
            now,
            lock_until,
        )) {
            Ok(acquired) => acquired,
            Err(e) => {
                error!(worker = %self.name, job_id = %job.id, error = %e, "failed to lock job");
                return;
            }
        };

        if !acquired {
            debug!(worker = %self.name, job_id = %job.id, "job taken by another worker");
            self.stats.lock().unwrap().lease_conflicts += 1;
            return;
        }

        debug!(
            worker = %self.name,
            job_id = %job.id,
            handler_type = %job.handler_type,
            "executing job"
        );

        match self.executor.execute(&ExecuteJobCmd::new(
            job.id,
            self.owner.as_str(),
            Utc::now(),
            self.handlers.clone(),
        )) {
            Ok(()) => {
                debug!(worker = %self.name, job_id = %job.id, "job completed");
                self.stats.lock().unwrap().jobs_succeeded += 1;
            }
            Err(EngineError::Execution { message, detail }) => {
                warn!(worker = %self.name, job_id = %job.id, error = %message, "job execution failed");
                self.book_failure(job.id, ExceptionInfo::new(message, detail));
            }
            Err(e) => {
                // Lease lost or job deleted between lock and execute.
                debug!(worker = %self.name, job_id = %job.id, error = %e, "job no longer executable");
                self.stats.lock().unwrap().lease_conflicts += 1;
            }
        }
    }

    fn book_failure(&self, job_id: JobId, exception: ExceptionInfo) {
        let cmd = FailJobCmd::new(job_id, exception, Utc::now(), self.config.backoff.clone());
        match self.executor.execute(&cmd) {
            Ok(0) => {
                warn!(worker = %self.name, job_id = %job_id, "job exhausted its retries");
                let mut s = self.stats.lock().unwrap();
                s.jobs_failed += 1;
                s.jobs_exhausted += 1;
            }
            Ok(remaining) => {
                debug!(
                    worker = %self.name,
                    job_id = %job_id,
                    retries_remaining = remaining,
                    "job retry scheduled"
                );
                self.stats.lock().unwrap().jobs_failed += 1;
            }
            Err(e) => {
                // Bookkeeping failed; the lease will expire and another
                // worker will pick the job up again.
                error!(worker = %self.name, job_id = %job_id, error = %e, "failed to book job failure");
                self.stats.lock().unwrap().jobs_failed += 1;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
