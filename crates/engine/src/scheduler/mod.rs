//! Scheduled job execution.
//!
//! The scheduler drives jobs that the admin commands in [`crate::jobs`]
//! create: a pool of worker threads polls for due work, acquires each job
//! under a lease, runs its registered handler, and books the outcome back
//! through the same command pipeline every other mutation goes through.
//!
//! ## Components
//!
//! - `JobExecutor`: Worker pool running the acquire/execute/book cycle
//! - `JobHandler` / `HandlerRegistry`: Job bodies keyed by handler type
//! - `BackoffPolicy`: Failure-count-based retry delays

pub mod backoff;
pub mod executor;
pub mod handler;

pub use backoff::{BackoffPolicy, BackoffStrategy};
pub use executor::{ExecutorStats, JobExecutor, JobExecutorConfig, JobExecutorHandle};
pub use handler::{HandlerRegistry, JobHandler};
