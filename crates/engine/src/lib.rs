//! `flowforge-engine` — command pipeline and job scheduling.
//!
//! The engine executes every state change as a [`command::Command`]: a unit
//! of work that runs inside its own transactional session, gets checked
//! against registered authorization [`checker`]s, commits atomically with
//! optimistic concurrency control, and announces itself on a notification
//! bus after the commit.
//!
//! On top of the pipeline sits the [`scheduler`]: background workers that
//! acquire due jobs under time-bounded leases, run their registered
//! handlers, and book success or failure back through the same commands.

pub mod checker;
pub mod command;
pub mod config;
pub mod engine;
pub mod event;
pub mod jobs;
pub mod persistence;
pub mod scheduler;

pub use checker::{CommandChecker, PermissionChecker, TenantIsolationChecker};
pub use command::{Command, CommandContext, CommandExecutor, NotificationBus};
pub use config::EngineConfig;
pub use engine::Engine;
pub use event::EngineEvent;
pub use jobs::{
    ActivateJobCmd, CreateJobCmd, DeleteJobCmd, ExceptionInfo, ExecuteJobCmd, FailJobCmd,
    FindDueJobsCmd, GetJobCmd, Job, JobManager, LockJobCmd, SetJobDuedateCmd, SetJobRetriesCmd,
    SuspendJobCmd,
};
pub use persistence::{EntityStore, InMemoryEntityStore, StoreError, WriteOp};
pub use scheduler::{
    BackoffPolicy, BackoffStrategy, ExecutorStats, HandlerRegistry, JobExecutor,
    JobExecutorConfig, JobExecutorHandle, JobHandler,
};
