//! The job entity, its commands, and session-scoped access to it.
//!
//! ## Components
//!
//! - `Job`: Deferred unit of work with lease and retry bookkeeping
//! - `JobManager`: Entity access bound to the running transaction
//! - Admin commands: `CreateJobCmd`, `GetJobCmd`, `SetJobDuedateCmd`,
//!   `SetJobRetriesCmd`, `SuspendJobCmd`, `ActivateJobCmd`, `DeleteJobCmd`
//! - Scheduler commands: `FindDueJobsCmd`, `LockJobCmd`, `ExecuteJobCmd`,
//!   `FailJobCmd`

pub mod commands;
pub mod entity;
pub mod manager;

pub use commands::{
    ActivateJobCmd, CreateJobCmd, DeleteJobCmd, ExecuteJobCmd, FailJobCmd, FindDueJobsCmd,
    GetJobCmd, LockJobCmd, SetJobDuedateCmd, SetJobRetriesCmd, SuspendJobCmd,
};
pub use entity::{ExceptionInfo, Job};
pub use manager::JobManager;
