//! Job commands: the administrative surface plus the scheduler-facing
//! acquisition/execution/failure commands.
//!
//! Mutating admin commands follow the same shape: load the job (missing
//! entities surface before authorization), run the capability check, then
//! mutate through the session.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use flowforge_core::{EngineError, EngineResult, ExecutionId, JobId, ProcessDefinitionId, TenantId};

use super::entity::{ExceptionInfo, Job};
use crate::command::{Command, CommandContext};
use crate::event::EngineEvent;
use crate::scheduler::backoff::BackoffPolicy;
use crate::scheduler::handler::HandlerRegistry;

fn parse_job_id(raw: &str) -> EngineResult<JobId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(EngineError::invalid_argument("job id must not be empty"));
    }
    raw.parse()
}

/// Fetch a job by ID.
#[derive(Debug)]
pub struct GetJobCmd {
    job_id: JobId,
}

impl GetJobCmd {
    pub fn new(job_id: &str) -> EngineResult<Self> {
        Ok(Self::from_id(parse_job_id(job_id)?))
    }

    pub fn from_id(job_id: JobId) -> Self {
        Self { job_id }
    }
}

impl Command for GetJobCmd {
    type Output = Job;

    fn name(&self) -> &'static str {
        "get-job"
    }

    fn execute(&self, ctx: &mut CommandContext) -> EngineResult<Job> {
        let job = ctx.job_manager().require_job(self.job_id)?;
        ctx.check_authorized(|checker, principal| checker.check_read_job(principal, &job))?;
        Ok(job)
    }
}

/// Move a job's due date, or clear it to make the job immediately due.
pub struct SetJobDuedateCmd {
    job_id: JobId,
    due_date: Option<DateTime<Utc>>,
}

impl SetJobDuedateCmd {
    pub fn new(job_id: &str, due_date: Option<DateTime<Utc>>) -> EngineResult<Self> {
        Ok(Self::from_id(parse_job_id(job_id)?, due_date))
    }

    pub fn from_id(job_id: JobId, due_date: Option<DateTime<Utc>>) -> Self {
        Self { job_id, due_date }
    }
}

impl Command for SetJobDuedateCmd {
    type Output = ();

    fn name(&self) -> &'static str {
        "set-job-duedate"
    }

    fn execute(&self, ctx: &mut CommandContext) -> EngineResult<()> {
        let job = ctx.job_manager().require_job(self.job_id)?;
        ctx.check_authorized(|checker, principal| checker.check_update_job(principal, &job))?;
        ctx.job_manager().set_duedate(self.job_id, self.due_date)?;
        Ok(())
    }
}

/// Reset a job's retry budget.
///
/// Setting a positive value on an exhausted job puts it back in circulation;
/// its recorded failure count keeps it on the long end of the backoff curve.
pub struct SetJobRetriesCmd {
    job_id: JobId,
    retries: u32,
}

impl SetJobRetriesCmd {
    pub fn new(job_id: &str, retries: u32) -> EngineResult<Self> {
        Ok(Self::from_id(parse_job_id(job_id)?, retries))
    }

    pub fn from_id(job_id: JobId, retries: u32) -> Self {
        Self { job_id, retries }
    }
}

impl Command for SetJobRetriesCmd {
    type Output = ();

    fn name(&self) -> &'static str {
        "set-job-retries"
    }

    fn execute(&self, ctx: &mut CommandContext) -> EngineResult<()> {
        let job = ctx.job_manager().require_job(self.job_id)?;
        ctx.check_authorized(|checker, principal| checker.check_update_job(principal, &job))?;
        ctx.job_manager().set_retries(self.job_id, self.retries)?;
        Ok(())
    }
}

/// Take a job out of circulation without touching its other state.
pub struct SuspendJobCmd {
    job_id: JobId,
}

impl SuspendJobCmd {
    pub fn new(job_id: &str) -> EngineResult<Self> {
        Ok(Self::from_id(parse_job_id(job_id)?))
    }

    pub fn from_id(job_id: JobId) -> Self {
        Self { job_id }
    }
}

impl Command for SuspendJobCmd {
    type Output = ();

    fn name(&self) -> &'static str {
        "suspend-job"
    }

    fn execute(&self, ctx: &mut CommandContext) -> EngineResult<()> {
        let job = ctx.job_manager().require_job(self.job_id)?;
        ctx.check_authorized(|checker, principal| checker.check_update_job(principal, &job))?;
        ctx.job_manager().set_suspended(self.job_id, true)?;
        Ok(())
    }
}

/// Put a suspended job back in circulation.
pub struct ActivateJobCmd {
    job_id: JobId,
}

impl ActivateJobCmd {
    pub fn new(job_id: &str) -> EngineResult<Self> {
        Ok(Self::from_id(parse_job_id(job_id)?))
    }

    pub fn from_id(job_id: JobId) -> Self {
        Self { job_id }
    }
}

impl Command for ActivateJobCmd {
    type Output = ();

    fn name(&self) -> &'static str {
        "activate-job"
    }

    fn execute(&self, ctx: &mut CommandContext) -> EngineResult<()> {
        let job = ctx.job_manager().require_job(self.job_id)?;
        ctx.check_authorized(|checker, principal| checker.check_update_job(principal, &job))?;
        ctx.job_manager().set_suspended(self.job_id, false)?;
        Ok(())
    }
}

/// Remove a job permanently.
///
/// A job whose lease is live is being executed right now; deleting it would
/// race the worker's commit, so the command refuses with a conflict.
pub struct DeleteJobCmd {
    job_id: JobId,
}

impl DeleteJobCmd {
    pub fn new(job_id: &str) -> EngineResult<Self> {
        Ok(Self::from_id(parse_job_id(job_id)?))
    }

    pub fn from_id(job_id: JobId) -> Self {
        Self { job_id }
    }
}

impl Command for DeleteJobCmd {
    type Output = ();

    fn name(&self) -> &'static str {
        "delete-job"
    }

    fn execute(&self, ctx: &mut CommandContext) -> EngineResult<()> {
        let job = ctx.job_manager().require_job(self.job_id)?;
        ctx.check_authorized(|checker, principal| checker.check_delete_job(principal, &job))?;
        if job.lease_held(Utc::now()) {
            return Err(EngineError::conflict(format!(
                "cannot delete job '{}' while a worker holds its lease",
                job.id
            )));
        }
        ctx.job_manager().delete(self.job_id)?;
        Ok(())
    }
}

/// Create a job.
pub struct CreateJobCmd {
    handler_type: String,
    payload: serde_json::Value,
    due_date: Option<DateTime<Utc>>,
    retries: Option<u32>,
    tenant_id: Option<TenantId>,
    process_definition_id: Option<ProcessDefinitionId>,
    execution_id: Option<ExecutionId>,
}

impl CreateJobCmd {
    pub fn new(handler_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            handler_type: handler_type.into(),
            payload,
            due_date: None,
            retries: None,
            tenant_id: None,
            process_definition_id: None,
            execution_id: None,
        }
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_process_definition(mut self, id: ProcessDefinitionId) -> Self {
        self.process_definition_id = Some(id);
        self
    }

    pub fn with_execution(mut self, id: ExecutionId) -> Self {
        self.execution_id = Some(id);
        self
    }
}

impl Command for CreateJobCmd {
    type Output = JobId;

    fn name(&self) -> &'static str {
        "create-job"
    }

    fn execute(&self, ctx: &mut CommandContext) -> EngineResult<JobId> {
        if self.handler_type.trim().is_empty() {
            return Err(EngineError::invalid_argument(
                "handler type must not be empty",
            ));
        }

        let mut job = Job::new(self.handler_type.clone(), self.payload.clone());
        job.due_date = self.due_date;
        job.retries = self.retries.unwrap_or(ctx.default_retries());
        job.tenant_id = self.tenant_id;
        job.process_definition_id = self.process_definition_id;
        job.execution_id = self.execution_id;

        ctx.check_authorized(|checker, principal| checker.check_create_job(principal, &job))?;

        let job_id = job.id;
        let due_date = job.due_date;
        ctx.job_manager().insert(job)?;
        ctx.queue_notification(EngineEvent::JobCreated { job_id, due_date });
        Ok(job_id)
    }
}

/// Snapshot of acquirable jobs, oldest due date first.
///
/// Run by the job executor at the start of each cycle; also useful for
/// inspecting queue depth.
pub struct FindDueJobsCmd {
    as_of: DateTime<Utc>,
    limit: usize,
}

impl FindDueJobsCmd {
    pub fn new(as_of: DateTime<Utc>, limit: usize) -> Self {
        Self { as_of, limit }
    }
}

impl Command for FindDueJobsCmd {
    type Output = Vec<Job>;

    fn name(&self) -> &'static str {
        "find-due-jobs"
    }

    fn execute(&self, ctx: &mut CommandContext) -> EngineResult<Vec<Job>> {
        ctx.job_manager().find_due_jobs(self.as_of, self.limit)
    }
}

/// Try to take the execution lease on one job.
///
/// Returns `false` when the job is gone or not acquirable, which covers the
/// losing side of an acquisition race: if two workers lock concurrently, the
/// loser's commit conflicts, the pipeline re-runs this command, and the
/// fresh read sees the winner's lease.
pub struct LockJobCmd {
    job_id: JobId,
    owner: String,
    as_of: DateTime<Utc>,
    lock_until: DateTime<Utc>,
}

impl LockJobCmd {
    pub fn new(
        job_id: JobId,
        owner: impl Into<String>,
        as_of: DateTime<Utc>,
        lock_until: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id,
            owner: owner.into(),
            as_of,
            lock_until,
        }
    }
}

impl Command for LockJobCmd {
    type Output = bool;

    fn name(&self) -> &'static str {
        "lock-job"
    }

    fn execute(&self, ctx: &mut CommandContext) -> EngineResult<bool> {
        let Some(job) = ctx.job_manager().find_job_by_id(self.job_id)? else {
            return Ok(false);
        };
        if !job.is_acquirable(self.as_of) {
            return Ok(false);
        }
        ctx.job_manager()
            .lock(self.job_id, &self.owner, self.lock_until)?;
        Ok(true)
    }
}

/// Run a locked job's handler and, on success, delete the job.
///
/// The lease is re-validated inside the transaction: if it was lost between
/// acquisition and execution the command conflicts without running the
/// handler. Handler errors abort the transaction, so a failed body leaves
/// the job exactly as acquired.
pub struct ExecuteJobCmd {
    job_id: JobId,
    owner: String,
    as_of: DateTime<Utc>,
    handlers: Arc<HandlerRegistry>,
}

impl ExecuteJobCmd {
    pub fn new(
        job_id: JobId,
        owner: impl Into<String>,
        as_of: DateTime<Utc>,
        handlers: Arc<HandlerRegistry>,
    ) -> Self {
        Self {
            job_id,
            owner: owner.into(),
            as_of,
            handlers,
        }
    }
}

impl Command for ExecuteJobCmd {
    type Output = ();

    fn name(&self) -> &'static str {
        "execute-job"
    }

    fn execute(&self, ctx: &mut CommandContext) -> EngineResult<()> {
        let job = ctx.job_manager().require_job(self.job_id)?;
        if job.suspended {
            return Err(EngineError::conflict(format!(
                "job '{}' was suspended after acquisition",
                job.id
            )));
        }
        if !job.lease_held_by(&self.owner, self.as_of) {
            return Err(EngineError::conflict(format!(
                "job '{}' is no longer held by '{}'",
                job.id, self.owner
            )));
        }

        let handler = self.handlers.get(&job.handler_type).ok_or_else(|| {
            EngineError::execution(
                format!("no handler registered for type '{}'", job.handler_type),
                String::new(),
            )
        })?;

        handler.execute(&job, ctx).map_err(|err| {
            let info = ExceptionInfo::from_error(&err);
            EngineError::execution(info.message, info.detail)
        })?;

        ctx.job_manager().delete(self.job_id)?;
        ctx.queue_notification(EngineEvent::JobSucceeded { job_id: self.job_id });
        Ok(())
    }
}

/// Book a failed execution: consume a retry, park the job on the backoff
/// curve, release the lease.
///
/// Runs in its own transaction after the execution's rollback, so the
/// failure bookkeeping survives even though the handler's work did not.
pub struct FailJobCmd {
    job_id: JobId,
    exception: ExceptionInfo,
    as_of: DateTime<Utc>,
    backoff: BackoffPolicy,
}

impl FailJobCmd {
    pub fn new(
        job_id: JobId,
        exception: ExceptionInfo,
        as_of: DateTime<Utc>,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            job_id,
            exception,
            as_of,
            backoff,
        }
    }
}

impl Command for FailJobCmd {
    type Output = u32;

    fn name(&self) -> &'static str {
        "fail-job"
    }

    fn execute(&self, ctx: &mut CommandContext) -> EngineResult<u32> {
        let failed = ctx
            .job_manager()
            .record_failure(self.job_id, self.exception.clone())?;

        if failed.retries > 0 {
            let delay = self.backoff.delay_for_failure(failed.failures);
            let due_date = self.as_of + chrono::Duration::from_std(delay).unwrap_or_default();
            ctx.job_manager().set_duedate(self.job_id, Some(due_date))?;
            ctx.job_manager().unlock(self.job_id)?;
            ctx.queue_notification(EngineEvent::JobRetryScheduled {
                job_id: self.job_id,
                retries_remaining: failed.retries,
                due_date,
            });
        } else {
            ctx.job_manager().unlock(self.job_id)?;
            ctx.queue_notification(EngineEvent::JobExhausted {
                job_id: self.job_id,
            });
        }

        Ok(failed.retries)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
