//! Session-scoped job access.

use chrono::{DateTime, Utc};

use flowforge_core::{EngineError, EngineResult, JobId};

use super::entity::{ExceptionInfo, Job};
use crate::persistence::session::EntitySession;

/// Job reads and writes for the current transaction.
///
/// All mutations stay in the session until the pipeline flushes it; nothing
/// here touches the store directly except the snapshot due-jobs query.
pub struct JobManager<'a> {
    session: &'a mut EntitySession,
}

impl<'a> JobManager<'a> {
    pub(crate) fn new(session: &'a mut EntitySession) -> Self {
        Self { session }
    }

    pub fn find_job_by_id(&mut self, id: JobId) -> EngineResult<Option<Job>> {
        self.session.find_job(id)
    }

    /// Like [`find_job_by_id`](Self::find_job_by_id) but a missing job is an
    /// error.
    pub fn require_job(&mut self, id: JobId) -> EngineResult<Job> {
        self.session
            .find_job(id)?
            .ok_or_else(|| EngineError::not_found("job", id.to_string()))
    }

    /// Snapshot of jobs eligible for acquisition at `as_of`.
    pub fn find_due_jobs(&mut self, as_of: DateTime<Utc>, limit: usize) -> EngineResult<Vec<Job>> {
        self.session.find_due_jobs(as_of, limit)
    }

    pub fn insert(&mut self, job: Job) -> EngineResult<()> {
        self.session.insert(job)
    }

    pub fn delete(&mut self, id: JobId) -> EngineResult<()> {
        self.session.delete(id)
    }

    fn modify(&mut self, id: JobId, mutate: impl FnOnce(&mut Job)) -> EngineResult<Job> {
        let mut job = self.require_job(id)?;
        mutate(&mut job);
        self.session.update(job.clone())?;
        Ok(job)
    }

    pub fn set_duedate(&mut self, id: JobId, due_date: Option<DateTime<Utc>>) -> EngineResult<Job> {
        self.modify(id, |job| job.due_date = due_date)
    }

    pub fn set_retries(&mut self, id: JobId, retries: u32) -> EngineResult<Job> {
        self.modify(id, |job| job.retries = retries)
    }

    pub fn set_suspended(&mut self, id: JobId, suspended: bool) -> EngineResult<Job> {
        self.modify(id, |job| job.suspended = suspended)
    }

    pub fn lock(&mut self, id: JobId, owner: &str, until: DateTime<Utc>) -> EngineResult<Job> {
        self.modify(id, |job| {
            job.lock_owner = Some(owner.to_string());
            job.lock_expiration_time = Some(until);
        })
    }

    pub fn unlock(&mut self, id: JobId) -> EngineResult<Job> {
        self.modify(id, |job| {
            job.lock_owner = None;
            job.lock_expiration_time = None;
        })
    }

    /// Consume one retry and record the failure that consumed it.
    pub fn record_failure(&mut self, id: JobId, exception: ExceptionInfo) -> EngineResult<Job> {
        self.modify(id, |job| {
            job.retries = job.retries.saturating_sub(1);
            job.failures += 1;
            job.exception_info = Some(exception);
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
