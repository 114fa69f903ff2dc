//! Entity storage abstraction.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use flowforge_core::{EngineError, ExpectedRevision, JobId};

use crate::jobs::entity::Job;

/// One write against the store, carried from a session to `commit`.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Insert(Job),
    Update {
        job: Job,
        expected_revision: ExpectedRevision,
    },
    Delete {
        id: JobId,
        expected_revision: ExpectedRevision,
    },
}

impl WriteOp {
    pub fn job_id(&self) -> JobId {
        match self {
            WriteOp::Insert(job) => job.id,
            WriteOp::Update { job, .. } => job.id,
            WriteOp::Delete { id, .. } => *id,
        }
    }
}

/// Entity store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("optimistic locking failed for job '{id}': expected {expected:?}, found {actual:?}")]
    Concurrency {
        id: JobId,
        expected: ExpectedRevision,
        actual: Option<u32>,
    },
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Concurrency { .. } | StoreError::AlreadyExists(_) => {
                EngineError::Conflict(err.to_string())
            }
            StoreError::Storage(msg) => EngineError::Storage(msg),
        }
    }
}

/// Storage abstraction for jobs.
///
/// Reads are point-in-time snapshots. All writes go through `commit`, which
/// applies a batch atomically: every revision check in the batch must pass or
/// none of the ops take effect. That batch commit is what makes a command a
/// transaction.
pub trait EntityStore: Send + Sync {
    /// Get a job by ID.
    fn find_job(&self, id: JobId) -> Result<Option<Job>, StoreError>;

    /// List jobs eligible for acquisition at `as_of`, ordered by due date
    /// (immediately-due first) then ID, at most `limit`.
    fn find_due_jobs(&self, as_of: DateTime<Utc>, limit: usize) -> Result<Vec<Job>, StoreError>;

    /// Atomically apply a batch of writes.
    ///
    /// Revisions are bumped by the store itself on update; callers never
    /// fabricate revisions.
    fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;
}

impl<S: EntityStore + ?Sized> EntityStore for Arc<S> {
    fn find_job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        (**self).find_job(id)
    }

    fn find_due_jobs(&self, as_of: DateTime<Utc>, limit: usize) -> Result<Vec<Job>, StoreError> {
        (**self).find_due_jobs(as_of, limit)
    }

    fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        (**self).commit(ops)
    }
}
