use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use flowforge_core::JobId;

use super::store::{EntityStore, StoreError, WriteOp};
use crate::jobs::entity::Job;

/// In-memory entity store.
///
/// Intended for tests/dev and for embedding the engine without external
/// storage. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl EntityStore for InMemoryEntityStore {
    fn find_job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        let jobs = self
            .jobs
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

        Ok(jobs.get(&id).cloned())
    }

    fn find_due_jobs(&self, as_of: DateTime<Utc>, limit: usize) -> Result<Vec<Job>, StoreError> {
        let jobs = self
            .jobs
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

        let mut due: Vec<Job> = jobs
            .values()
            .filter(|j| j.is_acquirable(as_of))
            .cloned()
            .collect();

        // Oldest work first; v7 IDs keep the tie-break in creation order.
        due.sort_by_key(|j| (j.due_date, j.id));
        due.truncate(limit);
        Ok(due)
    }

    fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        if ops.is_empty() {
            return Ok(());
        }

        let mut jobs = self
            .jobs
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

        // Validate every check in the batch before applying anything.
        for op in &ops {
            match op {
                WriteOp::Insert(job) => {
                    if jobs.contains_key(&job.id) {
                        return Err(StoreError::AlreadyExists(job.id));
                    }
                }
                WriteOp::Update {
                    job,
                    expected_revision,
                } => match jobs.get(&job.id) {
                    Some(current) if expected_revision.matches(current.revision) => {}
                    current => {
                        return Err(StoreError::Concurrency {
                            id: job.id,
                            expected: *expected_revision,
                            actual: current.map(|j| j.revision),
                        });
                    }
                },
                WriteOp::Delete {
                    id,
                    expected_revision,
                } => match jobs.get(id) {
                    Some(current) if expected_revision.matches(current.revision) => {}
                    current => {
                        return Err(StoreError::Concurrency {
                            id: *id,
                            expected: *expected_revision,
                            actual: current.map(|j| j.revision),
                        });
                    }
                },
            }
        }

        for op in ops {
            match op {
                WriteOp::Insert(job) => {
                    jobs.insert(job.id, job);
                }
                WriteOp::Update { mut job, .. } => {
                    if let Some(current) = jobs.get(&job.id) {
                        job.revision = current.revision + 1;
                        jobs.insert(job.id, job);
                    }
                }
                WriteOp::Delete { id, .. } => {
                    jobs.remove(&id);
                }
            }
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
