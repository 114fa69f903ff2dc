//! Session-scoped entity cache.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use flowforge_core::{EngineError, EngineResult, ExpectedRevision, JobId};

use super::store::{EntityStore, WriteOp};
use crate::jobs::entity::Job;

enum CacheSlot {
    /// Fetched from the store; `current` carries in-session edits.
    Loaded { original: Job, current: Job },
    /// Created in this session, not yet in the store.
    Inserted { current: Job },
    /// Deleted in this session; remembers the revision the delete must match.
    Deleted { original_revision: u32 },
    /// Probed and absent from the store.
    Missing,
}

/// Unit-of-work cache backing one command execution.
///
/// Every entity read is cached on first access, so a command sees its own
/// pending writes. Nothing reaches the store until `flush`, which turns the
/// cache into one atomic batch with a revision check per touched row.
/// Dropping the session without flushing discards all of it, which is how a
/// failed command rolls back.
pub(crate) struct EntitySession {
    store: Arc<dyn EntityStore>,
    cache: HashMap<JobId, CacheSlot>,
}

impl EntitySession {
    pub(crate) fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    fn ensure_loaded(&mut self, id: JobId) -> EngineResult<()> {
        if self.cache.contains_key(&id) {
            return Ok(());
        }
        let slot = match self.store.find_job(id)? {
            Some(job) => CacheSlot::Loaded {
                original: job.clone(),
                current: job,
            },
            None => CacheSlot::Missing,
        };
        self.cache.insert(id, slot);
        Ok(())
    }

    pub(crate) fn find_job(&mut self, id: JobId) -> EngineResult<Option<Job>> {
        self.ensure_loaded(id)?;
        Ok(match self.cache.get(&id) {
            Some(CacheSlot::Loaded { current, .. }) | Some(CacheSlot::Inserted { current }) => {
                Some(current.clone())
            }
            _ => None,
        })
    }

    /// Snapshot query against committed state; in-session edits are not
    /// visible here.
    pub(crate) fn find_due_jobs(
        &self,
        as_of: DateTime<Utc>,
        limit: usize,
    ) -> EngineResult<Vec<Job>> {
        Ok(self.store.find_due_jobs(as_of, limit)?)
    }

    pub(crate) fn insert(&mut self, job: Job) -> EngineResult<()> {
        match self.cache.get(&job.id) {
            None | Some(CacheSlot::Missing) => {
                self.cache
                    .insert(job.id, CacheSlot::Inserted { current: job });
                Ok(())
            }
            Some(_) => Err(EngineError::conflict(format!(
                "job already exists: {}",
                job.id
            ))),
        }
    }

    pub(crate) fn update(&mut self, job: Job) -> EngineResult<()> {
        let id = job.id;
        self.ensure_loaded(id)?;
        match self.cache.get_mut(&id) {
            Some(CacheSlot::Loaded { current, .. }) | Some(CacheSlot::Inserted { current }) => {
                *current = job;
                Ok(())
            }
            _ => Err(EngineError::not_found("job", id.to_string())),
        }
    }

    pub(crate) fn delete(&mut self, id: JobId) -> EngineResult<()> {
        self.ensure_loaded(id)?;
        match self.cache.get(&id) {
            Some(CacheSlot::Loaded { original, .. }) => {
                let original_revision = original.revision;
                self.cache
                    .insert(id, CacheSlot::Deleted { original_revision });
                Ok(())
            }
            Some(CacheSlot::Inserted { .. }) => {
                // Never reached the store; forget it entirely.
                self.cache.remove(&id);
                Ok(())
            }
            _ => Err(EngineError::not_found("job", id.to_string())),
        }
    }

    /// Commit everything this session changed as one atomic batch.
    ///
    /// Untouched and unchanged entities produce no writes.
    pub(crate) fn flush(self) -> EngineResult<()> {
        let mut ops = Vec::new();
        for (id, slot) in self.cache {
            match slot {
                CacheSlot::Loaded { original, current } => {
                    if current != original {
                        ops.push(WriteOp::Update {
                            job: current,
                            expected_revision: ExpectedRevision::Exact(original.revision),
                        });
                    }
                }
                CacheSlot::Inserted { current } => ops.push(WriteOp::Insert(current)),
                CacheSlot::Deleted { original_revision } => ops.push(WriteOp::Delete {
                    id,
                    expected_revision: ExpectedRevision::Exact(original_revision),
                }),
                CacheSlot::Missing => {}
            }
        }

        // Deterministic op order for multi-row batches.
        ops.sort_by_key(|op| op.job_id());
        self.store.commit(ops)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::in_memory::InMemoryEntityStore;

    fn job() -> Job {
        Job::new("noop", serde_json::json!({}))
    }

    fn seeded(jobs: &[Job]) -> Arc<InMemoryEntityStore> {
        let store = InMemoryEntityStore::arc();
        for j in jobs {
            store.commit(vec![WriteOp::Insert(j.clone())]).unwrap();
        }
        store
    }

    #[test]
    fn session_reads_its_own_inserts() {
        let store = InMemoryEntityStore::arc();
        let mut session = EntitySession::new(store.clone());

        let j = job();
        let id = j.id;
        session.insert(j).unwrap();

        assert!(session.find_job(id).unwrap().is_some());
        // Not committed yet.
        assert!(store.find_job(id).unwrap().is_none());

        session.flush().unwrap();
        assert!(store.find_job(id).unwrap().is_some());
    }

    #[test]
    fn session_reads_its_own_updates() {
        let j = job();
        let store = seeded(&[j.clone()]);
        let mut session = EntitySession::new(store.clone());

        let mut loaded = session.find_job(j.id).unwrap().unwrap();
        loaded.retries = 42;
        session.update(loaded).unwrap();

        assert_eq!(session.find_job(j.id).unwrap().unwrap().retries, 42);
        // The store still holds the committed value.
        assert_ne!(store.find_job(j.id).unwrap().unwrap().retries, 42);
    }

    #[test]
    fn only_changed_entities_are_written() {
        let touched = job();
        let untouched = job();
        let store = seeded(&[touched.clone(), untouched.clone()]);
        let mut session = EntitySession::new(store.clone());

        let mut a = session.find_job(touched.id).unwrap().unwrap();
        session.find_job(untouched.id).unwrap().unwrap();
        a.retries = 42;
        session.update(a).unwrap();
        session.flush().unwrap();

        assert_eq!(store.find_job(touched.id).unwrap().unwrap().revision, 2);
        assert_eq!(store.find_job(untouched.id).unwrap().unwrap().revision, 1);
    }

    #[test]
    fn dropping_a_session_discards_changes() {
        let j = job();
        let store = seeded(&[j.clone()]);

        {
            let mut session = EntitySession::new(store.clone());
            let mut loaded = session.find_job(j.id).unwrap().unwrap();
            loaded.retries = 42;
            session.update(loaded).unwrap();
            session.delete(j.id).unwrap();
        }

        let committed = store.find_job(j.id).unwrap().unwrap();
        assert_eq!(committed.revision, 1);
        assert_eq!(committed.retries, j.retries);
    }

    #[test]
    fn insert_then_delete_never_reaches_the_store() {
        let store = InMemoryEntityStore::arc();
        let mut session = EntitySession::new(store.clone());

        let j = job();
        let id = j.id;
        session.insert(j).unwrap();
        session.delete(id).unwrap();
        assert!(session.find_job(id).unwrap().is_none());

        session.flush().unwrap();
        assert!(store.find_job(id).unwrap().is_none());
    }

    #[test]
    fn delete_is_committed_on_flush() {
        let j = job();
        let store = seeded(&[j.clone()]);
        let mut session = EntitySession::new(store.clone());

        session.delete(j.id).unwrap();
        assert!(session.find_job(j.id).unwrap().is_none());

        session.flush().unwrap();
        assert!(store.find_job(j.id).unwrap().is_none());
    }

    #[test]
    fn stale_session_conflicts_on_flush() {
        let j = job();
        let store = seeded(&[j.clone()]);

        let mut first = EntitySession::new(store.clone());
        let mut second = EntitySession::new(store.clone());

        let mut a = first.find_job(j.id).unwrap().unwrap();
        let mut b = second.find_job(j.id).unwrap().unwrap();
        a.retries = 1;
        b.retries = 2;
        first.update(a).unwrap();
        second.update(b).unwrap();

        first.flush().unwrap();
        let err = second.flush().unwrap_err();
        assert!(err.is_conflict());

        assert_eq!(store.find_job(j.id).unwrap().unwrap().retries, 1);
    }

    #[test]
    fn deleting_a_missing_job_is_not_found() {
        let store = InMemoryEntityStore::arc();
        let mut session = EntitySession::new(store);

        let err = session.delete(JobId::new()).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}
