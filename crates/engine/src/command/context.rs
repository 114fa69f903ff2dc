//! Per-attempt execution context.

use std::sync::Arc;

use flowforge_auth::Principal;
use flowforge_core::EngineResult;

use crate::checker::CommandChecker;
use crate::event::EngineEvent;
use crate::jobs::manager::JobManager;
use crate::persistence::session::EntitySession;

/// Execution state for a single command attempt.
///
/// A fresh context is created for every attempt, including conflict retries:
/// the session cache, queued notifications, and caller identity never leak
/// across attempts. Commands reach persistent state only through
/// [`JobManager`] and announce state changes only through
/// [`queue_notification`](Self::queue_notification); both take effect
/// atomically when the pipeline flushes the context.
pub struct CommandContext {
    session: EntitySession,
    principal: Option<Principal>,
    checkers: Vec<Arc<dyn CommandChecker>>,
    notifications: Vec<EngineEvent>,
    default_retries: u32,
}

impl CommandContext {
    pub(crate) fn new(
        session: EntitySession,
        principal: Option<Principal>,
        checkers: Vec<Arc<dyn CommandChecker>>,
        default_retries: u32,
    ) -> Self {
        Self {
            session,
            principal,
            checkers,
            notifications: Vec::new(),
            default_retries,
        }
    }

    /// The authenticated caller, if any.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub(crate) fn default_retries(&self) -> u32 {
        self.default_retries
    }

    /// Entity access for the current transaction.
    pub fn job_manager(&mut self) -> JobManager<'_> {
        JobManager::new(&mut self.session)
    }

    /// Run one capability check against every registered checker, in
    /// registration order, stopping at the first rejection.
    ///
    /// Executions without a principal skip checking entirely; that is how
    /// internal engine commands and trusted embedders run.
    pub fn check_authorized<F>(&self, check: F) -> EngineResult<()>
    where
        F: Fn(&dyn CommandChecker, &Principal) -> EngineResult<()>,
    {
        let Some(principal) = &self.principal else {
            return Ok(());
        };
        for checker in &self.checkers {
            check(checker.as_ref(), principal)?;
        }
        Ok(())
    }

    /// Queue a notification for publication after commit.
    ///
    /// Queued notifications are discarded together with the session if the
    /// attempt fails.
    pub fn queue_notification(&mut self, event: EngineEvent) {
        self.notifications.push(event);
    }

    /// Commit the transaction and hand back the notifications to publish.
    pub(crate) fn flush(self) -> EngineResult<Vec<EngineEvent>> {
        let Self {
            session,
            notifications,
            ..
        } = self;
        session.flush()?;
        Ok(notifications)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use flowforge_auth::PrincipalId;
    use flowforge_core::EngineError;

    use crate::jobs::entity::Job;
    use crate::persistence::InMemoryEntityStore;

    struct Recording {
        name: &'static str,
        calls: Arc<Mutex<Vec<&'static str>>>,
        reject: bool,
    }

    impl CommandChecker for Recording {
        fn check_read_job(&self, _principal: &Principal, _job: &Job) -> EngineResult<()> {
            self.calls.lock().unwrap().push(self.name);
            if self.reject {
                Err(EngineError::forbidden("rejected"))
            } else {
                Ok(())
            }
        }
    }

    fn context(
        principal: Option<Principal>,
        checkers: Vec<Arc<dyn CommandChecker>>,
    ) -> CommandContext {
        let session = EntitySession::new(InMemoryEntityStore::arc());
        CommandContext::new(session, principal, checkers, 3)
    }

    fn recording(
        name: &'static str,
        calls: &Arc<Mutex<Vec<&'static str>>>,
        reject: bool,
    ) -> Arc<dyn CommandChecker> {
        Arc::new(Recording {
            name,
            calls: calls.clone(),
            reject,
        })
    }

    #[test]
    fn checkers_run_in_registration_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let ctx = context(
            Some(Principal::new(PrincipalId::new())),
            vec![
                recording("first", &calls, false),
                recording("second", &calls, false),
            ],
        );

        let job = Job::new("noop", serde_json::json!({}));
        ctx.check_authorized(|c, p| c.check_read_job(p, &job))
            .unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn first_rejection_short_circuits() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let ctx = context(
            Some(Principal::new(PrincipalId::new())),
            vec![
                recording("first", &calls, true),
                recording("second", &calls, false),
            ],
        );

        let job = Job::new("noop", serde_json::json!({}));
        let err = ctx
            .check_authorized(|c, p| c.check_read_job(p, &job))
            .unwrap_err();

        assert!(matches!(err, EngineError::Forbidden(_)));
        assert_eq!(*calls.lock().unwrap(), vec!["first"]);
    }

    #[test]
    fn executions_without_a_principal_skip_checkers() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let ctx = context(None, vec![recording("first", &calls, true)]);

        let job = Job::new("noop", serde_json::json!({}));
        ctx.check_authorized(|c, p| c.check_read_job(p, &job))
            .unwrap();

        assert!(calls.lock().unwrap().is_empty());
    }
}
