//! Engine facade.

use std::sync::Arc;

use flowforge_auth::Principal;
use flowforge_core::EngineResult;
use flowforge_events::EventBus;

use crate::command::{Command, CommandExecutor, NotificationBus};
use crate::config::EngineConfig;
use crate::event::EngineEvent;
use crate::persistence::{EntityStore, InMemoryEntityStore};
use crate::scheduler::{HandlerRegistry, JobExecutor, JobExecutorConfig, JobExecutorHandle};

/// Process engine entry point.
///
/// Wires the entity store, the notification bus, and the command executor
/// together. Everything the engine does, foreground API calls and background
/// job execution alike, flows through [`Engine::execute`] and shares the
/// same transactional and authorization behavior.
pub struct Engine {
    executor: Arc<CommandExecutor>,
    bus: Arc<NotificationBus>,
    handlers: Arc<HandlerRegistry>,
    job_executor: JobExecutorConfig,
}

impl Engine {
    /// Engine over a fresh in-memory store.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_store(InMemoryEntityStore::arc(), config)
    }

    /// Engine over an existing store.
    pub fn with_store(store: Arc<dyn EntityStore>, config: EngineConfig) -> Self {
        let EngineConfig {
            checkers,
            command_attempts,
            default_retries,
            handlers,
            job_executor,
        } = config;

        let bus = Arc::new(NotificationBus::new());
        let executor = Arc::new(CommandExecutor::new(
            store,
            bus.clone(),
            checkers,
            command_attempts,
            default_retries,
        ));

        Self {
            executor,
            bus,
            handlers: Arc::new(handlers),
            job_executor,
        }
    }

    /// Execute a command without a principal. Checkers are skipped, so this
    /// is the engine-internal (system) execution path.
    pub fn execute<C: Command>(&self, command: &C) -> EngineResult<C::Output> {
        self.executor.execute(command)
    }

    /// Execute a command on behalf of a principal, consulting every
    /// registered checker.
    pub fn execute_as<C: Command>(
        &self,
        principal: &Principal,
        command: &C,
    ) -> EngineResult<C::Output> {
        self.executor.execute_as(Some(principal), command)
    }

    /// Subscribe to committed-change notifications.
    pub fn subscribe(&self) -> flowforge_events::Subscription<EngineEvent> {
        self.bus.subscribe()
    }

    /// Start the background worker pool. The returned handle stops it.
    ///
    /// May be called more than once; each call spawns an independent pool
    /// competing for the same jobs through leases.
    pub fn start_job_executor(&self) -> JobExecutorHandle {
        JobExecutor::new(
            self.executor.clone(),
            self.bus.clone(),
            self.handlers.clone(),
            self.job_executor.clone(),
        )
        .start()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::PermissionChecker;
    use crate::jobs::{CreateJobCmd, GetJobCmd};
    use flowforge_auth::{Permission, PrincipalId};

    #[test]
    fn engine_round_trips_a_job() {
        let engine = Engine::new(EngineConfig::default());

        let job_id = engine
            .execute(&CreateJobCmd::new("send-email", serde_json::json!({"to": "ops"})))
            .unwrap();
        let job = engine.execute(&GetJobCmd::from_id(job_id)).unwrap();

        assert_eq!(job.handler_type, "send-email");
        assert_eq!(job.retries, 3);
    }

    #[test]
    fn configured_checkers_gate_principal_executions() {
        let engine = Engine::new(
            EngineConfig::default().with_checker(Arc::new(PermissionChecker::new())),
        );
        let reader = Principal::new(PrincipalId::new()).with_permission(Permission::JOB_READ);

        let job_id = engine
            .execute(&CreateJobCmd::new("send-email", serde_json::json!({})))
            .unwrap();

        assert!(engine.execute_as(&reader, &GetJobCmd::from_id(job_id)).is_ok());
        let err = engine
            .execute_as(&reader, &CreateJobCmd::new("send-email", serde_json::json!({})))
            .unwrap_err();
        assert!(matches!(err, flowforge_core::EngineError::Forbidden(_)));
    }

    #[test]
    fn subscribers_see_committed_changes() {
        let engine = Engine::new(EngineConfig::default());
        let subscription = engine.subscribe();

        let job_id = engine
            .execute(&CreateJobCmd::new("send-email", serde_json::json!({})))
            .unwrap();

        match subscription.try_recv() {
            Ok(EngineEvent::JobCreated { job_id: id, .. }) => assert_eq!(id, job_id),
            other => panic!("expected a creation notification, got {other:?}"),
        }
    }
}
