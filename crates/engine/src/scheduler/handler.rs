//! Job bodies and their registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::command::CommandContext;
use crate::jobs::entity::Job;

/// A job body, selected by the job's handler type.
///
/// The handler runs inside the same transaction that deletes the job on
/// success: engine state it changes through `ctx` commits atomically with
/// that deletion, and rolls back with it when the handler returns an error.
///
/// Side effects outside the context (network calls, file writes) are not
/// transactional. A worker can crash after such an effect but before commit,
/// in which case the job runs again once its lease expires. Handlers must
/// therefore tolerate re-execution.
pub trait JobHandler: Send + Sync {
    fn execute(&self, job: &Job, ctx: &mut CommandContext) -> anyhow::Result<()>;
}

impl<F> JobHandler for F
where
    F: Fn(&Job, &mut CommandContext) -> anyhow::Result<()> + Send + Sync,
{
    fn execute(&self, job: &Job, ctx: &mut CommandContext) -> anyhow::Result<()> {
        self(job, ctx)
    }
}

/// Maps handler types to job bodies.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a handler type, replacing any previous one.
    pub fn register(&mut self, handler_type: impl Into<String>, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(handler_type.into(), handler);
    }

    /// Register a closure as a handler.
    pub fn register_fn<F>(&mut self, handler_type: impl Into<String>, handler: F)
    where
        F: Fn(&Job, &mut CommandContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(handler_type, Arc::new(handler));
    }

    pub fn get(&self, handler_type: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(handler_type).cloned()
    }

    pub fn contains(&self, handler_type: &str) -> bool {
        self.handlers.contains_key(handler_type)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handler_types", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
