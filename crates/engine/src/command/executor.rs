//! Command execution pipeline (application-level orchestration).
//!
//! Every read and every write of engine state travels the same path:
//!
//! ```text
//! Command
//!   ↓
//! 1. Open a fresh session (unit-of-work cache over the entity store)
//!   ↓
//! 2. Execute the command body (lookups, capability checks, mutations)
//!   ↓
//! 3. Flush the session (one atomic batch, revision check per touched row)
//!   ↓
//! 4. Publish queued notifications (only after the commit succeeded)
//! ```
//!
//! ## Retry Semantics
//!
//! Only `Conflict` errors are retried, because they are the one failure class
//! where re-running the same command against fresh state can legitimately
//! produce a different outcome. Each retry re-executes the whole command with
//! a brand-new context; nothing from a failed attempt survives. Validation,
//! not-found, and authorization failures are deterministic and surface
//! immediately.
//!
//! ## Publication Guarantees
//!
//! Notifications go out strictly after commit, so a subscriber never hears
//! about work that rolled back. A crash between commit and publish loses the
//! notification; subscribers poll as well, so hints are an optimization,
//! never load-bearing.

use std::sync::Arc;

use tracing::{debug, warn};

use flowforge_auth::Principal;
use flowforge_core::{EngineError, EngineResult};
use flowforge_events::{EventBus, InMemoryEventBus};

use super::context::CommandContext;
use crate::checker::CommandChecker;
use crate::event::EngineEvent;
use crate::persistence::session::EntitySession;
use crate::persistence::EntityStore;

/// Bus committed commands publish their notifications to.
pub type NotificationBus = InMemoryEventBus<EngineEvent>;

/// A unit of engine work with a typed result.
///
/// Commands are the only way to touch engine state. A command body must
/// tolerate re-execution from scratch: the pipeline re-runs it with a fresh
/// context whenever its commit loses an optimistic locking race.
pub trait Command {
    type Output;

    /// Stable name for logs.
    fn name(&self) -> &'static str;

    fn execute(&self, ctx: &mut CommandContext) -> EngineResult<Self::Output>;
}

/// Runs commands through the session/flush/publish pipeline with bounded
/// conflict retry.
pub struct CommandExecutor {
    store: Arc<dyn EntityStore>,
    bus: Arc<NotificationBus>,
    checkers: Vec<Arc<dyn CommandChecker>>,
    max_attempts: u32,
    default_retries: u32,
}

impl CommandExecutor {
    pub(crate) fn new(
        store: Arc<dyn EntityStore>,
        bus: Arc<NotificationBus>,
        checkers: Vec<Arc<dyn CommandChecker>>,
        max_attempts: u32,
        default_retries: u32,
    ) -> Self {
        Self {
            store,
            bus,
            checkers,
            max_attempts,
            default_retries,
        }
    }

    /// Execute a command without a caller identity (checkers are skipped).
    pub fn execute<C: Command>(&self, command: &C) -> EngineResult<C::Output> {
        self.execute_as(None, command)
    }

    /// Execute a command on behalf of a principal.
    pub fn execute_as<C: Command>(
        &self,
        principal: Option<&Principal>,
        command: &C,
    ) -> EngineResult<C::Output> {
        let mut attempt = 1u32;
        loop {
            match self.attempt(principal, command) {
                Err(err) if err.is_conflict() && attempt < self.max_attempts => {
                    debug!(
                        command = command.name(),
                        attempt,
                        error = %err,
                        "command conflicted, retrying"
                    );
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_conflict() {
                        warn!(
                            command = command.name(),
                            attempts = attempt,
                            error = %err,
                            "command conflicted on final attempt"
                        );
                    }
                    return Err(err);
                }
                Ok(output) => return Ok(output),
            }
        }
    }

    fn attempt<C: Command>(
        &self,
        principal: Option<&Principal>,
        command: &C,
    ) -> EngineResult<C::Output> {
        let session = EntitySession::new(self.store.clone());
        let mut ctx = CommandContext::new(
            session,
            principal.cloned(),
            self.checkers.clone(),
            self.default_retries,
        );

        let output = command.execute(&mut ctx)?;
        let notifications = ctx.flush()?;

        for event in notifications {
            self.bus
                .publish(event)
                .map_err(|e| EngineError::storage(format!("notification publish failed: {e:?}")))?;
        }

        Ok(output)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
