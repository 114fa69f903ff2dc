//! The persistent job entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flowforge_core::{ExecutionId, JobId, ProcessDefinitionId, TenantId};

/// Detail of the last failed execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    /// Top-level error message.
    pub message: String,
    /// Rendered cause chain of the failure.
    pub detail: String,
}

impl ExceptionInfo {
    pub fn new(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: detail.into(),
        }
    }

    /// Capture an error raised by a job body, rendering its full cause chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        Self {
            message: err.to_string(),
            detail: format!("{err:#}"),
        }
    }
}

/// One unit of deferred/asynchronous work (timer, async continuation, retry).
///
/// A job is eligible for acquisition once its due date has passed, provided it
/// is not suspended, still has retries left, and no worker holds a live lease
/// on it. The lease (`lock_owner` + `lock_expiration_time`) is the only
/// exclusion mechanism: a lease whose expiration has passed counts as released
/// even if the owning worker never cleared it, which is what makes crashed
/// workers recoverable without a heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique, immutable identity.
    pub id: JobId,

    /// Optimistic locking revision; bumped by the store on every committed
    /// update.
    pub revision: u32,

    /// Selects the job body in the handler registry.
    pub handler_type: String,

    /// Opaque input for the job body.
    pub payload: serde_json::Value,

    /// When the job becomes eligible for acquisition. `None` means
    /// immediately due.
    pub due_date: Option<DateTime<Utc>>,

    /// Remaining retry budget. A job at zero is permanently failed and
    /// requires manual intervention (`SetJobRetriesCmd`).
    pub retries: u32,

    /// How many times execution has failed so far. Positions the job on the
    /// backoff curve independently of how large the retry budget was.
    pub failures: u32,

    /// Identity of the worker holding the execution lease, if any.
    pub lock_owner: Option<String>,

    /// Instant after which a held lease counts as abandoned.
    pub lock_expiration_time: Option<DateTime<Utc>>,

    /// Last failure detail; set on failed execution.
    pub exception_info: Option<ExceptionInfo>,

    /// Suspended jobs are never acquired regardless of due date.
    pub suspended: bool,

    /// Tenant the job belongs to, if any.
    pub tenant_id: Option<TenantId>,

    /// Owning process definition; opaque to the scheduler.
    pub process_definition_id: Option<ProcessDefinitionId>,

    /// Owning execution; opaque to the scheduler.
    pub execution_id: Option<ExecutionId>,

    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Retry budget applied when a job is created without an explicit one.
    pub const DEFAULT_RETRIES: u32 = 3;

    pub fn new(handler_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: JobId::new(),
            revision: 1,
            handler_type: handler_type.into(),
            payload,
            due_date: None,
            retries: Self::DEFAULT_RETRIES,
            failures: 0,
            lock_owner: None,
            lock_expiration_time: None,
            exception_info: None,
            suspended: false,
            tenant_id: None,
            process_definition_id: None,
            execution_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
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

    /// Whether the due date has passed (or was never set).
    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        self.due_date.is_none_or(|due| due <= as_of)
    }

    /// Whether a worker currently holds a live lease.
    ///
    /// A lease with no expiration never lapses on its own.
    pub fn lease_held(&self, as_of: DateTime<Utc>) -> bool {
        match (&self.lock_owner, self.lock_expiration_time) {
            (None, _) => false,
            (Some(_), Some(expires)) => expires >= as_of,
            (Some(_), None) => true,
        }
    }

    /// Whether `owner` holds a live lease on this job.
    pub fn lease_held_by(&self, owner: &str, as_of: DateTime<Utc>) -> bool {
        self.lock_owner.as_deref() == Some(owner) && self.lease_held(as_of)
    }

    /// Whether an acquisition query run at `as_of` may return this job.
    pub fn is_acquirable(&self, as_of: DateTime<Utc>) -> bool {
        !self.suspended && self.retries > 0 && self.is_due(as_of) && !self.lease_held(as_of)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
