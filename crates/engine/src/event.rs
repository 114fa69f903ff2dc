//! Post-commit engine notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flowforge_core::JobId;

/// Notification published after a command's transaction has committed.
///
/// These are delivery hints, not state: a crash between commit and publish
/// loses the notification, and consumers must fall back to polling the
/// entity store. Job workers use `JobCreated` to wake from their idle wait
/// ahead of the next poll tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EngineEvent {
    /// A job was persisted and will become due at `due_date` (immediately
    /// when `None`).
    JobCreated {
        job_id: JobId,
        due_date: Option<DateTime<Utc>>,
    },

    /// A job body ran to completion and the job was deleted.
    JobSucceeded { job_id: JobId },

    /// A job body failed; the job was rescheduled with a decremented retry
    /// budget.
    JobRetryScheduled {
        job_id: JobId,
        retries_remaining: u32,
        due_date: DateTime<Utc>,
    },

    /// A job body failed and the retry budget reached zero. The job stays in
    /// the store but is excluded from acquisition until retries are reset.
    JobExhausted { job_id: JobId },
}

impl EngineEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            EngineEvent::JobCreated { job_id, .. }
            | EngineEvent::JobSucceeded { job_id }
            | EngineEvent::JobRetryScheduled { job_id, .. }
            | EngineEvent::JobExhausted { job_id } => *job_id,
        }
    }
}
