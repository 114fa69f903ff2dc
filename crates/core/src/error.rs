//! Engine error model.

use thiserror::Error;

/// Result type used across the engine.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level error.
///
/// Variants map one-to-one onto the propagation rules the command pipeline
/// applies: only `Conflict` is ever retried, and `Execution` never reaches a
/// synchronous caller (the scheduler absorbs it into retry bookkeeping).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed command input (e.g. empty identifier). Detected before any
    /// lookup, never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced entity does not exist. Detected after lookup, before
    /// authorization, never retried.
    #[error("no {kind} found with id '{id}'")]
    NotFound { kind: &'static str, id: String },

    /// A registered checker rejected the operation. The message must not
    /// reveal anything about the target entity beyond what the checker
    /// chose to disclose.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Optimistic locking failure on commit. Retried by the pipeline up to
    /// its configured bound, then surfaced as-is.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A job body raised an error. Contained by the scheduler; `detail`
    /// carries the rendered cause chain.
    #[error("execution failed: {message}")]
    Execution { message: String, detail: String },

    /// Entity store or notification bus failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl EngineError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn execution(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether the pipeline's bounded retry applies to this error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
