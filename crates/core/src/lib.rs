//! `flowforge-core` — engine foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod revision;

pub use error::{EngineError, EngineResult};
pub use id::{ExecutionId, JobId, ProcessDefinitionId, TenantId};
pub use revision::ExpectedRevision;
