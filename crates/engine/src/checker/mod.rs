//! Pluggable authorization for commands.
//!
//! Checkers run inside a command, after the target entity has been loaded
//! and before any mutation, so a missing entity always surfaces as not-found
//! rather than forbidden. Each capability has its own hook with a permissive
//! default; a checker implements only the hooks its policy cares about. The
//! context consults every registered checker in registration order and the
//! first rejection wins.

use flowforge_auth::{AuthzError, Principal};
use flowforge_core::{EngineError, EngineResult};

use crate::jobs::entity::Job;

pub mod permission;
pub mod tenant;

pub use permission::PermissionChecker;
pub use tenant::TenantIsolationChecker;

/// Capability hooks consulted before job state is read or changed.
///
/// Hooks see the job as it was loaded, before the command mutates it.
pub trait CommandChecker: Send + Sync {
    fn check_read_job(&self, _principal: &Principal, _job: &Job) -> EngineResult<()> {
        Ok(())
    }

    fn check_create_job(&self, _principal: &Principal, _job: &Job) -> EngineResult<()> {
        Ok(())
    }

    fn check_update_job(&self, _principal: &Principal, _job: &Job) -> EngineResult<()> {
        Ok(())
    }

    fn check_delete_job(&self, _principal: &Principal, _job: &Job) -> EngineResult<()> {
        Ok(())
    }
}

pub(crate) fn forbid(err: AuthzError) -> EngineError {
    EngineError::forbidden(err.to_string())
}
