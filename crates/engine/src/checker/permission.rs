//! Permission-based access control.

use flowforge_auth::{authorize, Permission, Principal};
use flowforge_core::EngineResult;

use super::{forbid, CommandChecker};
use crate::jobs::entity::Job;

/// Requires the `job.*` permission matching the capability being exercised.
///
/// The wildcard permission grants everything; see
/// [`Permission::WILDCARD`].
#[derive(Debug, Default)]
pub struct PermissionChecker;

impl PermissionChecker {
    pub fn new() -> Self {
        Self
    }
}

impl CommandChecker for PermissionChecker {
    fn check_read_job(&self, principal: &Principal, _job: &Job) -> EngineResult<()> {
        authorize(principal, &Permission::JOB_READ).map_err(forbid)
    }

    fn check_create_job(&self, principal: &Principal, _job: &Job) -> EngineResult<()> {
        authorize(principal, &Permission::JOB_CREATE).map_err(forbid)
    }

    fn check_update_job(&self, principal: &Principal, _job: &Job) -> EngineResult<()> {
        authorize(principal, &Permission::JOB_UPDATE).map_err(forbid)
    }

    fn check_delete_job(&self, principal: &Principal, _job: &Job) -> EngineResult<()> {
        authorize(principal, &Permission::JOB_DELETE).map_err(forbid)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use flowforge_auth::PrincipalId;
    use flowforge_core::EngineError;

    fn job() -> Job {
        Job::new("noop", serde_json::json!({}))
    }

    #[test]
    fn each_capability_maps_to_its_permission() {
        let checker = PermissionChecker::new();
        let p = Principal::new(PrincipalId::new())
            .with_permission(Permission::JOB_READ)
            .with_permission(Permission::JOB_UPDATE);

        assert!(checker.check_read_job(&p, &job()).is_ok());
        assert!(checker.check_update_job(&p, &job()).is_ok());
        assert!(matches!(
            checker.check_delete_job(&p, &job()).unwrap_err(),
            EngineError::Forbidden(_)
        ));
        assert!(matches!(
            checker.check_create_job(&p, &job()).unwrap_err(),
            EngineError::Forbidden(_)
        ));
    }

    #[test]
    fn wildcard_grants_every_capability() {
        let checker = PermissionChecker::new();
        let p = Principal::new(PrincipalId::new()).with_permission(Permission::WILDCARD);

        assert!(checker.check_read_job(&p, &job()).is_ok());
        assert!(checker.check_create_job(&p, &job()).is_ok());
        assert!(checker.check_update_job(&p, &job()).is_ok());
        assert!(checker.check_delete_job(&p, &job()).is_ok());
    }
}
