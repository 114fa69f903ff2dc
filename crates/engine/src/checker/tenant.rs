//! Tenant isolation.

use flowforge_auth::{check_tenant, Principal};
use flowforge_core::EngineResult;

use super::{forbid, CommandChecker};
use crate::jobs::entity::Job;

/// Restricts every capability to jobs whose tenant the principal belongs to.
///
/// Jobs without a tenant are shared infrastructure and pass.
#[derive(Debug, Default)]
pub struct TenantIsolationChecker;

impl TenantIsolationChecker {
    pub fn new() -> Self {
        Self
    }

    fn check(&self, principal: &Principal, job: &Job) -> EngineResult<()> {
        match job.tenant_id {
            Some(tenant_id) => check_tenant(principal, tenant_id).map_err(forbid),
            None => Ok(()),
        }
    }
}

impl CommandChecker for TenantIsolationChecker {
    fn check_read_job(&self, principal: &Principal, job: &Job) -> EngineResult<()> {
        self.check(principal, job)
    }

    fn check_create_job(&self, principal: &Principal, job: &Job) -> EngineResult<()> {
        self.check(principal, job)
    }

    fn check_update_job(&self, principal: &Principal, job: &Job) -> EngineResult<()> {
        self.check(principal, job)
    }

    fn check_delete_job(&self, principal: &Principal, job: &Job) -> EngineResult<()> {
        self.check(principal, job)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use flowforge_auth::PrincipalId;
    use flowforge_core::{EngineError, TenantId};

    #[test]
    fn members_may_touch_their_tenants_jobs() {
        let tenant = TenantId::new();
        let principal = Principal::new(PrincipalId::new()).with_tenant(tenant);
        let job = Job::new("noop", serde_json::json!({})).with_tenant(tenant);

        let checker = TenantIsolationChecker::new();
        assert!(checker.check_read_job(&principal, &job).is_ok());
        assert!(checker.check_delete_job(&principal, &job).is_ok());
    }

    #[test]
    fn foreign_tenants_are_rejected() {
        let principal = Principal::new(PrincipalId::new()).with_tenant(TenantId::new());
        let job = Job::new("noop", serde_json::json!({})).with_tenant(TenantId::new());

        let checker = TenantIsolationChecker::new();
        let err = checker.check_update_job(&principal, &job).unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));
    }

    #[test]
    fn tenantless_jobs_are_shared() {
        let principal = Principal::new(PrincipalId::new());
        let job = Job::new("noop", serde_json::json!({}));

        let checker = TenantIsolationChecker::new();
        assert!(checker.check_read_job(&principal, &job).is_ok());
    }
}
