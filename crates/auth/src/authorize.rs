//! Pure authorization decisions.

use std::collections::HashSet;

use thiserror::Error;

use flowforge_core::TenantId;

use crate::{Permission, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("principal is not a member of the target tenant")]
    TenantMismatch,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal against a required permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let perms: HashSet<&str> = principal.permissions.iter().map(|p| p.as_str()).collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Check that a principal may act on resources belonging to a tenant.
pub fn check_tenant(principal: &Principal, tenant_id: TenantId) -> Result<(), AuthzError> {
    if principal.is_member_of(tenant_id) {
        Ok(())
    } else {
        Err(AuthzError::TenantMismatch)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrincipalId;

    fn principal() -> Principal {
        Principal::new(PrincipalId::new())
    }

    #[test]
    fn explicit_permission_grants() {
        let p = principal().with_permission(Permission::JOB_UPDATE);
        assert!(authorize(&p, &Permission::JOB_UPDATE).is_ok());
    }

    #[test]
    fn wildcard_grants_everything() {
        let p = principal().with_permission(Permission::WILDCARD);
        assert!(authorize(&p, &Permission::JOB_DELETE).is_ok());
        assert!(authorize(&p, &Permission::new("deployment.create")).is_ok());
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let p = principal().with_permission(Permission::JOB_READ);
        let err = authorize(&p, &Permission::JOB_UPDATE).unwrap_err();
        assert_eq!(err, AuthzError::Forbidden("job.update".to_string()));
    }

    #[test]
    fn tenant_membership_is_checked() {
        let home = TenantId::new();
        let other = TenantId::new();
        let p = principal().with_tenant(home);

        assert!(check_tenant(&p, home).is_ok());
        assert_eq!(check_tenant(&p, other).unwrap_err(), AuthzError::TenantMismatch);
    }
}
