//! Principal identity for authorization decisions.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use flowforge_core::TenantId;

use crate::Permission;

/// Identity of an authenticated principal (human user, service account, etc).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for PrincipalId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<PrincipalId> for Uuid {
    fn from(value: PrincipalId) -> Self {
        value.0
    }
}

impl FromStr for PrincipalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A fully resolved principal for authorization decisions.
///
/// The adapter derives tenant memberships and granted permissions from
/// whatever identity source is in use and hands the result to the command
/// pipeline; nothing here talks to storage or transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub principal_id: PrincipalId,

    /// Tenants the principal is a member of.
    pub tenant_ids: Vec<TenantId>,

    /// Permissions granted to the principal.
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn new(principal_id: PrincipalId) -> Self {
        Self {
            principal_id,
            tenant_ids: Vec::new(),
            permissions: Vec::new(),
        }
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_ids.push(tenant_id);
        self
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    pub fn is_member_of(&self, tenant_id: TenantId) -> bool {
        self.tenant_ids.contains(&tenant_id)
    }
}
