//! `flowforge-auth` — pure authorization boundary (zero-trust).
//!
//! This crate is intentionally decoupled from transport and storage.

pub mod authorize;
pub mod permissions;
pub mod principal;

pub use authorize::{AuthzError, authorize, check_tenant};
pub use permissions::Permission;
pub use principal::{Principal, PrincipalId};
