use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "job.update").
/// A special wildcard permission `"*"` can be used by policy layers to indicate
/// "allow all" without hardcoding every capability into the identity source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Grants every permission.
    pub const WILDCARD: Self = Self(Cow::Borrowed("*"));

    pub const JOB_READ: Self = Self(Cow::Borrowed("job.read"));
    pub const JOB_CREATE: Self = Self(Cow::Borrowed("job.create"));
    pub const JOB_UPDATE: Self = Self(Cow::Borrowed("job.update"));
    pub const JOB_DELETE: Self = Self(Cow::Borrowed("job.delete"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
