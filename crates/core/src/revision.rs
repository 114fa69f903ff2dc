//! Optimistic concurrency primitives.

/// Expectation about an entity's stored revision at write time.
///
/// Every committed update bumps the stored revision, so a stale expectation
/// means another transaction modified the entity in between. The store turns
/// that into a conflict instead of overwriting silently.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedRevision {
    /// Skip revision checking (inserts, forced writes).
    Any,
    /// Require the stored entity to be at an exact revision.
    Exact(u32),
}

impl ExpectedRevision {
    pub fn matches(self, actual: u32) -> bool {
        match self {
            ExpectedRevision::Any => true,
            ExpectedRevision::Exact(rev) => rev == actual,
        }
    }
}
