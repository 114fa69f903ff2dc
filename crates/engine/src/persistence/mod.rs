//! Entity persistence: the store abstraction and the session cache on top.
//!
//! ## Design
//!
//! - All writes are batched per session and committed atomically
//! - Every row carries a revision; commits check it (optimistic locking)
//! - Reads within a session see that session's pending writes
//! - Dropping a session without flushing is a rollback
//!
//! ## Components
//!
//! - `EntityStore`: Storage abstraction (in-memory or durable)
//! - `InMemoryEntityStore`: Reference store for tests/dev and embedding
//! - `EntitySession`: Unit-of-work cache, one per command attempt

pub mod in_memory;
pub mod store;

pub(crate) mod session;

pub use in_memory::InMemoryEntityStore;
pub use store::{EntityStore, StoreError, WriteOp};
