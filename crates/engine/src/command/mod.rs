//! Uniform command pipeline: every engine operation is a command executed
//! through one session-per-attempt, flush-then-publish path.
//!
//! ## Components
//!
//! - `Command`: One engine operation with a typed output
//! - `CommandContext`: Per-attempt state (session, caller, notifications)
//! - `CommandExecutor`: The pipeline itself, with bounded conflict retry

pub mod context;
pub mod executor;

pub use context::CommandContext;
pub use executor::{Command, CommandExecutor, NotificationBus};
