//! Tracing initialization.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the process.
///
/// Filter directives come from `RUST_LOG`, defaulting to `info`. Safe to
/// call multiple times; only the first call installs a subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    install(filter);
}

/// Initialize tracing with explicit filter directives, ignoring the
/// environment. Useful in test harnesses that want engine and worker logs
/// unconditionally.
pub fn init_with_filter(directives: &str) {
    install(EnvFilter::new(directives));
}

fn install(filter: EnvFilter) {
    // Structured JSON lines, one per event.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
