//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events; binaries and tests choose where
//! they go. Both initializers are safe to call more than once.

use tracing_subscriber::EnvFilter;

/// Target used for audit entries written by `TracingAuditSink`
pub const AUDIT_TARGET: &str = "sitetree::audit";

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

/// Install a subscriber that writes through the test harness capture
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
