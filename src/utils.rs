//! Utility functions shared by the binaries.
//!

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// Logs at `info` unless `RUST_LOG` says otherwise. Calling it again is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}
