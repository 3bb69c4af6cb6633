//! Logging setup for job processes

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber
///
/// Reads the filter from `RUST_LOG`, defaulting to `info` for the lifecycle
/// crates. Safe to call more than once; later calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driver=info,staging=info,storage=info,job_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
