//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// Emits JSON lines with timestamps. The filter defaults to `info` and is
/// overridable per-target through `RUST_LOG` (e.g.
/// `RUST_LOG=pressroom_scheduler=debug`). Safe to call multiple times
/// (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Flattened JSON so log pipelines can filter on event fields directly
    // (content_id, attempt, ...) without unwrapping a nested object.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
