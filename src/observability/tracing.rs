//! Log output for the `weir` demo binary and test suites.
//!
//! Coordinator events (flush start and completion, rejections, overflow
//! replay, shutdown) are emitted under the `weir` target, which stays at
//! `debug` unless `RUST_LOG` says otherwise.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber for the demo.
///
/// `RUST_LOG` wins when set. Otherwise the filter is `<log_level>,weir=debug`,
/// so dependencies log at `log_level` while coordinator events keep their
/// `batch_size` / `trigger` / `overflow` fields visible. Lines carry target,
/// thread id and source location.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{log_level},weir=debug")))
        .unwrap_or_else(|_| EnvFilter::new("info,weir=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    tracing::info!(log_level, "Tracing initialized");
}

/// Error-only subscriber routed through the test writer; safe to call from
/// every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}
