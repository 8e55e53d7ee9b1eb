//! Weir demo: feeds numbered events through a batch coordinator.
//!
//! # Usage
//!
//! ```bash
//! weir --limit 10 --duration-ms 10000 --policy last-item
//! ```
//!
//! Environment variables can also be used:
//! - `WEIR_LIMIT`: Batch size threshold
//! - `WEIR_DURATION_MS`: Deadline window
//! - `WEIR_POLICY`: `first-item` or `last-item`
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use std::time::Duration;
use tokio::sync::watch;
use weir::config::Config;
use weir::demo::{pump, DemoHandler};
use weir::observability::metrics::init_metrics_with_endpoint;
use weir::observability::tracing::init_tracing;
use weir::Coordinator;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
  Weir v{} - batch-and-timeout coordinator demo

  Configuration:
    Limit:      {}
    Duration:   {}ms
    Policy:     {}
    Events:     {}
    Log Level:  {}

  Press Ctrl+C to abort.
"#,
        version,
        config.limit,
        config.duration_ms,
        config.policy,
        config.count,
        config.log_level
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse_args();

    init_tracing(&config.log_level);
    init_metrics_with_endpoint(config.otel_endpoint.as_deref());

    let batch_config = config.batch_config();
    batch_config.validate()?;

    print_banner(&config);

    let coordinator = Coordinator::spawn(
        batch_config,
        DemoHandler::new(Duration::from_millis(config.process_delay_ms)),
    )?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn signal handler task
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating shutdown...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.expect("failed to listen for ctrl+c");
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }

        let _ = shutdown_tx.send(true);
    });

    let sent = pump(
        coordinator.clone(),
        config.count,
        Duration::from_micros(config.max_jitter_us),
        shutdown_rx,
    )
    .await?;

    // Flush whatever the last partial batch holds
    tracing::info!(sent, "Closing coordinator");
    coordinator.close().await?;

    tracing::info!("Weir shutdown complete");
    Ok(())
}
