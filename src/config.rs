//! Configuration parsing for the weir demo binary.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Sensible defaults for quick start

use clap::Parser;

use crate::batch::{BatchConfig, Policy};

/// Weir: a batch-and-timeout buffering coordinator demo.
#[derive(Parser, Debug, Clone)]
#[command(name = "weir")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Number of buffered events that triggers an immediate flush
    #[arg(short, long, env = "WEIR_LIMIT", default_value_t = 10)]
    pub limit: usize,

    /// Flush deadline window in milliseconds
    #[arg(short, long, env = "WEIR_DURATION_MS", default_value_t = 10_000)]
    pub duration_ms: u64,

    /// Deadline policy (first-item, last-item)
    #[arg(short, long, env = "WEIR_POLICY", value_enum, default_value_t = Policy::LastItem)]
    pub policy: Policy,

    /// Number of events the demo producer emits
    #[arg(short, long, env = "WEIR_COUNT", default_value_t = 999)]
    pub count: u64,

    /// Upper bound of the random pause between events, in microseconds
    #[arg(long, env = "WEIR_MAX_JITTER_US", default_value_t = 1000)]
    pub max_jitter_us: u64,

    /// Simulated processing time per batch, in milliseconds
    #[arg(long, env = "WEIR_PROCESS_DELAY_MS", default_value_t = 1000)]
    pub process_delay_ms: u64,

    /// Size of the coordinator command channel
    #[arg(long, env = "WEIR_CHANNEL_SIZE", default_value_t = 1024)]
    pub channel_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// OpenTelemetry collector endpoint for metrics export (optional)
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otel_endpoint: Option<String>,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Coordinator settings derived from the CLI values.
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            channel_size: self.channel_size,
            ..BatchConfig::from_config(self.limit, self.duration_ms, self.policy)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limit: 10,
            duration_ms: 10_000,
            policy: Policy::LastItem,
            count: 999,
            max_jitter_us: 1000,
            process_delay_ms: 1000,
            channel_size: 1024,
            log_level: "info".into(),
            otel_endpoint: None,
        }
    }
}
