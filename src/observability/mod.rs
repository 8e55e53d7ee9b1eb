//! OpenTelemetry observability infrastructure.
//!
//! Provides:
//! - Structured tracing for coordinator lifecycle and flushes
//! - OTLP metrics for batch throughput and failures

pub mod metrics;
pub mod tracing;
