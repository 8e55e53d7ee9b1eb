//! OTLP metrics for the batch coordinator.
//!
//! Key metrics:
//! - weir_batches_flushed_total: Counter for completed flushes, by trigger
//! - weir_items_flushed_total: Counter for items handed to the processor
//! - weir_items_rejected_total: Counter for items dropped by validation
//! - weir_processing_failures_total: Counter for failed batches
//! - weir_flush_latency_seconds: Histogram for processor latency

use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::{ManualReader, SdkMeterProvider};
use std::sync::OnceLock;

use crate::batch::FlushTrigger;

/// Global metrics instance.
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Weir metrics registry.
#[derive(Debug)]
pub struct Metrics {
    /// Number of completed flushes.
    pub batches_flushed: Counter<u64>,
    /// Number of items delivered to the processor.
    pub items_flushed: Counter<u64>,
    /// Number of items rejected before buffering.
    pub items_rejected: Counter<u64>,
    /// Number of batches whose processing failed.
    pub processing_failures: Counter<u64>,
    /// Histogram of processing latency in seconds.
    pub flush_latency: Histogram<f64>,
}

impl Metrics {
    /// Create a new metrics registry from a meter.
    fn new(meter: &Meter) -> Self {
        Self {
            batches_flushed: meter
                .u64_counter("weir_batches_flushed_total")
                .with_description("Total number of flushed batches")
                .with_unit("1")
                .init(),
            items_flushed: meter
                .u64_counter("weir_items_flushed_total")
                .with_description("Total number of items handed to the processor")
                .with_unit("1")
                .init(),
            items_rejected: meter
                .u64_counter("weir_items_rejected_total")
                .with_description("Total number of items rejected by validation")
                .with_unit("1")
                .init(),
            processing_failures: meter
                .u64_counter("weir_processing_failures_total")
                .with_description("Total number of batches whose processing failed")
                .with_unit("1")
                .init(),
            flush_latency: meter
                .f64_histogram("weir_flush_latency_seconds")
                .with_description("Time spent in the batch processor")
                .with_unit("s")
                .init(),
        }
    }
}

fn manual_provider() -> SdkMeterProvider {
    let reader = ManualReader::builder().build();
    SdkMeterProvider::builder().with_reader(reader).build()
}

/// Initialize the metrics system.
///
/// This should be called once at startup. Subsequent calls are ignored.
///
/// # Arguments
///
/// * `otel_endpoint` - Optional OTLP endpoint for metrics export
pub fn init_metrics_with_endpoint(otel_endpoint: Option<&str>) {
    METRICS.get_or_init(|| {
        if let Some(endpoint) = otel_endpoint {
            use opentelemetry_otlp::{Protocol, WithExportConfig};

            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint)
                .with_protocol(Protocol::Grpc);

            match opentelemetry_otlp::new_pipeline()
                .metrics(opentelemetry_sdk::runtime::Tokio)
                .with_exporter(exporter)
                .with_period(std::time::Duration::from_secs(10))
                .build()
            {
                Ok(provider) => {
                    global::set_meter_provider(provider);
                    tracing::info!(endpoint, "OTLP metrics exporter configured");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to create OTLP exporter, using no-op metrics");
                    global::set_meter_provider(manual_provider());
                }
            }
        } else {
            // Metrics are recorded but not exported
            global::set_meter_provider(manual_provider());
        }

        let meter = global::meter("weir");
        Metrics::new(&meter)
    });
}

/// Initialize the metrics system without OTLP export.
pub fn init_metrics() {
    init_metrics_with_endpoint(None);
}

/// Get the global metrics instance, if initialized.
pub fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

/// Record a completed flush, successful or not.
pub fn record_flush(trigger: FlushTrigger, batch_size: usize, latency_seconds: f64) {
    if let Some(m) = METRICS.get() {
        let attrs = [KeyValue::new("trigger", trigger.as_str())];
        m.batches_flushed.add(1, &attrs);
        m.items_flushed.add(batch_size as u64, &attrs);
        m.flush_latency.record(latency_seconds, &attrs);
    }
}

/// Record an item dropped by validation.
pub fn record_rejected() {
    if let Some(m) = METRICS.get() {
        m.items_rejected.add(1, &[]);
    }
}

/// Record a failed batch.
pub fn record_processing_failure() {
    if let Some(m) = METRICS.get() {
        m.processing_failures.add(1, &[]);
    }
}
