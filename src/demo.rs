//! Demo producer and handler driven by the `weir` binary.
//!
//! The handler rejects every event whose index is a multiple of five,
//! prints each accepted batch as JSON and then simulates slow downstream
//! work. The pump appends numbered events with a random pause between them.

use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;

use crate::batch::Coordinator;
use crate::error::CoordinatorError;
use crate::handler::BatchHandler;

/// A numbered demo event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoEvent {
    pub message: String,
    pub index: u64,
}

impl DemoEvent {
    pub fn new(index: u64) -> Self {
        Self {
            message: format!("This is new string with index {index}"),
            index,
        }
    }
}

/// Handler that prints batches to stdout.
#[derive(Debug, Clone)]
pub struct DemoHandler {
    process_delay: Duration,
}

impl DemoHandler {
    pub fn new(process_delay: Duration) -> Self {
        Self { process_delay }
    }
}

#[async_trait]
impl BatchHandler<DemoEvent> for DemoHandler {
    fn validate_before_add(&self, item: &DemoEvent) -> bool {
        item.index % 5 != 0
    }

    async fn process(&self, batch: Vec<DemoEvent>) -> anyhow::Result<()> {
        let rendered = serde_json::to_string(&batch)?;
        println!("processing batch of {}: {rendered}", batch.len());
        tokio::time::sleep(self.process_delay).await;
        Ok(())
    }

    fn handle_processing_error(&self, error: anyhow::Error) {
        tracing::error!(error = %error, "Demo batch could not be processed");
    }
}

/// Append `count` numbered events, pausing up to `max_jitter` between them.
///
/// Stops early when `shutdown` flips to true. Returns how many events were
/// appended.
pub async fn pump(
    coordinator: Coordinator<DemoEvent>,
    count: u64,
    max_jitter: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<u64, CoordinatorError> {
    let max_jitter_us = u64::try_from(max_jitter.as_micros()).unwrap_or(u64::MAX);
    let mut sent = 0;

    for index in 1..=count {
        if *shutdown.borrow() {
            break;
        }
        coordinator.append(DemoEvent::new(index)).await?;
        sent += 1;

        let pause = if max_jitter_us == 0 {
            Duration::ZERO
        } else {
            Duration::from_micros(rand::thread_rng().gen_range(0..max_jitter_us))
        };
        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            _ = shutdown.changed() => {}
        }
    }

    tracing::info!(sent, "Demo producer finished");
    Ok(sent)
}
