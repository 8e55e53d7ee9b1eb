//! Test utilities shared by the coordinator integration tests.
//!
//! Provides:
//! - A recording handler with configurable validation, failures and delay
//! - Item fixtures
//! - A polling `wait_for` helper

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use weir::BatchHandler;

/// Handler that records every batch it is asked to process.
///
/// Clones share the same recorded state, so a test keeps one clone and
/// hands the other to the coordinator.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    batches: Arc<Mutex<Vec<Vec<String>>>>,
    errors: Arc<Mutex<Vec<String>>>,
    error_calls: Arc<AtomicUsize>,
    reject_prefix: Option<&'static str>,
    fail_prefix: Option<&'static str>,
    panic_prefix: Option<&'static str>,
    delay: Duration,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop items starting with `prefix` at validation.
    pub fn rejecting(mut self, prefix: &'static str) -> Self {
        self.reject_prefix = Some(prefix);
        self
    }

    /// Fail any batch containing an item starting with `prefix`.
    pub fn failing_on(mut self, prefix: &'static str) -> Self {
        self.fail_prefix = Some(prefix);
        self
    }

    /// Panic on any batch containing an item starting with `prefix`.
    pub fn panicking_on(mut self, prefix: &'static str) -> Self {
        self.panic_prefix = Some(prefix);
        self
    }

    /// Sleep this long inside `process` after recording the batch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn delivered(&self) -> usize {
        self.batches.lock().unwrap().iter().map(Vec::len).sum()
    }

    pub fn error_count(&self) -> usize {
        self.error_calls.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

fn any_starts_with(batch: &[String], prefix: Option<&str>) -> bool {
    prefix.is_some_and(|p| batch.iter().any(|item| item.starts_with(p)))
}

#[async_trait]
impl BatchHandler<String> for RecordingHandler {
    fn validate_before_add(&self, item: &String) -> bool {
        self.reject_prefix.map_or(true, |p| !item.starts_with(p))
    }

    async fn process(&self, batch: Vec<String>) -> anyhow::Result<()> {
        let fail = any_starts_with(&batch, self.fail_prefix);
        let panic = any_starts_with(&batch, self.panic_prefix);
        self.batches.lock().unwrap().push(batch);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if panic {
            panic!("handler asked to panic");
        }
        if fail {
            anyhow::bail!("batch contains a non-conforming item");
        }
        Ok(())
    }

    fn handle_processing_error(&self, error: anyhow::Error) {
        self.error_calls.fetch_add(1, Ordering::SeqCst);
        self.errors.lock().unwrap().push(error.to_string());
    }
}

/// Items `a_1..=a_n`.
pub fn items(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("a_{i}")).collect()
}

/// Wait for a condition to become true with timeout.
///
/// # Returns
///
/// `true` if condition was met, `false` if timeout expired
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_fixture() {
        assert_eq!(items(3), vec!["a_1", "a_2", "a_3"]);
    }
}
