//! The caller-supplied capability the coordinator drives.

use async_trait::async_trait;

/// Validates, processes and reports on batches of items.
///
/// One handler instance is shared by the coordinator for its whole lifetime.
/// `process` runs on its own task, so implementations must be `Send + Sync`.
#[async_trait]
pub trait BatchHandler<T: Send + 'static>: Send + Sync + 'static {
    /// Decide whether an item may enter the batch.
    ///
    /// Returning `false` drops the item silently. Called on the coordinator
    /// task, so it must not block.
    fn validate_before_add(&self, _item: &T) -> bool {
        true
    }

    /// Consume a full batch.
    ///
    /// The batch is cleared regardless of the outcome; there is no retry.
    async fn process(&self, batch: Vec<T>) -> anyhow::Result<()>;

    /// Observe a failed [`process`](Self::process) call.
    ///
    /// Invoked exactly once per failed batch, including when `process`
    /// panics.
    fn handle_processing_error(&self, error: anyhow::Error) {
        tracing::error!(error = %error, "Batch processing failed");
    }
}
