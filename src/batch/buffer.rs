//! Primary and overflow buffers.
//!
//! The primary buffer collects the batch about to be flushed. While a flush
//! is in flight the primary buffer has been handed to the processor, and
//! newly accepted items are parked in the overflow buffer until the flush
//! completes.

/// Result of pushing an item into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// First item of a fresh batch; the deadline must be armed.
    Started,
    /// Added to a batch that already had items.
    Appended,
    /// A flush is in flight; parked in overflow.
    Overflowed,
}

/// Batch accumulator with an overflow lane for in-flight flushes.
#[derive(Debug)]
pub struct BufferStore<T> {
    limit: usize,
    primary: Vec<T>,
    overflow: Vec<T>,
    flushing: bool,
}

impl<T> BufferStore<T> {
    /// Create a new store that considers a batch full at `limit` items.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            primary: Vec::with_capacity(limit),
            overflow: Vec::new(),
            flushing: false,
        }
    }

    /// Add an accepted item, routing it to overflow while flushing.
    pub fn push(&mut self, item: T) -> Placement {
        if self.flushing {
            self.overflow.push(item);
            return Placement::Overflowed;
        }
        let was_empty = self.primary.is_empty();
        self.primary.push(item);
        if was_empty {
            Placement::Started
        } else {
            Placement::Appended
        }
    }

    /// Whether the primary batch has reached the size threshold.
    pub fn is_full(&self) -> bool {
        self.primary.len() >= self.limit
    }

    /// Hand the primary batch to a flush and enter the flushing state.
    ///
    /// Returns `None` (and stays idle) if the batch is empty or a flush is
    /// already in flight.
    pub fn begin_flush(&mut self) -> Option<Vec<T>> {
        if self.flushing || self.primary.is_empty() {
            return None;
        }
        self.flushing = true;
        Some(std::mem::replace(
            &mut self.primary,
            Vec::with_capacity(self.limit),
        ))
    }

    /// Leave the flushing state, returning the overflow for replay.
    pub fn finish_flush(&mut self) -> Vec<T> {
        self.flushing = false;
        std::mem::take(&mut self.overflow)
    }

    /// Drop everything buffered in both lanes, returning how many items
    /// were discarded.
    pub fn discard(&mut self) -> usize {
        let dropped = self.primary.len() + self.overflow.len();
        self.primary.clear();
        self.overflow.clear();
        dropped
    }

    /// True between `begin_flush` and `finish_flush`.
    pub fn is_flushing(&self) -> bool {
        self.flushing
    }

    /// Check if the primary batch is empty.
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    /// Get the current primary batch size.
    pub fn len(&self) -> usize {
        self.primary.len()
    }

    /// Number of items parked while a flush is in flight.
    pub fn overflow_len(&self) -> usize {
        self.overflow.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_threshold() {
        let mut store = BufferStore::new(3);

        assert_eq!(store.push(1), Placement::Started);
        assert_eq!(store.push(2), Placement::Appended);
        assert!(!store.is_full());
        store.push(3);
        assert!(store.is_full());

        let batch = store.begin_flush().unwrap();
        assert_eq!(batch, vec![1, 2, 3]);
        assert!(store.is_empty());
        assert!(store.is_flushing());
    }

    #[test]
    fn test_push_during_flush_goes_to_overflow() {
        let mut store = BufferStore::new(10);
        store.push("a");
        let batch = store.begin_flush().unwrap();
        assert_eq!(batch, vec!["a"]);

        assert_eq!(store.push("b"), Placement::Overflowed);
        assert_eq!(store.push("c"), Placement::Overflowed);
        assert!(store.is_empty());
        assert_eq!(store.overflow_len(), 2);

        let replay = store.finish_flush();
        assert_eq!(replay, vec!["b", "c"]);
        assert!(!store.is_flushing());
        assert_eq!(store.overflow_len(), 0);

        // Replayed items start a fresh batch
        assert_eq!(store.push("b"), Placement::Started);
    }

    #[test]
    fn test_begin_flush_on_empty_is_noop() {
        let mut store: BufferStore<u32> = BufferStore::new(4);
        assert!(store.begin_flush().is_none());
        assert!(!store.is_flushing());
    }

    #[test]
    fn test_no_second_flush_while_in_flight() {
        let mut store = BufferStore::new(1);
        store.push(1);
        assert!(store.begin_flush().is_some());
        store.push(2);
        assert!(store.begin_flush().is_none());
    }

    #[test]
    fn test_discard_clears_both_lanes() {
        let mut store = BufferStore::new(2);
        store.push(1);
        store.push(2);
        store.begin_flush();
        store.push(3);
        store.finish_flush();
        store.push(4);
        store.begin_flush();
        store.push(5);

        assert_eq!(store.discard(), 1);
        assert!(store.is_empty());
        assert_eq!(store.overflow_len(), 0);
    }
}
