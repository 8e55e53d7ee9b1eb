//! Batch coordinator actor.
//!
//! A single task owns the buffers and the deadline timer. Public handles
//! send [`Command`]s over a bounded channel and await a oneshot reply, so
//! appends, forced flushes, shutdown and timer expiry are applied strictly
//! one at a time.
//!
//! `process` runs on a spawned task while the coordinator keeps accepting
//! commands; items accepted meanwhile go to the overflow lane and are
//! replayed when the flush completes. A caller whose append crossed the
//! size threshold is answered once the flush it started has completed and
//! its overflow has been replayed; flushes started by anyone else never
//! hold it.

use std::fmt;
use std::future::pending;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};

use super::buffer::{BufferStore, Placement};
use super::config::BatchConfig;
use super::policy::FlushTrigger;
use super::timer::DeadlineTimer;
use crate::error::CoordinatorError;
use crate::handler::BatchHandler;
use crate::observability::metrics::{record_flush, record_processing_failure, record_rejected};

type Reply = oneshot::Sender<Result<(), CoordinatorError>>;

/// Observable lifecycle state of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Nothing buffered, timer disarmed.
    Idle,
    /// Items buffered, timer armed.
    Buffering,
    /// A `process` call is outstanding.
    Flushing,
    /// Terminal.
    Closed,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Buffering => "buffering",
            Self::Flushing => "flushing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Commands sent to the coordinator task.
enum Command<T> {
    Append { items: Vec<T>, reply: Reply },
    Force { reply: Reply },
    Close { reply: Reply },
    Discard { reply: Reply },
    State { reply: oneshot::Sender<CoordinatorState> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shutdown {
    Graceful,
    Discard,
}

struct InFlight {
    task: JoinHandle<anyhow::Result<()>>,
    trigger: FlushTrigger,
    batch_size: usize,
    started: Instant,
    /// Callers answered when this flush completes
    waiters: Vec<Reply>,
}

/// Handle to a running batch coordinator.
///
/// Cheap to clone; every clone feeds the same coordinator task. When the
/// last handle is dropped without closing, the coordinator closes
/// gracefully and flushes whatever is still buffered.
pub struct Coordinator<T> {
    sender: mpsc::Sender<Command<T>>,
}

impl<T> Clone for Coordinator<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> fmt::Debug for Coordinator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl<T: Send + 'static> Coordinator<T> {
    /// Spawn a coordinator task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<H>(config: BatchConfig, handler: H) -> Result<Self, CoordinatorError>
    where
        H: BatchHandler<T>,
    {
        config.validate()?;

        let (sender, receiver) = mpsc::channel(config.channel_size);
        let actor = Actor {
            config,
            handler: Arc::new(handler),
            store: BufferStore::new(config.limit),
            timer: DeadlineTimer::new(config.duration),
            receiver,
            receiver_open: true,
            in_flight: None,
            force_waiters: Vec::new(),
            close_waiters: Vec::new(),
            shutdown: None,
            closed: false,
        };

        tracing::info!(
            limit = config.limit,
            duration_ms = u64::try_from(config.duration.as_millis()).unwrap_or(u64::MAX),
            policy = %config.policy,
            "Batch coordinator started"
        );
        tokio::spawn(actor.run());

        Ok(Self { sender })
    }

    /// Append a single item.
    ///
    /// Waits only if this item completes a batch, until that flush is done.
    pub async fn append(&self, item: T) -> Result<(), CoordinatorError> {
        self.append_many(std::iter::once(item)).await
    }

    /// Append items in order, as if each were appended on its own.
    ///
    /// Reaching the limit mid-list starts a flush before the remaining items
    /// are handled; those land in the overflow lane and are replayed into
    /// the next batch.
    pub async fn append_many<I>(&self, items: I) -> Result<(), CoordinatorError>
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().collect();
        self.request(|reply| Command::Append { items, reply }).await
    }

    /// Flush the current batch now, regardless of size or deadline.
    ///
    /// Resolves once the flush has completed. A no-op on an empty batch.
    pub async fn force_process(&self) -> Result<(), CoordinatorError> {
        self.request(|reply| Command::Force { reply }).await
    }

    /// Disarm the timer, flush what is buffered and close.
    ///
    /// Closing an already closed coordinator succeeds.
    pub async fn close(&self) -> Result<(), CoordinatorError> {
        match self.request(|reply| Command::Close { reply }).await {
            Ok(()) | Err(CoordinatorError::Closed) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Disarm the timer and close, dropping everything still buffered.
    ///
    /// A `process` call already in flight is allowed to finish.
    pub async fn close_and_discard_remaining(&self) -> Result<(), CoordinatorError> {
        match self.request(|reply| Command::Discard { reply }).await {
            Ok(()) | Err(CoordinatorError::Closed) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Snapshot of the coordinator's lifecycle state.
    pub async fn state(&self) -> CoordinatorState {
        let (reply, rx) = oneshot::channel();
        if self.sender.send(Command::State { reply }).await.is_err() {
            return CoordinatorState::Closed;
        }
        rx.await.unwrap_or(CoordinatorState::Closed)
    }

    async fn request<F>(&self, make: F) -> Result<(), CoordinatorError>
    where
        F: FnOnce(Reply) -> Command<T>,
    {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(make(reply))
            .await
            .map_err(|_| CoordinatorError::Closed)?;
        rx.await.map_err(|_| CoordinatorError::Closed)?
    }
}

struct Actor<T, H> {
    config: BatchConfig,
    handler: Arc<H>,
    store: BufferStore<T>,
    timer: DeadlineTimer,
    receiver: mpsc::Receiver<Command<T>>,
    receiver_open: bool,
    in_flight: Option<InFlight>,
    /// Forced flushes queued behind the in-flight one
    force_waiters: Vec<Reply>,
    close_waiters: Vec<Reply>,
    shutdown: Option<Shutdown>,
    closed: bool,
}

impl<T, H> Actor<T, H>
where
    T: Send + 'static,
    H: BatchHandler<T>,
{
    async fn run(mut self) {
        while !self.closed {
            tokio::select! {
                biased;

                joined = wait_in_flight(&mut self.in_flight) => self.on_flush_complete(joined),
                () = self.timer.fired() => self.on_deadline(),
                command = self.receiver.recv(), if self.receiver_open => match command {
                    Some(command) => self.on_command(command),
                    None => self.on_handles_dropped(),
                },
            }
        }

        // Anything still queued behind the close sees its reply dropped,
        // which the handle reports as `Closed`.
        self.receiver.close();
    }

    fn on_command(&mut self, command: Command<T>) {
        match command {
            Command::Append { items, reply } => self.on_append(items, reply),
            Command::Force { reply } => self.on_force(reply),
            Command::Close { reply } => {
                self.close_waiters.push(reply);
                self.begin_close();
            }
            Command::Discard { reply } => {
                self.close_waiters.push(reply);
                self.begin_discard();
            }
            Command::State { reply } => {
                let _ = reply.send(self.state());
            }
        }
    }

    fn state(&self) -> CoordinatorState {
        if self.shutdown.is_some() {
            CoordinatorState::Closed
        } else if self.store.is_flushing() {
            CoordinatorState::Flushing
        } else if self.store.is_empty() {
            CoordinatorState::Idle
        } else {
            CoordinatorState::Buffering
        }
    }

    fn on_append(&mut self, items: Vec<T>, reply: Reply) {
        if self.shutdown.is_some() {
            let _ = reply.send(Err(CoordinatorError::Closed));
            return;
        }

        let mut triggered = false;
        for item in items {
            triggered |= self.accept(item);
        }

        // A flush can only complete between commands, so the one this
        // append started is still the in-flight one.
        if triggered {
            self.wait_on_in_flight(reply);
        } else {
            let _ = reply.send(Ok(()));
        }
    }

    fn wait_on_in_flight(&mut self, reply: Reply) {
        match self.in_flight.as_mut() {
            Some(flight) => flight.waiters.push(reply),
            None => {
                let _ = reply.send(Ok(()));
            }
        }
    }

    /// Validate and place one item. Returns true if it started a flush.
    fn accept(&mut self, item: T) -> bool {
        if !self.handler.validate_before_add(&item) {
            tracing::trace!("Item rejected by validator");
            record_rejected();
            return false;
        }

        match self.store.push(item) {
            Placement::Overflowed => return false,
            Placement::Started => self.timer.arm(),
            Placement::Appended => {
                if self.config.policy.rearms_on_append() {
                    self.timer.arm();
                }
            }
        }

        if self.store.is_full() {
            self.start_flush(FlushTrigger::Size)
        } else {
            false
        }
    }

    fn on_force(&mut self, reply: Reply) {
        if self.shutdown.is_some() {
            let _ = reply.send(Err(CoordinatorError::Closed));
            return;
        }

        if self.store.is_flushing() {
            // Flush whatever the overflow replay leaves behind
            self.force_waiters.push(reply);
        } else if self.start_flush(FlushTrigger::Force) {
            self.wait_on_in_flight(reply);
        } else {
            let _ = reply.send(Ok(()));
        }
    }

    fn on_deadline(&mut self) {
        tracing::debug!(
            batch_size = self.store.len(),
            policy = %self.config.policy,
            "Batch deadline fired"
        );
        self.start_flush(FlushTrigger::Deadline);
    }

    fn on_handles_dropped(&mut self) {
        self.receiver_open = false;
        if self.shutdown.is_none() {
            tracing::debug!("All coordinator handles dropped, closing");
            self.begin_close();
        }
    }

    fn begin_close(&mut self) {
        if self.shutdown.is_some() {
            return;
        }
        self.timer.cancel();
        self.shutdown = Some(Shutdown::Graceful);

        if self.store.is_flushing() {
            // Final flush runs once the in-flight one completes
            return;
        }
        if !self.start_flush(FlushTrigger::Close) {
            self.finish_close();
        }
    }

    fn begin_discard(&mut self) {
        self.timer.cancel();
        self.shutdown = Some(Shutdown::Discard);
        release(&mut self.force_waiters);

        let dropped = self.store.discard();
        if dropped > 0 {
            tracing::info!(dropped, "Discarding buffered items on close");
        }
        if self.in_flight.is_none() {
            self.finish_close();
        }
    }

    /// Hand the primary batch to the processor. Returns false if there was
    /// nothing to flush.
    fn start_flush(&mut self, trigger: FlushTrigger) -> bool {
        self.timer.cancel();
        let Some(batch) = self.store.begin_flush() else {
            return false;
        };

        let batch_size = batch.len();
        tracing::debug!(trigger = %trigger, batch_size, "Flushing batch");

        let handler = Arc::clone(&self.handler);
        let task = tokio::spawn(async move { handler.process(batch).await });
        self.in_flight = Some(InFlight {
            task,
            trigger,
            batch_size,
            started: Instant::now(),
            waiters: Vec::new(),
        });
        true
    }

    fn on_flush_complete(&mut self, joined: Result<anyhow::Result<()>, JoinError>) {
        let Some(mut flight) = self.in_flight.take() else {
            return;
        };
        let latency = flight.started.elapsed().as_secs_f64();
        record_flush(flight.trigger, flight.batch_size, latency);

        match joined {
            Ok(Ok(())) => {
                tracing::debug!(
                    trigger = %flight.trigger,
                    batch_size = flight.batch_size,
                    latency_ms = latency * 1000.0,
                    "Batch processed"
                );
            }
            Ok(Err(error)) => {
                tracing::warn!(
                    trigger = %flight.trigger,
                    batch_size = flight.batch_size,
                    error = %error,
                    "Batch processing failed, batch dropped"
                );
                record_processing_failure();
                self.handler.handle_processing_error(error);
            }
            Err(join_error) => {
                tracing::error!(
                    trigger = %flight.trigger,
                    batch_size = flight.batch_size,
                    error = %join_error,
                    "Batch processing task panicked, batch dropped"
                );
                record_processing_failure();
                self.handler.handle_processing_error(anyhow::anyhow!(
                    "batch processing task panicked: {join_error}"
                ));
            }
        }

        let overflow = self.store.finish_flush();
        if self.shutdown == Some(Shutdown::Discard) {
            release(&mut flight.waiters);
            self.finish_close();
            return;
        }

        if !overflow.is_empty() {
            tracing::debug!(overflow = overflow.len(), "Replaying overflow into next batch");
        }
        for item in overflow {
            self.accept(item);
        }
        release(&mut flight.waiters);

        if self.store.is_flushing() {
            // Overflow alone reached the limit; that flush serves any
            // queued force, and the final close flush waits for it.
            let forced = std::mem::take(&mut self.force_waiters);
            if let Some(cascade) = self.in_flight.as_mut() {
                cascade.waiters.extend(forced);
            }
            return;
        }

        if !self.force_waiters.is_empty() {
            let mut waiters = std::mem::take(&mut self.force_waiters);
            if self.start_flush(FlushTrigger::Force) {
                if let Some(forced) = self.in_flight.as_mut() {
                    forced.waiters.append(&mut waiters);
                }
                return;
            }
            release(&mut waiters);
        }
        if self.shutdown == Some(Shutdown::Graceful) && !self.start_flush(FlushTrigger::Close) {
            self.finish_close();
        }
    }

    fn finish_close(&mut self) {
        self.closed = true;
        self.timer.cancel();
        release(&mut self.force_waiters);
        release(&mut self.close_waiters);
        tracing::info!(
            policy = %self.config.policy,
            discarded = self.shutdown == Some(Shutdown::Discard),
            "Batch coordinator closed"
        );
    }
}

fn release(waiters: &mut Vec<Reply>) {
    for reply in waiters.drain(..) {
        let _ = reply.send(Ok(()));
    }
}

async fn wait_in_flight(in_flight: &mut Option<InFlight>) -> Result<anyhow::Result<()>, JoinError> {
    match in_flight.as_mut() {
        Some(flight) => (&mut flight.task).await,
        None => pending().await,
    }
}
