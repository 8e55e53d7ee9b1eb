//! Cancellable, restartable single-shot deadline.
//!
//! The timer is owned by the coordinator task and polled from its select
//! loop, so a cancelled arming can never fire later. Firing disarms the
//! timer; it fires at most once per arming.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{sleep_until, Instant, Sleep};

/// Single-shot alarm bound to a fixed duration.
#[derive(Debug)]
pub struct DeadlineTimer {
    duration: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl DeadlineTimer {
    /// Create a disarmed timer that fires `duration` after each arming.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            sleep: None,
        }
    }

    /// Arm the timer to fire `duration` from now.
    ///
    /// Re-arming an armed timer replaces the pending deadline.
    pub fn arm(&mut self) {
        let deadline = Instant::now() + self.duration;
        match self.sleep.as_mut() {
            Some(sleep) => sleep.as_mut().reset(deadline),
            None => self.sleep = Some(Box::pin(sleep_until(deadline))),
        }
    }

    /// Disarm the timer. No-op if it is not armed.
    pub fn cancel(&mut self) {
        self.sleep = None;
    }

    /// Whether an arming is pending.
    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// When the pending arming will fire.
    pub fn deadline(&self) -> Option<Instant> {
        self.sleep.as_ref().map(|sleep| sleep.deadline())
    }

    /// Wait for the armed deadline, then disarm.
    ///
    /// Never resolves while disarmed. Cancel safe: dropping the future
    /// leaves the arming in place.
    pub async fn fired(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => {
                sleep.as_mut().await;
                self.sleep = None;
            }
            None => pending::<()>().await,
        }
    }
}
