//! Bounded buffer correlating replies to waiting callers.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{Instant, timeout_at};
use tracing::debug;

use crate::error::{DriverError, Result};
use crate::packet::Packet;

/// Received non-event packets awaiting consumption.
///
/// Bounded: when full, the oldest entry is evicted in favor of newer
/// arrivals, so a caller whose reply is pushed out times out instead of
/// receiving a stale match. The lock is never held across an await.
pub(crate) struct InboundBuffer {
    capacity: usize,
    queue: Mutex<VecDeque<Packet>>,
    arrival: Notify,
    closed: AtomicBool,
}

impl InboundBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            arrival: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Append a reply, evicting the oldest entry at capacity, and wake waiters.
    pub(crate) fn push(&self, packet: Packet) {
        {
            let mut queue = self.queue.lock().expect("inbound queue lock poisoned");
            if queue.len() == self.capacity {
                if let Some(evicted) = queue.pop_front() {
                    debug!("inbound buffer full, evicting reply {:#04X}", evicted.command());
                }
            }
            queue.push_back(packet);
        }
        self.arrival.notify_waiters();
    }

    /// Remove and return the first buffered packet satisfying `matches`.
    pub(crate) fn take_match(&self, matches: impl Fn(&Packet) -> bool) -> Option<Packet> {
        let mut queue = self.queue.lock().expect("inbound queue lock poisoned");
        let index = queue.iter().position(matches)?;
        queue.remove(index)
    }

    /// Block until a matching packet arrives or `window` elapses.
    ///
    /// The deadline is fixed at entry: wakeups from non-matching arrivals
    /// re-scan but never extend the wait.
    pub(crate) async fn wait_match<F>(&self, matches: F, window: Duration) -> Result<Packet>
    where
        F: Fn(&Packet) -> bool,
    {
        let deadline = Instant::now() + window;
        loop {
            // Register for the arrival signal before scanning so a push
            // between scan and await cannot be missed.
            let notified = self.arrival.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(packet) = self.take_match(&matches) {
                return Ok(packet);
            }
            if self.is_closed() {
                return Err(DriverError::Closed);
            }

            if timeout_at(deadline, notified).await.is_err() {
                // Deadline reached; one last scan in case a match raced the timer
                return self
                    .take_match(&matches)
                    .ok_or_else(|| DriverError::timeout(format!("No matching reply within {window:?}")));
            }
        }
    }

    /// Mark the buffer closed and wake every waiter with `Closed`.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.arrival.notify_waiters();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.queue.lock().expect("inbound queue lock poisoned").len()
    }
}
