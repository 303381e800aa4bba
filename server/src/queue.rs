//! FIFO handoff of accepted connections from the listener to the worker pool
//!
//! The queue is the single producer/consumer boundary in the server: the
//! accept loop pushes, any number of workers block on `dequeue`. Ordering is
//! first-in-first-out across connections; which worker wins a dequeue is
//! unspecified. The queue is unbounded, so a slow pool grows the backlog
//! instead of stalling the accept loop.

use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};

use crate::connection::Connection;

/// Thread-safe FIFO of pending connections.
///
/// The deque is only touched under the internal lock. `available` carries the
/// empty-to-non-empty transition to blocked consumers; waiters always
/// re-check the deque after waking, so spurious wakeups and lost races
/// against other consumers are harmless.
#[derive(Debug, Default)]
pub struct ConnectionQueue {
    pending: Mutex<VecDeque<Connection>>,
    available: Notify,
}

impl ConnectionQueue {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            available: Notify::new(),
        }
    }

    /// Appends a connection to the tail and wakes one waiting consumer.
    ///
    /// Never blocks beyond the short internal lock; the queue has no
    /// capacity limit.
    pub async fn enqueue(&self, conn: Connection) {
        {
            let mut pending = self.pending.lock().await;
            pending.push_back(conn);
        }
        self.available.notify_one();
    }

    /// Removes and returns the head, blocking while the queue is empty.
    ///
    /// Never returns a sentinel: with no producer left this waits forever.
    /// A consumer that leaves items behind re-signals, so one notification
    /// per enqueue cannot strand queued connections behind a sleeping
    /// waiter.
    pub async fn dequeue(&self) -> Connection {
        loop {
            {
                let mut pending = self.pending.lock().await;
                if let Some(conn) = pending.pop_front() {
                    if !pending.is_empty() {
                        self.available.notify_one();
                    }
                    return conn;
                }
            }
            self.available.notified().await;
        }
    }

    /// Number of connections waiting to be dispatched.
    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}
