// SPDX-License-Identifier: GPL-3.0-only

//! Bounded work queue between capture and recognition
//!
//! Fixed-capacity FIFO with drop-oldest backpressure: offering to a full
//! queue evicts the oldest entry instead of blocking or rejecting, so the
//! capture path never stalls and the worker always sees the freshest
//! backlog. Single producer, single consumer; eviction is the only way an
//! item leaves out of order.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Fixed-capacity drop-oldest queue
pub struct BoundedQueue<T> {
    inner: Mutex<VecDeque<T>>,
    available: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items (must be non-zero)
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be non-zero");
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Condvar::new(),
            capacity,
        }
    }

    /// Offer an item without blocking. If the queue is full, the oldest
    /// item is evicted to make room. Returns true when an eviction
    /// happened.
    pub fn offer(&self, item: T) -> bool {
        let mut queue = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let evicted = if queue.len() == self.capacity {
            queue.pop_front();
            true
        } else {
            false
        };

        queue.push_back(item);
        self.available.notify_one();
        evicted
    }

    /// Take the oldest item, blocking up to `timeout`. Returns `None` on
    /// timeout so the caller can check its stop flag and retry.
    pub fn take(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut queue = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        loop {
            if let Some(item) = queue.pop_front() {
                return Some(item);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            let (guard, result) = match self.available.wait_timeout(queue, remaining) {
                Ok(pair) => pair,
                Err(poisoned) => {
                    let pair = poisoned.into_inner();
                    (pair.0, pair.1)
                }
            };
            queue = guard;
            if result.timed_out() && queue.is_empty() {
                return None;
            }
        }
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .map(|queue| queue.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
