//! Trailing-edge batching for effects that arrive in bursts.

use std::time::Duration;

use tokio::time::Instant;

/// Collects items and releases them once no new item has arrived for
/// `delay`.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Vec<T>,
    deadline: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Vec::new(),
            deadline: None,
        }
    }

    pub fn push(&mut self, items: impl IntoIterator<Item = T>, now: Instant) {
        let before = self.pending.len();
        self.pending.extend(items);
        if self.pending.len() > before {
            self.deadline = Some(now + self.delay);
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The batch, if its quiet period has elapsed by `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<Vec<T>> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.take(),
            _ => None,
        }
    }

    /// The batch regardless of timing.
    pub fn take(&mut self) -> Option<Vec<T>> {
        self.deadline = None;
        if self.pending.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending))
    }
}
