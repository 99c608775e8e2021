use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::constants::TOAST_DURATION_MS;

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub expires_at: Instant,
}

/// Short-lived notices shown in a corner of the screen.
///
/// Queued toasts display one at a time, oldest first, each for a fixed
/// interval. Nothing blocks on a toast; expiry happens lazily whenever the
/// queue is consulted.
#[derive(Debug, Default)]
pub struct ToastQueue {
    entries: VecDeque<Toast>,
}

impl ToastQueue {
    pub fn new() -> ToastQueue {
        ToastQueue {
            entries: VecDeque::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.entries.push_back(Toast {
            message: message.into(),
            expires_at: Instant::now() + Duration::from_millis(TOAST_DURATION_MS),
        });
    }

    /// The toast to display right now, dropping any that expired.
    pub fn current(&mut self) -> Option<&Toast> {
        let now = Instant::now();
        while matches!(self.entries.front(), Some(toast) if toast.expires_at <= now) {
            self.entries.pop_front();
        }
        self.entries.front()
    }

    /// Drops the visible toast early.
    pub fn dismiss(&mut self) {
        self.entries.pop_front();
    }

    /// Most recently queued message, shown or not.
    pub fn latest(&self) -> Option<&str> {
        self.entries.back().map(|toast| toast.message.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
