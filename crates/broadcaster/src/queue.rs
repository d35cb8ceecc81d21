//! A bounded, drop-oldest-on-overflow queue backing one registered sink.

use crate::event::Event;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;

pub struct SinkQueue {
    inner: Mutex<VecDeque<Event>>,
    capacity: usize,
    notify: Notify,
}

impl SinkQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            notify: Notify::new(),
        }
    }

    /// Pushes `event`, dropping the oldest queued event if full. Returns
    /// `true` when an event was dropped to make room.
    pub fn push(&self, event: Event) -> bool {
        let mut queue = self.inner.lock().expect("sink queue mutex poisoned");
        let dropped = if queue.len() >= self.capacity {
            queue.pop_front();
            true
        } else {
            false
        };
        queue.push_back(event);
        drop(queue);
        self.notify.notify_one();
        dropped
    }

    /// Waits for and returns the next queued event. Cancel-safe: callers
    /// may race this in `tokio::select!` against a shutdown signal.
    pub async fn pop(&self) -> Event {
        loop {
            if let Some(event) = self.inner.lock().expect("sink queue mutex poisoned").pop_front() {
                return event;
            }
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pop_returns_events_in_fifo_order() {
        let queue = SinkQueue::new(4);
        queue.push(Event::error("test", "first"));
        queue.push(Event::error("test", "second"));

        match queue.pop().await {
            Event::Error { message, .. } => assert_eq!(message, "first"),
            _ => panic!("wrong event"),
        }
        match queue.pop().await {
            Event::Error { message, .. } => assert_eq!(message, "second"),
            _ => panic!("wrong event"),
        }
    }

    #[tokio::test]
    async fn push_past_capacity_drops_oldest() {
        let queue = SinkQueue::new(2);
        assert!(!queue.push(Event::error("t", "a")));
        assert!(!queue.push(Event::error("t", "b")));
        assert!(queue.push(Event::error("t", "c"))); // drops "a"

        match queue.pop().await {
            Event::Error { message, .. } => assert_eq!(message, "b"),
            _ => panic!("wrong event"),
        }
        match queue.pop().await {
            Event::Error { message, .. } => assert_eq!(message, "c"),
            _ => panic!("wrong event"),
        }
    }
}
