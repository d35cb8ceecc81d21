//! Fan-out of domain events to registered sinks over bounded, per-sink
//! queues. A slow or stuck sink drops its own oldest queued events rather
//! than stalling the matcher's critical section or any other sink (§4.4).

use crate::event::Event;
use crate::queue::SinkQueue;
use crate::sink::EventSink;
use observability::EngineMetrics;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Default depth of a sink's backlog before the oldest queued event is
/// dropped to make room for a new one.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

struct Registration {
    name: String,
    queue: Arc<SinkQueue>,
    stop: CancellationToken,
}

/// The fan-out hub. Cheap to clone-share via `Arc`; `register` may be
/// called at any point in the process lifetime, including after the
/// engine has started publishing.
pub struct Broadcaster {
    sinks: RwLock<Vec<Registration>>,
    queue_capacity: usize,
    metrics: Option<Arc<EngineMetrics>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_queue_capacity(queue_capacity: usize) -> Self {
        Self {
            sinks: RwLock::new(Vec::new()),
            queue_capacity,
            metrics: None,
        }
    }

    /// Attaches the engine's counters. Optional: a `Broadcaster` with no
    /// metrics attached behaves identically, just uncounted.
    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Registers `sink` and spawns the task that drains its queue. The
    /// returned token can be cancelled by the caller to unregister and
    /// stop the task early; otherwise it runs for the life of the process.
    pub async fn register(&self, sink: Arc<dyn EventSink>) -> CancellationToken {
        let name = sink.name().to_string();
        let queue = Arc::new(SinkQueue::new(self.queue_capacity));
        let stop = CancellationToken::new();

        let task_queue = queue.clone();
        let task_stop = stop.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_stop.cancelled() => break,
                    event = task_queue.pop() => sink.handle(event).await,
                }
            }
        });

        self.sinks.write().await.push(Registration {
            name,
            queue,
            stop: stop.clone(),
        });
        stop
    }

    /// Publishes `event` to every registered sink. Never blocks on a sink;
    /// a full per-sink queue drops its oldest entry and the drop is itself
    /// reported as an `Event::Error` to every sink (best effort — that
    /// notification may itself be dropped under sustained backlog).
    pub async fn publish(&self, event: Event) {
        let sinks = self.sinks.read().await;
        let mut dropped_for: Option<String> = None;
        for reg in sinks.iter() {
            if reg.queue.push(event.clone()) {
                tracing::warn!(sink = %reg.name, "broadcaster dropped oldest event for slow sink");
                if let Some(metrics) = &self.metrics {
                    metrics.broadcast_drop();
                }
                dropped_for = Some(reg.name.clone());
            }
        }
        if let Some(name) = dropped_for {
            let notice = Event::error(
                "broadcaster",
                format!("dropped oldest queued event for sink '{name}'"),
            );
            for reg in sinks.iter() {
                reg.queue.push(notice.clone());
            }
        }
    }

    /// Stops and deregisters every sink. Intended for shutdown.
    pub async fn shutdown(&self) {
        let mut sinks = self.sinks.write().await;
        for reg in sinks.drain(..) {
            reg.stop.cancel();
        }
    }

    pub async fn sink_count(&self) -> usize {
        self.sinks.read().await.len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSink {
        name: String,
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventSink for CountingSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn handle(&self, _event: Event) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn publish_delivers_to_every_registered_sink() {
        let broadcaster = Broadcaster::new();
        let seen_a = Arc::new(AtomicUsize::new(0));
        let seen_b = Arc::new(AtomicUsize::new(0));
        broadcaster
            .register(Arc::new(CountingSink {
                name: "a".into(),
                seen: seen_a.clone(),
            }))
            .await;
        broadcaster
            .register(Arc::new(CountingSink {
                name: "b".into(),
                seen: seen_b.clone(),
            }))
            .await;

        broadcaster
            .publish(Event::error("test", "hello"))
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(seen_a.load(Ordering::SeqCst), 1);
        assert_eq!(seen_b.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unregistering_stops_delivery() {
        let broadcaster = Broadcaster::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let stop = broadcaster
            .register(Arc::new(CountingSink {
                name: "a".into(),
                seen: seen.clone(),
            }))
            .await;
        stop.cancel();
        tokio::time::sleep(Duration::from_millis(10)).await;

        broadcaster.publish(Event::error("test", "after stop")).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }
}
