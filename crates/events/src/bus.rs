//! Broadcast bus for lifecycle events
//!
//! Publishing never blocks and needs no runtime, so controllers can emit
//! from inside a phase window on whatever thread drives them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::types::{EventEnvelope, LifecycleEvent};

/// Capacity for the broadcast channel
const DEFAULT_CAPACITY: usize = 256;

/// Event bus shared by every controller of a host
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    published: Arc<AtomicUsize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Slow subscribers lag once more than `capacity` events are buffered.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wrap and publish an event.
    ///
    /// Returns the number of subscribers that received it; with none the
    /// event is dropped.
    pub fn emit(&self, event: LifecycleEvent) -> usize {
        self.publish(EventEnvelope::new(event))
    }

    pub fn publish(&self, envelope: EventEnvelope) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Events published before subscribing are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total events published, delivered or not
    pub fn published_count(&self) -> usize {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .field("published_count", &self.published_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifecycle_core::LifecyclePhase;
    use uuid::Uuid;

    fn entered(phase: LifecyclePhase) -> LifecycleEvent {
        LifecycleEvent::PhaseEntered {
            controller_id: Uuid::new_v4(),
            phase,
        }
    }

    #[tokio::test]
    async fn test_emit_subscribe() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let sent = bus.emit(entered(LifecyclePhase::Init));
        assert_eq!(sent, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event.phase(), LifecyclePhase::Init);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let envelope = EventEnvelope::new(entered(LifecyclePhase::Construct));
        let envelope_id = envelope.id;

        assert_eq!(bus.publish(envelope), 2);
        assert_eq!(rx1.recv().await.unwrap().id, envelope_id);
        assert_eq!(rx2.recv().await.unwrap().id, envelope_id);
    }

    #[test]
    fn test_no_subscribers_drops_event() {
        let bus = EventBus::new();
        assert_eq!(bus.emit(entered(LifecyclePhase::PreInit)), 0);
        assert_eq!(bus.published_count(), 1);
    }

    #[test]
    fn test_receiver_without_runtime() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(entered(LifecyclePhase::PostInit));
        let received = rx.try_recv().unwrap();
        assert_eq!(received.event.phase(), LifecyclePhase::PostInit);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_clone_shares_channel() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        let _rx = bus2.subscribe();
        assert_eq!(bus1.subscriber_count(), 1);

        bus2.emit(entered(LifecyclePhase::Available));
        assert_eq!(bus1.published_count(), 1);
    }
}
