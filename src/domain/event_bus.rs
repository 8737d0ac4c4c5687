//! Broadcast channel for rotator change notifications.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Rotators publish
//! a [`RotatorEvent`] for every changed axis, and the hub's broadcast pump
//! subscribes to turn them into client pushes.

use tokio::sync::broadcast;

use super::RotatorEvent;

/// Broadcast bus for [`RotatorEvent`]s.
///
/// Publishing never blocks. When the ring buffer is full, the oldest
/// events are dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RotatorEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: RotatorEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RotatorEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Axis, Status};

    fn make_event(azimuth: i32) -> RotatorEvent {
        RotatorEvent {
            axis: Axis::Azimuth,
            status: Status {
                name: "test".to_string(),
                azimuth,
                ..Status::default()
            },
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(make_event(1)), 0);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.publish(make_event(42)), 2);

        let Ok(e1) = rx1.recv().await else {
            panic!("rx1 failed");
        };
        let Ok(e2) = rx2.recv().await else {
            panic!("rx2 failed");
        };
        assert_eq!(e1, e2);
        assert_eq!(e1.status.azimuth, 42);
    }

    #[test]
    fn dropped_subscriber_is_not_counted() {
        let bus = EventBus::new(16);
        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.publish(make_event(1)), 2);

        drop(rx1);
        assert_eq!(bus.publish(make_event(2)), 1);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let bus = EventBus::new(0);
        let _rx = bus.subscribe();
        assert_eq!(bus.publish(make_event(0)), 1);
    }
}
