use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::sse::ServerEvent;

/// Per-event broadcast registry used to fan scoreboard snapshots out to SSE
/// subscribers.
///
/// One channel exists per event id, created on first subscription. Sending
/// never blocks and never drops a subscriber: a slow receiver lags and skips
/// old snapshots, which is harmless because every push carries the full
/// ranked list.
pub struct ScoreboardHub {
    capacity: usize,
    channels: DashMap<Uuid, broadcast::Sender<ServerEvent>>,
}

impl ScoreboardHub {
    /// Construct a hub whose per-event channels buffer `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: DashMap::new(),
        }
    }

    /// Register a subscriber for one event's snapshots.
    pub fn subscribe(&self, event_id: Uuid) -> broadcast::Receiver<ServerEvent> {
        self.channels
            .entry(event_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send an event to all current subscribers of `event_id`.
    ///
    /// Events nobody ever subscribed to have no channel; the send is skipped.
    pub fn broadcast(&self, event_id: Uuid, event: ServerEvent) {
        if let Some(sender) = self.channels.get(&event_id) {
            let _ = sender.send(event);
        }
    }

    /// Number of live subscribers for one event.
    pub fn subscriber_count(&self, event_id: Uuid) -> usize {
        self.channels
            .get(&event_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Events that still have at least one live subscriber.
    pub fn active_events(&self) -> Vec<Uuid> {
        self.channels
            .iter()
            .filter(|entry| entry.receiver_count() > 0)
            .map(|entry| *entry.key())
            .collect()
    }

    /// Drop channels whose subscribers are all gone.
    pub fn prune(&self) {
        self.channels
            .retain(|_, sender| sender.receiver_count() > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(data: &str) -> ServerEvent {
        ServerEvent::new(Some("scoreboard".to_string()), data.to_string())
    }

    #[tokio::test]
    async fn events_are_isolated_per_group() {
        let hub = ScoreboardHub::new(8);
        let (event_a, event_b) = (Uuid::new_v4(), Uuid::new_v4());

        let mut subscriber_a = hub.subscribe(event_a);
        let mut subscriber_b = hub.subscribe(event_b);

        hub.broadcast(event_a, event("for a"));

        assert_eq!(subscriber_a.recv().await.unwrap().data, "for a");
        assert!(subscriber_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_is_a_no_op() {
        let hub = ScoreboardHub::new(8);
        // No channel exists yet; nothing to deliver to, nothing to panic on.
        hub.broadcast(Uuid::new_v4(), event("nobody listens"));
    }

    #[tokio::test]
    async fn prune_drops_abandoned_channels() {
        let hub = ScoreboardHub::new(8);
        let event_id = Uuid::new_v4();

        let subscriber = hub.subscribe(event_id);
        assert_eq!(hub.active_events(), vec![event_id]);

        drop(subscriber);
        hub.prune();
        assert!(hub.active_events().is_empty());
        assert_eq!(hub.subscriber_count(event_id), 0);
    }
}
