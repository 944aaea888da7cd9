use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;

use super::metrics::StoreMetrics;
use super::tree::paths_overlap;

/// Notice that something at or below `path` changed. Listeners re-read their
/// own path rather than receiving the data.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub path: String,
}

/// Path-scoped change notifications. One broadcast channel per subscribed
/// path; channels without receivers are dropped on the next publish.
pub struct PubSubBus {
    channels: DashMap<String, broadcast::Sender<ChangeEvent>>,
    capacity: usize,
    metrics: Arc<StoreMetrics>,
}

impl PubSubBus {
    pub fn new(capacity: usize, metrics: Arc<StoreMetrics>) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
            metrics,
        }
    }

    pub fn publish(&self, changed: &str) {
        for entry in self.channels.iter() {
            if paths_overlap(entry.key(), changed) {
                // No receivers is not an error: delivery is at-most-once.
                let _ = entry.value().send(ChangeEvent {
                    path: changed.to_string(),
                });
                self.metrics.inc_published();
            }
        }
        self.channels.retain(|_, tx| tx.receiver_count() > 0);
    }

    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<ChangeEvent> {
        let entry = self.channels.entry(topic.to_string()).or_insert_with(|| {
            let (tx, _rx) = broadcast::channel(self.capacity);
            tx
        });
        entry.subscribe()
    }

    pub fn topic_count(&self) -> u64 {
        self.channels.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_to_ancestor_and_descendant_topics() {
        let bus = PubSubBus::new(8, Arc::new(StoreMetrics::default()));
        let mut coll = bus.subscribe("properties");
        let mut leaf = bus.subscribe("properties/p1/name");
        let mut other = bus.subscribe("accounts");

        bus.publish("properties/p1");

        assert_eq!(coll.recv().await.unwrap().path, "properties/p1");
        assert_eq!(leaf.recv().await.unwrap().path, "properties/p1");
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn dropped_receivers_release_their_channel() {
        let bus = PubSubBus::new(8, Arc::new(StoreMetrics::default()));
        let rx = bus.subscribe("chats/c1/messages");
        assert_eq!(bus.topic_count(), 1);
        drop(rx);
        bus.publish("chats/c1/messages/m1");
        assert_eq!(bus.topic_count(), 0);
    }
}
