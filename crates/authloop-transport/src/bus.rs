//! Topic-based publish/subscribe.
//!
//! [`LocalBus`] keeps one `tokio::sync::broadcast` channel per topic,
//! created lazily on first use. Publishing to a topic nobody listens on
//! is not an error; the message is simply dropped, like on any bus.

use std::collections::HashMap;
use std::sync::Mutex;

use authloop_protocol::BusMessage;
use tokio::sync::broadcast;

/// A publish/subscribe message bus.
pub trait MessageBus: Send + Sync + 'static {
    /// Delivers `message` to every current subscriber of its topic.
    /// Returns how many subscribers received it.
    fn publish(&self, message: BusMessage) -> usize;

    /// Starts receiving messages published on `topic` from now on.
    fn subscribe(&self, topic: &str) -> Subscription;
}

/// A live subscription to one topic.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    receiver: broadcast::Receiver<BusMessage>,
}

impl Subscription {
    /// Wraps a broadcast receiver. Custom [`MessageBus`] implementations
    /// built on `tokio::sync::broadcast` use this to hand out subscriptions.
    pub fn new(
        topic: impl Into<String>,
        receiver: broadcast::Receiver<BusMessage>,
    ) -> Self {
        Self {
            topic: topic.into(),
            receiver,
        }
    }

    /// The subscribed topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for the next message.
    ///
    /// Returns `None` once the bus is gone. A slow subscriber that falls
    /// behind loses the oldest messages; that is logged and receiving
    /// continues with the oldest message still buffered.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(
                        topic = %self.topic,
                        missed,
                        "bus subscriber lagged, messages dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// In-process [`MessageBus`].
///
/// Cheap to share behind an `Arc`; every worker and test observer in the
/// process can hold the same bus.
#[derive(Debug)]
pub struct LocalBus {
    capacity: usize,
    channels: Mutex<HashMap<String, broadcast::Sender<BusMessage>>>,
}

impl LocalBus {
    /// Per-topic buffer used by [`LocalBus::default`].
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Creates a bus whose topics buffer up to `capacity` messages per
    /// subscriber before the subscriber starts lagging.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<BusMessage> {
        // A poisoned lock only means another thread panicked mid-insert;
        // the map itself is still usable.
        let mut channels = self
            .channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl MessageBus for LocalBus {
    fn publish(&self, message: BusMessage) -> usize {
        let topic = message.topic.clone();
        match self.sender(&topic).send(message) {
            Ok(delivered) => {
                tracing::trace!(%topic, delivered, "published");
                delivered
            }
            // No subscribers right now.
            Err(_) => 0,
        }
    }

    fn subscribe(&self, topic: &str) -> Subscription {
        Subscription::new(topic, self.sender(topic).subscribe())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn msg(topic: &str, n: u64) -> BusMessage {
        BusMessage {
            topic: topic.into(),
            payload: json!(n),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber_of_same_topic() {
        let bus = LocalBus::default();
        let mut sub = bus.subscribe("a");

        let delivered = bus.publish(msg("a", 1));

        assert_eq!(delivered, 1);
        assert_eq!(sub.recv().await, Some(msg("a", 1)));
    }

    #[tokio::test]
    async fn test_publish_skips_other_topics() {
        let bus = LocalBus::default();
        let mut sub_b = bus.subscribe("b");

        bus.publish(msg("a", 1));
        bus.publish(msg("b", 2));

        assert_eq!(sub_b.recv().await, Some(msg("b", 2)));
    }

    #[test]
    fn test_publish_without_subscribers_returns_zero() {
        let bus = LocalBus::default();
        assert_eq!(bus.publish(msg("nobody", 1)), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_gets_a_copy() {
        let bus = LocalBus::default();
        let mut first = bus.subscribe("a");
        let mut second = bus.subscribe("a");

        assert_eq!(bus.publish(msg("a", 7)), 2);

        assert_eq!(first.recv().await, Some(msg("a", 7)));
        assert_eq!(second.recv().await, Some(msg("a", 7)));
    }

    #[tokio::test]
    async fn test_lagged_subscriber_skips_to_oldest_buffered() {
        let bus = LocalBus::new(2);
        let mut sub = bus.subscribe("a");

        for n in 0..5 {
            bus.publish(msg("a", n));
        }

        // Capacity 2: messages 0..=2 were overwritten.
        assert_eq!(sub.recv().await, Some(msg("a", 3)));
        assert_eq!(sub.recv().await, Some(msg("a", 4)));
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_bus_dropped() {
        let bus = LocalBus::default();
        let mut sub = bus.subscribe("a");

        drop(bus);

        assert_eq!(sub.recv().await, None);
    }
}
