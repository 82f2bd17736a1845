use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

pub type NodeId = Uuid;

/// Per-subscriber queue depth of a `LocalBus`.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Logical channels carried by the replication bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// A full serialized chain.
    Blockchain,
    /// A single serialized transaction.
    Transaction,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Blockchain => f.write_str("BLOCKCHAIN"),
            Channel::Transaction => f.write_str("TRANSACTION"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub origin: NodeId,
    pub channel: Channel,
    pub payload: String,
}

/// Publish/subscribe transport between nodes.
///
/// Publishing never loops back to the publisher: a node does not receive its
/// own messages, so it never has to drop its subscription around a publish.
pub trait MessageBus: Send + Sync {
    /// Deliver `payload` on `channel` to every subscriber other than `origin`.
    /// Returns how many subscribers it was handed to.
    fn publish_except_self(&self, origin: NodeId, channel: Channel, payload: String) -> usize;

    /// Register `node` on every channel.
    fn subscribe(&self, node: NodeId) -> Subscription;
}

/// Inbound side of a bus registration.
#[derive(Debug)]
pub struct Subscription {
    node: NodeId,
    receiver: mpsc::Receiver<Envelope>,
}

impl Subscription {
    pub fn new(node: NodeId, receiver: mpsc::Receiver<Envelope>) -> Self {
        Self { node, receiver }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Next message for this node; `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.receiver.recv().await
    }
}

/// In-process bus connecting nodes that live in the same process.
///
/// Each subscriber has a bounded queue. A message for a subscriber whose
/// queue is full is dropped for that subscriber only.
#[derive(Debug)]
pub struct LocalBus {
    subscribers: Mutex<Vec<(NodeId, mpsc::Sender<Envelope>)>>,
    capacity: usize,
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().expect("mutex poisoned").len()
    }
}

impl MessageBus for LocalBus {
    fn publish_except_self(&self, origin: NodeId, channel: Channel, payload: String) -> usize {
        let mut subscribers = self.subscribers.lock().expect("mutex poisoned");
        // closed receivers are dropped as we go
        subscribers.retain(|(_, tx)| !tx.is_closed());

        let mut delivered = 0;
        for (node, tx) in subscribers.iter() {
            if *node == origin {
                continue;
            }
            let envelope = Envelope {
                origin,
                channel,
                payload: payload.clone(),
            };
            match tx.try_send(envelope) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    log::warn!("subscriber {node} is lagging, dropped {channel} message");
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
        log::debug!("published on {channel} from {origin} to {delivered} peer(s)");
        delivered
    }

    fn subscribe(&self, node: NodeId) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers
            .lock()
            .expect("mutex poisoned")
            .push((node, tx));
        Subscription::new(node, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn delivers_to_peers_but_not_to_publisher() {
        let bus = LocalBus::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut sub_a = bus.subscribe(a);
        let mut sub_b = bus.subscribe(b);

        let delivered = bus.publish_except_self(a, Channel::Transaction, "hello".into());
        assert_eq!(delivered, 1);

        let got = sub_b.recv().await.unwrap();
        assert_eq!(got.origin, a);
        assert_eq!(got.channel, Channel::Transaction);
        assert_eq!(got.payload, "hello");

        // a never sees its own message
        assert!(sub_a.receiver.try_recv().is_err());
    }

    #[actix_web::test]
    async fn preserves_publish_order_per_subscriber() {
        let bus = LocalBus::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut sub_b = bus.subscribe(b);

        bus.publish_except_self(a, Channel::Blockchain, "1".into());
        bus.publish_except_self(a, Channel::Transaction, "2".into());

        assert_eq!(sub_b.recv().await.unwrap().payload, "1");
        assert_eq!(sub_b.recv().await.unwrap().payload, "2");
    }

    #[test]
    fn prunes_dropped_subscriptions() {
        let bus = LocalBus::new();
        let sub = bus.subscribe(Uuid::new_v4());
        let _kept = bus.subscribe(Uuid::new_v4());
        assert_eq!(bus.subscriber_count(), 2);

        drop(sub);
        assert_eq!(
            bus.publish_except_self(Uuid::new_v4(), Channel::Blockchain, "x".into()),
            1
        );
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[actix_web::test]
    async fn full_subscriber_queue_drops_instead_of_growing() {
        let bus = LocalBus::with_capacity(2);
        let (a, slow, fast) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut sub_slow = bus.subscribe(slow);
        let mut sub_fast = bus.subscribe(fast);

        assert_eq!(bus.publish_except_self(a, Channel::Transaction, "1".into()), 2);
        assert_eq!(bus.publish_except_self(a, Channel::Transaction, "2".into()), 2);
        assert_eq!(sub_fast.recv().await.unwrap().payload, "1");
        assert_eq!(sub_fast.recv().await.unwrap().payload, "2");

        // slow still holds two unread messages
        assert_eq!(bus.publish_except_self(a, Channel::Transaction, "3".into()), 1);
        assert_eq!(sub_fast.recv().await.unwrap().payload, "3");

        assert_eq!(sub_slow.recv().await.unwrap().payload, "1");
        assert_eq!(sub_slow.recv().await.unwrap().payload, "2");
        assert!(sub_slow.receiver.try_recv().is_err());
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn default_capacity() {
        assert_eq!(LocalBus::new().capacity(), DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn channel_names() {
        assert_eq!(Channel::Blockchain.to_string(), "BLOCKCHAIN");
        assert_eq!(Channel::Transaction.to_string(), "TRANSACTION");
    }
}
