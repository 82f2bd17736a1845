use std::sync::Arc;
use uuid::Uuid;

use super::bus::{Channel, MessageBus, NodeId, Subscription};
use crate::blockchain::Block;
use crate::error::Result;
use crate::node::NodeState;
use crate::node::state::Ledger;
use crate::transaction::Transaction;

/// Keeps a node converged with its peers over a `MessageBus`.
pub struct Replicator {
    node_id: NodeId,
    bus: Arc<dyn MessageBus>,
    state: Arc<NodeState>,
}

impl Replicator {
    pub fn new(bus: Arc<dyn MessageBus>, state: Arc<NodeState>) -> Self {
        Self {
            node_id: Uuid::new_v4(),
            bus,
            state,
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe(self.node_id)
    }

    pub fn broadcast_chain(&self, chain: &[Block]) -> Result<usize> {
        let payload = serde_json::to_string(chain)?;
        Ok(self
            .bus
            .publish_except_self(self.node_id, Channel::Blockchain, payload))
    }

    pub fn broadcast_transaction(&self, transaction: &Transaction) -> Result<usize> {
        let payload = serde_json::to_string(transaction)?;
        Ok(self
            .bus
            .publish_except_self(self.node_id, Channel::Transaction, payload))
    }

    /// Apply one inbound message. Anything malformed or invalid is dropped.
    pub fn handle_message(&self, channel: Channel, payload: &str) {
        log::debug!("message received on {channel} ({} bytes)", payload.len());
        match channel {
            Channel::Blockchain => match serde_json::from_str::<Vec<Block>>(payload) {
                Ok(chain) => self.on_chain(chain),
                Err(e) => log::warn!("dropping malformed chain message: {e}"),
            },
            Channel::Transaction => match serde_json::from_str::<Transaction>(payload) {
                Ok(tx) => {
                    // no validation here; the miner filters the pool
                    self.state.ledger().pool.add_transaction(tx);
                }
                Err(e) => log::warn!("dropping malformed transaction message: {e}"),
            },
        }
    }

    fn on_chain(&self, candidate: Vec<Block>) {
        let replaced = {
            let mut guard = self.state.ledger();
            let Ledger { blockchain, pool } = &mut *guard;
            blockchain.replace_chain(candidate, |chain| pool.clear_blockchain_transactions(chain))
        };
        if replaced {
            self.state.abort_mining();
        }
    }

    /// Drain `subscription` until the bus goes away.
    pub async fn run(self: Arc<Self>, mut subscription: Subscription) {
        log::info!("replicator {} listening", self.node_id);
        while let Some(envelope) = subscription.recv().await {
            self.handle_message(envelope.channel, &envelope.payload);
        }
        log::info!("replicator {} stopped: bus closed", self.node_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Blockchain;
    use crate::network::LocalBus;
    use crate::wallet::Wallet;
    use std::sync::atomic::Ordering;

    fn replicator(bus: &Arc<LocalBus>) -> Arc<Replicator> {
        let state = Arc::new(NodeState::new(Wallet::new()));
        Arc::new(Replicator::new(bus.clone(), state))
    }

    fn tx() -> Transaction {
        Transaction::create_transaction(&Wallet::new(), "recipient", 10).unwrap()
    }

    #[test]
    fn inbound_transaction_is_pooled_without_validation() {
        let bus = Arc::new(LocalBus::new());
        let node = replicator(&bus);
        let mut forged = tx();
        forged.output.insert("thief".into(), 1);

        node.handle_message(Channel::Transaction, &serde_json::to_string(&forged).unwrap());

        let ledger = node.state.ledger();
        assert_eq!(ledger.pool.transactions().get(&forged.id), Some(&forged));
        assert!(ledger.pool.valid_transactions().is_empty());
    }

    #[test]
    fn inbound_longer_chain_replaces_and_prunes_pool() {
        let bus = Arc::new(LocalBus::new());
        let node = replicator(&bus);
        let confirmed = tx();
        let pending = tx();
        {
            let mut ledger = node.state.ledger();
            ledger.pool.add_transaction(confirmed.clone());
            ledger.pool.add_transaction(pending.clone());
        }
        let mut remote = Blockchain::new();
        remote.add_block(vec![confirmed.clone()]);

        node.handle_message(
            Channel::Blockchain,
            &serde_json::to_string(&remote.chain).unwrap(),
        );

        let ledger = node.state.ledger();
        assert_eq!(ledger.blockchain.chain, remote.chain);
        assert!(!ledger.pool.transactions().contains_key(&confirmed.id));
        assert!(ledger.pool.transactions().contains_key(&pending.id));
        assert!(node.state.mining_abort().load(Ordering::SeqCst));
    }

    #[test]
    fn inbound_invalid_chain_is_ignored() {
        let bus = Arc::new(LocalBus::new());
        let node = replicator(&bus);
        let pending = tx();
        node.state.ledger().pool.add_transaction(pending.clone());

        let mut remote = Blockchain::new();
        remote.add_block(vec![pending.clone()]);
        remote.chain[1].hash = "forged".into();
        node.handle_message(
            Channel::Blockchain,
            &serde_json::to_string(&remote.chain).unwrap(),
        );

        let ledger = node.state.ledger();
        assert_eq!(ledger.blockchain.len(), 1);
        assert_eq!(ledger.pool.len(), 1);
        assert!(!node.state.mining_abort().load(Ordering::SeqCst));
    }

    #[test]
    fn malformed_payloads_are_dropped() {
        let bus = Arc::new(LocalBus::new());
        let node = replicator(&bus);
        node.handle_message(Channel::Blockchain, "{not json");
        node.handle_message(Channel::Transaction, "[]");
        let ledger = node.state.ledger();
        assert_eq!(ledger.blockchain.len(), 1);
        assert!(ledger.pool.is_empty());
    }

    #[actix_web::test]
    async fn broadcast_reaches_peer_but_not_self() {
        let bus = Arc::new(LocalBus::new());
        let a = replicator(&bus);
        let b = replicator(&bus);
        let mut sub_a = a.subscribe();
        let mut sub_b = b.subscribe();

        let sent = tx();
        assert_eq!(a.broadcast_transaction(&sent).unwrap(), 1);

        let envelope = sub_b.recv().await.unwrap();
        assert_eq!(envelope.origin, a.node_id());
        b.handle_message(envelope.channel, &envelope.payload);
        assert!(b.state.ledger().pool.transactions().contains_key(&sent.id));

        b.broadcast_chain(&Blockchain::new().chain).unwrap();
        let envelope = sub_a.recv().await.unwrap();
        assert_eq!(envelope.channel, Channel::Blockchain);
        assert_eq!(envelope.origin, b.node_id());
    }

    #[actix_web::test]
    async fn run_applies_messages_until_bus_closes() {
        let bus = Arc::new(LocalBus::new());
        let a = replicator(&bus);
        let b = replicator(&bus);
        let listener = actix_web::rt::spawn(b.clone().run(b.subscribe()));

        let sent = tx();
        a.broadcast_transaction(&sent).unwrap();

        for _ in 0..50 {
            if b.state.ledger().pool.len() == 1 {
                break;
            }
            actix_web::rt::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(b.state.ledger().pool.transactions().contains_key(&sent.id));
        listener.abort();
    }
}
