pub mod state;

pub use state::{Ledger, NodeState};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::Block;
use crate::error::Result;
use crate::miner::TransactionMiner;
use crate::network::{MessageBus, Replicator};
use crate::transaction::Transaction;
use crate::wallet::Wallet;

/// One ledger node: shared state plus the components wired around it.
/// Every operation the request layer needs goes through here.
pub struct Node {
    state: Arc<NodeState>,
    replicator: Arc<Replicator>,
    miner: Arc<TransactionMiner>,
}

impl Node {
    pub fn new(state: Arc<NodeState>, bus: Arc<dyn MessageBus>) -> Self {
        let replicator = Arc::new(Replicator::new(bus, state.clone()));
        let miner = Arc::new(TransactionMiner::new(state.clone(), replicator.clone()));
        Self {
            state,
            replicator,
            miner,
        }
    }

    pub fn with_wallet(wallet: Wallet, bus: Arc<dyn MessageBus>) -> Self {
        Self::new(Arc::new(NodeState::new(wallet)), bus)
    }

    pub fn state(&self) -> &Arc<NodeState> {
        &self.state
    }

    /// Subscribe to the bus and apply inbound messages in the background.
    pub fn start_replication(&self) -> actix_web::rt::task::JoinHandle<()> {
        let subscription = self.replicator.subscribe();
        actix_web::rt::spawn(self.replicator.clone().run(subscription))
    }

    pub fn start_periodic_mining(&self, every: Duration) -> actix_web::rt::task::JoinHandle<()> {
        log::info!("periodic mining every {}s", every.as_secs());
        actix_web::rt::spawn(self.miner.clone().run_periodic(every))
    }

    pub fn chain(&self) -> Vec<Block> {
        self.state.ledger().blockchain.chain.clone()
    }

    pub fn pool(&self) -> HashMap<String, Transaction> {
        self.state.ledger().pool.transactions().clone()
    }

    /// Send `amount` to `recipient` from this node's wallet.
    ///
    /// Amends the wallet's pending pool transaction when there is one,
    /// otherwise creates a new one against the current chain balance.
    /// The result is pooled and broadcast to peers.
    pub fn transact(&self, recipient: &str, amount: u64) -> Result<Transaction> {
        let transaction = {
            let mut ledger = self.state.ledger();
            let mut wallet = self.state.wallet();
            let pending = ledger.pool.find_transaction(wallet.public_key()).cloned();
            let transaction = match pending {
                Some(mut existing) => {
                    existing.update(&wallet, recipient, amount)?;
                    existing
                }
                None => {
                    let chain = ledger.blockchain.chain.as_slice();
                    wallet.create_transaction(recipient, amount, Some(chain))?
                }
            };
            ledger.pool.add_transaction(transaction.clone());
            transaction
        };
        self.replicator.broadcast_transaction(&transaction)?;
        log::info!("transaction {} pooled and broadcast", transaction.id);
        Ok(transaction)
    }

    pub async fn mine_transactions(&self) -> Result<Block> {
        self.miner.mine_transactions().await
    }

    pub async fn mine_block(&self, data: Vec<Transaction>) -> Result<Block> {
        self.miner.mine_block(data).await
    }

    pub fn cancel_mining(&self) {
        self.miner.cancel();
    }

    /// Wallet address and its balance recomputed from the current chain.
    pub fn wallet_info(&self) -> (String, u64) {
        let ledger = self.state.ledger();
        let address = self.state.address();
        let balance = Wallet::calculate_balance(&ledger.blockchain.chain, &address);
        (address, balance)
    }
}
