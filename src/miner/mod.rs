use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;

use crate::blockchain::Block;
use crate::error::{LedgerError, Result};
use crate::network::Replicator;
use crate::node::NodeState;
use crate::transaction::Transaction;

/// Turns pooled transactions into blocks.
///
/// The nonce search runs on a blocking worker with no lock held; only the
/// final append touches the ledger. Rounds are serialized so two searches
/// never race for the same tip.
pub struct TransactionMiner {
    state: Arc<NodeState>,
    replicator: Arc<Replicator>,
    round: AsyncMutex<()>,
}

impl TransactionMiner {
    pub fn new(state: Arc<NodeState>, replicator: Arc<Replicator>) -> Self {
        Self {
            state,
            replicator,
            round: AsyncMutex::new(()),
        }
    }

    /// Mine every valid pooled transaction plus a reward for this node,
    /// broadcast the new chain and clear the pool.
    pub async fn mine_transactions(&self) -> Result<Block> {
        let _round = self.round.lock().await;
        // cleared before the tip is read so a replacement after this point aborts the round
        self.state.reset_mining_abort();

        let (last_block, mut data) = {
            let ledger = self.state.ledger();
            (
                ledger.blockchain.last_block().clone(),
                ledger.pool.valid_transactions(),
            )
        };
        data.push(Transaction::reward(&self.state.address()));
        log::info!("mining {} transaction(s) incl. reward", data.len());

        let block = self.search(last_block, data).await?;
        let chain = {
            let mut ledger = self.state.ledger();
            ledger.blockchain.append_block(block.clone())?;
            ledger.pool.clear_transactions();
            ledger.blockchain.chain.clone()
        };
        self.replicator.broadcast_chain(&chain)?;
        log::info!(
            "mined block {} (difficulty {}, nonce {}) at height {}",
            block.hash,
            block.difficulty,
            block.nonce,
            chain.len() - 1
        );
        Ok(block)
    }

    /// Mine a block holding exactly `data` and broadcast the chain.
    /// No reward is added and the pool is left alone.
    pub async fn mine_block(&self, data: Vec<Transaction>) -> Result<Block> {
        let _round = self.round.lock().await;
        // cleared before the tip is read so a replacement after this point aborts the round
        self.state.reset_mining_abort();

        let last_block = self.state.ledger().blockchain.last_block().clone();
        let block = self.search(last_block, data).await?;
        let chain = {
            let mut ledger = self.state.ledger();
            ledger.blockchain.append_block(block.clone())?;
            ledger.blockchain.chain.clone()
        };
        self.replicator.broadcast_chain(&chain)?;
        log::info!("mined block {} with explicit data", block.hash);
        Ok(block)
    }

    /// Stop the current nonce search, if any.
    pub fn cancel(&self) {
        self.state.abort_mining();
    }

    async fn search(&self, last_block: Block, data: Vec<Transaction>) -> Result<Block> {
        let state = Arc::clone(&self.state);
        let mined = tokio::task::spawn_blocking(move || {
            Block::mine_block(&last_block, data, state.mining_abort())
        })
        .await
        .map_err(|e| LedgerError::Worker(e.to_string()))?;
        mined.ok_or(LedgerError::MiningAborted)
    }

    /// Mine on a fixed interval, skipping rounds with nothing valid to mine.
    pub async fn run_periodic(self: Arc<Self>, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        // first tick fires immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if self.state.ledger().pool.valid_transactions().is_empty() {
                log::debug!("periodic mining: pool has no valid transactions");
                continue;
            }
            if let Err(e) = self.mine_transactions().await {
                log::warn!("periodic mining round failed: {e}");
            }
        }
    }
}
