use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::blockchain::Blockchain;
use crate::transaction::TransactionPool;
use crate::wallet::Wallet;

/// Chain and pool, mutated together under one lock.
#[derive(Debug, Default)]
pub struct Ledger {
    pub blockchain: Blockchain,
    pub pool: TransactionPool,
}

/// Per-node shared state handed to the replicator, the miner and the request layer.
/// Lock order when both are needed: ledger, then wallet.
#[derive(Debug)]
pub struct NodeState {
    ledger: Mutex<Ledger>,
    wallet: Mutex<Wallet>,
    mining_abort: AtomicBool,
}

impl NodeState {
    pub fn new(wallet: Wallet) -> Self {
        Self::with_ledger(Ledger::default(), wallet)
    }

    pub fn with_ledger(ledger: Ledger, wallet: Wallet) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            wallet: Mutex::new(wallet),
            mining_abort: AtomicBool::new(false),
        }
    }

    pub fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().expect("mutex poisoned")
    }

    pub fn wallet(&self) -> MutexGuard<'_, Wallet> {
        self.wallet.lock().expect("mutex poisoned")
    }

    /// Address of this node's wallet, also the mining reward recipient.
    pub fn address(&self) -> String {
        self.wallet().public_key().to_string()
    }

    pub fn mining_abort(&self) -> &AtomicBool {
        &self.mining_abort
    }

    /// Ask any in-flight nonce search to give up.
    pub fn abort_mining(&self) {
        self.mining_abort.store(true, Ordering::SeqCst);
    }

    pub(crate) fn reset_mining_abort(&self) {
        self.mining_abort.store(false, Ordering::SeqCst);
    }
}
