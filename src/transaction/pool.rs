use std::collections::HashMap;

use super::model::Transaction;
use crate::blockchain::Block;

/// Admitted but unconfirmed transactions, keyed by transaction id.
#[derive(Debug, Default, Clone)]
pub struct TransactionPool {
    transactions: HashMap<String, Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self {
            transactions: HashMap::new(),
        }
    }

    /// Insert or replace by id.
    pub fn add_transaction(&mut self, transaction: Transaction) {
        self.transactions.insert(transaction.id.clone(), transaction);
    }

    /// First pooled transaction sent by `address`.
    pub fn find_transaction(&self, address: &str) -> Option<&Transaction> {
        self.transactions
            .values()
            .find(|tx| tx.input.address() == address)
    }

    pub fn valid_transactions(&self) -> Vec<Transaction> {
        self.transactions
            .values()
            .filter(|tx| Transaction::validate_transaction(tx))
            .cloned()
            .collect()
    }

    pub fn clear_transactions(&mut self) {
        self.transactions.clear();
    }

    /// Drop every pooled transaction that is already confirmed in `chain`.
    pub fn clear_blockchain_transactions(&mut self, chain: &[Block]) {
        let before = self.transactions.len();
        for block in chain {
            for tx in &block.data {
                self.transactions.remove(&tx.id);
            }
        }
        log::debug!(
            "pool pruned against chain of {} blocks ({} -> {})",
            chain.len(),
            before,
            self.transactions.len()
        );
    }

    pub fn transactions(&self) -> &HashMap<String, Transaction> {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
