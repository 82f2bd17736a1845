use rand::rngs::OsRng;
use secp256k1::{Secp256k1, SecretKey};

use crate::blockchain::Block;
use crate::config::STARTING_BALANCE;
use crate::crypto::signing_message;
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;

/// A secp256k1 identity. The address is the hex of the compressed public key.
#[derive(Debug, Clone)]
pub struct Wallet {
    secret_key: SecretKey,
    public_key: String,
    /// Advisory; refreshed from the chain by `create_transaction`.
    balance: u64,
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

impl Wallet {
    pub fn new() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, pk) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key: hex::encode(pk.serialize()),
            balance: STARTING_BALANCE,
        }
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Sign `crypto_hash(data)`, returning the hex DER signature.
    pub fn sign(&self, data: &str) -> Result<String> {
        let secp = Secp256k1::signing_only();
        let msg = signing_message(data)?;
        let sig = secp.sign_ecdsa(&msg, &self.secret_key);
        Ok(hex::encode(&*sig.serialize_der()))
    }

    /// Build a transaction from this wallet. With a chain, the balance is
    /// recomputed against it first.
    pub fn create_transaction(
        &mut self,
        recipient: &str,
        amount: u64,
        chain: Option<&[Block]>,
    ) -> Result<Transaction> {
        if let Some(chain) = chain {
            self.balance = Self::calculate_balance(chain, &self.public_key);
        }
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if amount > self.balance {
            return Err(LedgerError::InsufficientBalance);
        }
        Transaction::create_transaction(self, recipient, amount)
    }

    /// Spendable balance of `address` derived from chain history alone.
    ///
    /// Walks blocks newest to oldest summing credits to `address`. The walk ends
    /// after the first block (from the tip) in which `address` was a sender, since
    /// that transaction's change output already reflects everything before it.
    /// Without any such block the starting balance is added.
    ///
    /// Sums saturate at `u64::MAX`: a peer chain may carry arbitrary output
    /// values and the balance must stay computable.
    pub fn calculate_balance(chain: &[Block], address: &str) -> u64 {
        let mut balance = 0u64;
        let mut has_sent = false;

        for block in chain.iter().rev() {
            for tx in &block.data {
                if let Some(credit) = tx.output.get(address) {
                    balance = balance.saturating_add(*credit);
                    if tx.input.address() == address {
                        has_sent = true;
                    }
                }
            }
            if has_sent {
                break;
            }
        }

        if has_sent {
            balance
        } else {
            balance.saturating_add(STARTING_BALANCE)
        }
    }
}
