use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::config::{MINING_REWARD, MINING_REWARD_INPUT_ADDRESS};
use crate::crypto::verify_signature;
use crate::error::{LedgerError, Result};
use crate::wallet::Wallet;

/// Recipient address -> credited amount. Ordered so its JSON form is canonical.
pub type TransactionOutput = BTreeMap<String, u64>;

/// Who funds a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TransactionInput {
    /// Signed claim of the sender's balance at creation time.
    Standard {
        timestamp: i64,
        address: String,
        amount: u64,
        /// Hex DER signature over the canonical JSON of the output.
        signature: String,
    },
    /// Coinbase-style credit for the miner. Carries no amount and no signature.
    Reward { address: String },
}

impl TransactionInput {
    pub fn address(&self) -> &str {
        match self {
            TransactionInput::Standard { address, .. } => address,
            TransactionInput::Reward { address } => address,
        }
    }

    fn reward() -> Self {
        TransactionInput::Reward {
            address: MINING_REWARD_INPUT_ADDRESS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub input: TransactionInput,
    pub output: TransactionOutput,
}

impl Transaction {
    /// Build a fresh signed transaction moving `amount` from `sender` to `recipient`.
    /// Balance checks are the wallet's job; see `Wallet::create_transaction`.
    pub fn create_transaction(sender: &Wallet, recipient: &str, amount: u64) -> Result<Self> {
        let output = Self::create_transaction_output(sender, recipient, amount);
        let input = Self::create_transaction_input(sender, &output)?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            input,
            output,
        })
    }

    pub fn create_transaction_output(
        sender: &Wallet,
        recipient: &str,
        amount: u64,
    ) -> TransactionOutput {
        let mut output = TransactionOutput::new();
        output.insert(recipient.to_string(), amount);
        output.insert(
            sender.public_key().to_string(),
            sender.balance().saturating_sub(amount),
        );
        output
    }

    pub fn create_transaction_input(
        sender: &Wallet,
        output: &TransactionOutput,
    ) -> Result<TransactionInput> {
        Ok(TransactionInput::Standard {
            timestamp: Utc::now().timestamp_millis(),
            address: sender.public_key().to_string(),
            amount: sender.balance(),
            signature: sender.sign(&serde_json::to_string(output)?)?,
        })
    }

    /// Reward transaction crediting `MINING_REWARD` to the miner.
    pub fn reward(miner_address: &str) -> Self {
        let mut output = TransactionOutput::new();
        output.insert(miner_address.to_string(), MINING_REWARD);
        Self {
            id: Uuid::new_v4().to_string(),
            input: TransactionInput::reward(),
            output,
        }
    }

    pub fn is_reward(&self) -> bool {
        matches!(self.input, TransactionInput::Reward { .. })
    }

    /// What the sender keeps for itself (0 if absent).
    pub fn sender_output(&self) -> u64 {
        self.output
            .get(self.input.address())
            .copied()
            .unwrap_or(0)
    }

    pub fn total_output(&self) -> u128 {
        self.output.values().map(|v| *v as u128).sum()
    }

    /// A standard transaction is valid when its outputs sum to the input amount
    /// and the signature verifies over the output with the sender's key.
    /// Reward transactions never pass; they are placed into blocks directly.
    pub fn validate_transaction(transaction: &Transaction) -> bool {
        let TransactionInput::Standard {
            address,
            amount,
            signature,
            ..
        } = &transaction.input
        else {
            return false;
        };

        if transaction.total_output() != *amount as u128 {
            log::debug!(
                "tx {} rejected: output total {} != input amount {}",
                transaction.id,
                transaction.total_output(),
                amount
            );
            return false;
        }

        let Ok(message) = serde_json::to_string(&transaction.output) else {
            return false;
        };
        if !verify_signature(address, signature, &message) {
            log::debug!("tx {} rejected: bad signature", transaction.id);
            return false;
        }
        true
    }

    /// Add `amount` for `recipient` to a pending transaction, taking it out of
    /// the sender's own output, and re-sign.
    pub fn update(&mut self, sender: &Wallet, recipient: &str, amount: u64) -> Result<()> {
        if self.is_reward() {
            return Err(LedgerError::InvalidTransaction(
                "reward transactions cannot be amended".into(),
            ));
        }
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if amount > self.sender_output() {
            return Err(LedgerError::InsufficientBalance);
        }
        let sender_address = self.input.address().to_string();
        if recipient == sender_address {
            return Err(LedgerError::SelfSend);
        }

        let credited = self
            .output
            .get(recipient)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or_else(|| {
                LedgerError::InvalidTransaction(format!("output for {recipient} overflows"))
            })?;
        self.output.insert(recipient.to_string(), credited);
        if let Some(own) = self.output.get_mut(&sender_address) {
            *own -= amount;
        }

        let new_signature = sender.sign(&serde_json::to_string(&self.output)?)?;
        if let TransactionInput::Standard { signature, .. } = &mut self.input {
            *signature = new_signature;
        }
        Ok(())
    }
}
