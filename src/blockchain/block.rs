use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{
    GENESIS_HASH, GENESIS_LAST_HASH, GENESIS_TIMESTAMP, INITIAL_DIFFICULTY, MINE_RATE,
};
use crate::crypto::{crypto_hash, leading_zero_bits};
use crate::transaction::Transaction;

/// A single block in the chain holding an ordered list of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub timestamp: i64, // Unix milliseconds (UTC)
    pub last_hash: String,
    pub hash: String,
    pub nonce: u64,
    pub difficulty: u32,
    pub data: Vec<Transaction>,
}

impl Block {
    /// The fixed first block every valid chain starts with.
    pub fn genesis() -> Self {
        Self {
            timestamp: GENESIS_TIMESTAMP,
            last_hash: GENESIS_LAST_HASH.to_string(),
            hash: GENESIS_HASH.to_string(),
            nonce: 0,
            difficulty: INITIAL_DIFFICULTY,
            data: Vec::new(),
        }
    }

    /// Hash over every field except `hash` itself. Transactions enter the
    /// preimage as their JSON serialization.
    pub fn compute_hash(
        last_hash: &str,
        timestamp: i64,
        data: &[Transaction],
        nonce: u64,
        difficulty: u32,
    ) -> String {
        let data_json = serde_json::to_string(data).expect("serialize block data");
        crypto_hash(&[
            last_hash,
            &timestamp.to_string(),
            &data_json,
            &nonce.to_string(),
            &difficulty.to_string(),
        ])
    }

    /// Recompute this block's hash from its own fields.
    pub fn recompute_hash(&self) -> String {
        Self::compute_hash(
            &self.last_hash,
            self.timestamp,
            &self.data,
            self.nonce,
            self.difficulty,
        )
    }

    /// Proof-of-Work: bump the nonce until the hash has at least `difficulty`
    /// leading zero bits. Timestamp and difficulty are re-derived each attempt.
    /// Returns `None` once `abort` is raised.
    pub fn mine_block(last_block: &Block, data: Vec<Transaction>, abort: &AtomicBool) -> Option<Self> {
        let last_hash = &last_block.hash;
        let data_json = serde_json::to_string(&data).expect("serialize block data");
        let mut nonce: u64 = 0;

        loop {
            if abort.load(Ordering::Relaxed) {
                log::debug!("mining atop {last_hash} aborted after {nonce} attempts");
                return None;
            }
            nonce = nonce.wrapping_add(1);
            let timestamp = Utc::now().timestamp_millis();
            let difficulty = Self::adjust_difficulty(last_block, timestamp);
            let hash = crypto_hash(&[
                last_hash,
                &timestamp.to_string(),
                &data_json,
                &nonce.to_string(),
                &difficulty.to_string(),
            ]);

            if leading_zero_bits(&hash) >= difficulty {
                return Some(Self {
                    timestamp,
                    last_hash: last_hash.clone(),
                    hash,
                    nonce,
                    difficulty,
                    data,
                });
            }
        }
    }

    /// Raise difficulty when the block came faster than `MINE_RATE`, lower it
    /// when slower. Never below 1.
    pub fn adjust_difficulty(original: &Block, timestamp: i64) -> u32 {
        if original.difficulty < 1 {
            return 1;
        }
        // peer chains may carry any timestamp or difficulty
        if timestamp.saturating_sub(original.timestamp) > MINE_RATE {
            (original.difficulty - 1).max(1)
        } else {
            original.difficulty.saturating_add(1)
        }
    }
}
