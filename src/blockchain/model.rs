use std::sync::atomic::AtomicBool;

use super::Block;
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;

/// In-memory chain of blocks, always rooted at the genesis block.
#[derive(Debug, Clone)]
pub struct Blockchain {
    pub chain: Vec<Block>,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    pub fn new() -> Self {
        Self {
            chain: vec![Block::genesis()],
        }
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    /// Mine a block with `data` atop the tip and append it, blocking until found.
    pub fn add_block(&mut self, data: Vec<Transaction>) -> &Block {
        let never = AtomicBool::new(false);
        let block = Block::mine_block(self.last_block(), data, &never)
            .expect("mining without an abort signal always completes");
        self.chain.push(block);
        self.last_block()
    }

    /// Append a block mined elsewhere. It must still extend the current tip.
    pub fn append_block(&mut self, block: Block) -> Result<&Block> {
        let tip = self.last_block();
        if block.last_hash != tip.hash {
            return Err(LedgerError::InvalidChain(format!(
                "block extends {} but the tip is {}",
                block.last_hash, tip.hash
            )));
        }
        if tip.difficulty.abs_diff(block.difficulty) != 1 {
            return Err(LedgerError::InvalidChain(format!(
                "difficulty jump {} -> {}",
                tip.difficulty, block.difficulty
            )));
        }
        if block.hash != block.recompute_hash() {
            return Err(LedgerError::InvalidChain("block hash mismatch".into()));
        }
        self.chain.push(block);
        Ok(self.last_block())
    }

    /// Adopt `candidate` iff it is longer and valid; otherwise leave the chain
    /// untouched. `on_success` sees the adopted chain. Returns whether it replaced.
    pub fn replace_chain<F>(&mut self, candidate: Vec<Block>, on_success: F) -> bool
    where
        F: FnOnce(&[Block]),
    {
        if candidate.len() <= self.chain.len() {
            log::debug!(
                "ignoring chain of {} blocks: not longer than local {}",
                candidate.len(),
                self.chain.len()
            );
            return false;
        }
        if !Self::is_valid_chain(&candidate) {
            log::debug!("ignoring invalid chain of {} blocks", candidate.len());
            return false;
        }

        log::info!(
            "replacing chain ({} -> {} blocks)",
            self.chain.len(),
            candidate.len()
        );
        self.chain = candidate;
        on_success(&self.chain);
        true
    }

    /// Structural validation: genesis, linkage, difficulty steps and hashes.
    /// Embedded transactions are not re-validated.
    pub fn is_valid_chain(chain: &[Block]) -> bool {
        match chain.first() {
            Some(first) if *first == Block::genesis() => {}
            _ => return false,
        }

        chain.windows(2).all(|pair| {
            let (prev, current) = (&pair[0], &pair[1]);
            prev.difficulty.abs_diff(current.difficulty) == 1
                && current.last_hash == prev.hash
                && current.hash == current.recompute_hash()
        })
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }
}
