use crate::constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::error::LedgerError;
use crate::{block_hash, pow, Block, Transaction};
use chrono::Utc;
use tracing::info;

/// The committed chain plus the pool of transactions waiting for the next
/// block. Sole owner of both; [`Ledger::commit_block`] is the only way a
/// block enters the chain, and nothing mutates a block afterwards.
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

impl Ledger {
    /// A fresh ledger holding only the genesis block
    /// (`proof = 1`, `previous_hash = "genesis"`, no transactions).
    pub fn new() -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            pending: Vec::new(),
        };
        ledger.commit_block(Some(GENESIS_PROOF), Some(GENESIS_PREVIOUS_HASH.to_string()));
        ledger
    }

    /// Queues a transaction for the next block and returns the index that
    /// block will have. Blank identifiers are rejected before they can
    /// enter the pool.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<u64, LedgerError> {
        if tx.sender.trim().is_empty() {
            return Err(LedgerError::MalformedTransaction("sender is empty"));
        }
        if tx.recipient.trim().is_empty() {
            return Err(LedgerError::MalformedTransaction("recipient is empty"));
        }
        self.pending.push(tx);
        Ok(self.chain.len() as u64)
    }

    /// Forges a block from the pending pool and appends it.
    ///
    /// The pool is moved into the block and left empty. A missing `proof`
    /// is computed with [`pow::find_proof`] over the last block, which
    /// blocks until the search lands; a missing `previous_hash` is the
    /// canonical hash of the last block.
    pub fn commit_block(&mut self, proof: Option<u64>, previous_hash: Option<String>) -> Block {
        let previous_hash = previous_hash.unwrap_or_else(|| block_hash(self.last_block()));
        let proof = proof.unwrap_or_else(|| {
            let last = self.last_block();
            pow::find_proof(last.proof, &block_hash(last))
        });

        let block = Block {
            index: self.chain.len() as u64,
            timestamp: Utc::now().to_rfc3339(),
            transactions: std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        };
        info!(
            index = block.index,
            proof = block.proof,
            txs = block.transactions.len(),
            "committed block"
        );
        self.chain.push(block.clone());
        block
    }

    /// The most recent block. Never fails; the chain holds at least
    /// genesis from construction on.
    pub fn last_block(&self) -> &Block {
        self.chain.last().expect("chain always holds genesis")
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Adopt a chain chosen by the consensus resolver. Committed state is
    /// wholesale replaced; pending transactions stay queued.
    pub(crate) fn replace_chain(&mut self, chain: Vec<Block>) {
        self.chain = chain;
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
