use std::sync::{Arc, Mutex};

use log::{debug, info};
use thiserror::Error;

use super::block::Block;
use super::hash::block_digest;
use super::pow::{ProofOfWork, DEFAULT_TARGET_PREFIX};
use super::transaction::Transaction;

/// Proof carried by the genesis block
pub const GENESIS_PROOF: u64 = 100;

/// Previous-hash sentinel carried by the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Invalid proof {proof} for last proof {last_proof}")]
    InvalidProof { last_proof: u64, proof: u64 },
}

/// Represents the blockchain
///
/// Owns the committed chain and the pool of pending transactions. The chain
/// always starts with a deterministic genesis block, so the last block is
/// always defined.
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks
    chain: Arc<Mutex<Vec<Block>>>,

    /// Pending transactions to be included in the next block
    pending_transactions: Arc<Mutex<Vec<Transaction>>>,

    /// Proof-of-work engine used to validate commits
    pow: ProofOfWork,
}

impl Blockchain {
    /// Creates a new blockchain with a genesis block and the default
    /// difficulty target
    pub fn new() -> Self {
        Blockchain::with_target(DEFAULT_TARGET_PREFIX)
    }

    /// Creates a new blockchain with a genesis block and the given
    /// difficulty target
    ///
    /// # Arguments
    ///
    /// * `target_prefix` - The hex prefix required of valid proof digests
    pub fn with_target(target_prefix: impl Into<String>) -> Self {
        let blockchain = Blockchain {
            chain: Arc::new(Mutex::new(Vec::new())),
            pending_transactions: Arc::new(Mutex::new(Vec::new())),
            pow: ProofOfWork::new(target_prefix),
        };

        blockchain.create_genesis_block();

        blockchain
    }

    /// Creates the genesis block (first block in the chain)
    fn create_genesis_block(&self) {
        let genesis_block = Block::new(
            1,
            Vec::new(),
            GENESIS_PROOF,
            GENESIS_PREVIOUS_HASH.to_string(),
        );

        self.chain.lock().unwrap().push(genesis_block);
    }

    /// The proof-of-work engine this chain validates commits with
    pub fn proof_of_work(&self) -> &ProofOfWork {
        &self.pow
    }

    /// Adds a new transaction to the pending pool
    ///
    /// # Arguments
    ///
    /// * `sender` - The address of the sender
    /// * `recipient` - The address of the recipient
    /// * `amount` - The amount to transfer
    ///
    /// # Returns
    ///
    /// The index of the block that will include this transaction
    pub fn new_transaction(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: u64,
    ) -> u64 {
        let transaction = Transaction::new(sender, recipient, amount);

        // Lock order is chain then pool, matching new_block
        let chain = self.chain.lock().unwrap();
        let mut pending = self.pending_transactions.lock().unwrap();

        debug!(
            "Queued transaction {} -> {} ({})",
            transaction.sender, transaction.recipient, transaction.amount
        );
        pending.push(transaction);

        chain.len() as u64 + 1
    }

    /// Commits a new block carrying the entire pending pool
    ///
    /// The proof is re-validated against the last block's proof before
    /// anything is moved, so an unproven block can never enter the chain.
    ///
    /// # Arguments
    ///
    /// * `proof` - The proof found for the last block's proof
    /// * `previous_hash` - Link to the previous block; computed from the
    ///   last block when not supplied
    ///
    /// # Returns
    ///
    /// Result with the newly committed block
    pub fn new_block(
        &self,
        proof: u64,
        previous_hash: Option<String>,
    ) -> Result<Block, BlockchainError> {
        let mut chain = self.chain.lock().unwrap();
        let mut pending = self.pending_transactions.lock().unwrap();

        // Genesis is seeded in the constructor, so the chain is never empty
        let last_block = chain.last().unwrap();

        if !self.pow.valid_proof(last_block.proof, proof) {
            return Err(BlockchainError::InvalidProof {
                last_proof: last_block.proof,
                proof,
            });
        }

        let previous_hash = previous_hash.unwrap_or_else(|| block_digest(last_block));
        let transactions = std::mem::take(&mut *pending);

        let block = Block::new(chain.len() as u64 + 1, transactions, proof, previous_hash);
        chain.push(block.clone());

        info!(
            "Committed block {} with {} transactions",
            block.index,
            block.transactions.len()
        );

        Ok(block)
    }

    /// Gets the last block in the chain
    ///
    /// # Returns
    ///
    /// The most recently committed block
    pub fn last_block(&self) -> Block {
        let chain = self.chain.lock().unwrap();
        chain.last().unwrap().clone()
    }

    /// Computes the canonical digest of a block
    ///
    /// # Arguments
    ///
    /// * `block` - The block to hash
    ///
    /// # Returns
    ///
    /// The hex-encoded digest of the block
    pub fn hash(block: &Block) -> String {
        block_digest(block)
    }

    /// Gets the entire blockchain
    ///
    /// # Returns
    ///
    /// A vector of all blocks in the chain
    pub fn chain(&self) -> Vec<Block> {
        self.chain.lock().unwrap().clone()
    }

    /// Gets the number of committed blocks
    pub fn len(&self) -> usize {
        self.chain.lock().unwrap().len()
    }

    /// Gets all pending transactions
    ///
    /// # Returns
    ///
    /// A vector of all transactions awaiting inclusion in the next block
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.pending_transactions.lock().unwrap().clone()
    }

    /// Validates the blockchain
    ///
    /// Checks the hash linkage and the proof-of-work predicate for every
    /// adjacent pair of blocks.
    ///
    /// # Returns
    ///
    /// true if the blockchain is valid, false otherwise
    pub fn is_valid(&self) -> bool {
        let chain = self.chain.lock().unwrap();

        for i in 1..chain.len() {
            let current_block = &chain[i];
            let previous_block = &chain[i - 1];

            // Check if the previous hash is correct
            if current_block.previous_hash != block_digest(previous_block) {
                return false;
            }

            // Check if the proof satisfies the difficulty target
            if !self.pow.valid_proof(previous_block.proof, current_block.proof) {
                return false;
            }
        }

        true
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Blockchain::new()
    }
}
