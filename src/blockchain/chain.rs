use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use serde::Serialize;
use thiserror::Error;
use log::{debug, info, warn};

use super::block::{Block, CandidateBlock};
use super::config::{ChainConfig, ConfigError};
use super::crypto::{verify_signature, Address, DigitalSignature};
use super::pow::ProofOfWork;
use super::transaction::Transaction;

/// Errors found while validating the chain
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockchainError {
    #[error("Invalid genesis block")]
    InvalidGenesis,

    #[error("Block {index} does not link to its predecessor")]
    BrokenLink { index: usize },

    #[error("Block {index} has an invalid proof of work")]
    InvalidProof { index: usize },
}

/// Why a submitted transaction was not admitted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("signature does not match the transaction")]
    InvalidSignature,

    #[error("public key could not be decoded: {0}")]
    MalformedPublicKey(String),

    #[error("signature could not be decoded: {0}")]
    MalformedSignature(String),

    #[error("payer does not match the signing key")]
    PayerMismatch,
}

/// Outcome of [`Ledger::add_block`]
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// The transaction was verified, mined and appended as this block
    Accepted(Block),

    /// The transaction was dropped and the chain is unchanged
    Rejected(Rejection),
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted(_))
    }

    pub fn block(&self) -> Option<&Block> {
        match self {
            Admission::Accepted(block) => Some(block),
            Admission::Rejected(_) => None,
        }
    }
}

impl fmt::Display for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Admission::Accepted(block) => write!(
                f,
                "confirmed in block {} with solution {}",
                block.hash(),
                block.puzzle_answer()
            ),
            Admission::Rejected(rejection) => write!(f, "rejected, {}", rejection),
        }
    }
}

/// Every block of a ledger together with its hash
#[derive(Debug, Clone, Serialize)]
pub struct ChainReport {
    pub blocks: Vec<BlockReport>,
}

/// A block as it appears in a [`ChainReport`]
#[derive(Debug, Clone, Serialize)]
pub struct BlockReport {
    pub hash: String,

    #[serde(flatten)]
    pub block: Block,
}

/// The ledger
///
/// `Ledger` is a handle: clones share the same chain. Every admission holds
/// the chain lock from reading the tip until the new block is appended, so
/// blocks are added one at a time and each links to the block before it.
#[derive(Debug, Clone)]
pub struct Ledger {
    /// The chain of blocks, never empty
    chain: Arc<Mutex<Vec<Block>>>,

    /// Admission puzzle
    pow: ProofOfWork,

    /// Reject transactions whose payer is not the verifying key
    enforce_payer_key: bool,
}

impl Ledger {
    /// Creates a new ledger with the default configuration
    pub fn new() -> Self {
        Self::from_parts(&ChainConfig::default())
    }

    /// Creates a new ledger with the given configuration
    pub fn with_config(config: ChainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(&config))
    }

    fn from_parts(config: &ChainConfig) -> Self {
        let genesis = Block::genesis();
        debug!("Created genesis block {}", genesis.hash());

        Ledger {
            chain: Arc::new(Mutex::new(vec![genesis])),
            pow: ProofOfWork::from_config(config),
            enforce_payer_key: config.enforce_payer_key,
        }
    }

    /// Blocks are only pushed once fully mined, so a poisoned lock still
    /// guards a consistent chain.
    fn lock(&self) -> MutexGuard<'_, Vec<Block>> {
        self.chain.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn proof_of_work(&self) -> &ProofOfWork {
        &self.pow
    }

    /// Gets the last block in the chain
    pub fn last_block(&self) -> Block {
        let chain = self.lock();
        chain[chain.len() - 1].clone()
    }

    /// Gets the first block in the chain
    pub fn genesis(&self) -> Block {
        self.lock()[0].clone()
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Always false: the genesis block is present from construction
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Gets a copy of the entire chain
    pub fn blocks(&self) -> Vec<Block> {
        self.lock().clone()
    }

    /// Verifies, mines and appends a transaction
    ///
    /// # Arguments
    ///
    /// * `transaction` - The transaction to admit
    /// * `sender_public_key` - The key the signature is checked against
    /// * `signature` - Signature over the transaction's canonical bytes
    ///
    /// # Returns
    ///
    /// `Admission::Accepted` with the appended block, or
    /// `Admission::Rejected` with the chain left untouched
    pub fn add_block(
        &self,
        transaction: Transaction,
        sender_public_key: &Address,
        signature: &DigitalSignature,
    ) -> Admission {
        info!("Sending {} from {}", transaction.amount(), transaction.payer());

        if let Err(rejection) = self.verify(&transaction, sender_public_key, signature) {
            warn!("Transaction rejected: {}", rejection);
            return Admission::Rejected(rejection);
        }

        info!("Transaction is valid");

        let mut chain = self.lock();
        let prev_hash = chain[chain.len() - 1].hash();
        let candidate = CandidateBlock::new(prev_hash, transaction);

        info!("Mining transaction with seed {}", candidate.seed());
        let block = candidate.mine(&self.pow);
        info!(
            "Solved transaction with solution {}, block is confirmed",
            block.puzzle_answer()
        );

        chain.push(block.clone());
        debug!("Chain length is now {}", chain.len());

        Admission::Accepted(block)
    }

    fn verify(
        &self,
        transaction: &Transaction,
        sender_public_key: &Address,
        signature: &DigitalSignature,
    ) -> Result<(), Rejection> {
        if self.enforce_payer_key && transaction.payer() != sender_public_key {
            return Err(Rejection::PayerMismatch);
        }

        let public_key = sender_public_key
            .to_public_key()
            .map_err(|e| Rejection::MalformedPublicKey(e.to_string()))?;

        let valid = verify_signature(&transaction.serialize(), signature, &public_key)
            .map_err(|e| Rejection::MalformedSignature(e.to_string()))?;

        if valid {
            Ok(())
        } else {
            Err(Rejection::InvalidSignature)
        }
    }

    /// Validates the blockchain
    ///
    /// Checks that genesis is in place and that every later block links to
    /// its predecessor and carries a valid proof of work.
    pub fn validate(&self) -> Result<(), BlockchainError> {
        Self::validate_blocks(&self.lock(), &self.pow)
    }

    /// true if [`Ledger::validate`] succeeds
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    fn validate_blocks(chain: &[Block], pow: &ProofOfWork) -> Result<(), BlockchainError> {
        match chain.first() {
            Some(genesis) if genesis.is_genesis() => {}
            _ => return Err(BlockchainError::InvalidGenesis),
        }

        for i in 1..chain.len() {
            let current_block = &chain[i];
            let previous_block = &chain[i - 1];

            if current_block.prev_hash() != previous_block.hash() {
                return Err(BlockchainError::BrokenLink { index: i });
            }

            if current_block.is_genesis() || !current_block.verify_proof(pow) {
                return Err(BlockchainError::InvalidProof { index: i });
            }
        }

        Ok(())
    }

    /// Read-only dump of the full chain for inspection
    pub fn report(&self) -> ChainReport {
        let blocks = self
            .lock()
            .iter()
            .map(|block| BlockReport {
                hash: block.hash(),
                block: block.clone(),
            })
            .collect();

        ChainReport { blocks }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
