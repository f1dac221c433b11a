// Blockchain module
//
// This module contains the ledger implementation including:
// - Key pairs and signatures
// - Transaction structure
// - Candidate and sealed blocks
// - Proof of work puzzle
// - The ledger itself
// - Accounts that sign and submit transfers

pub mod account;
pub mod block;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod pow;
pub mod transaction;

// Re-export main components for easier access
pub use account::Account;
pub use block::{Block, CandidateBlock};
pub use chain::{Admission, BlockReport, BlockchainError, ChainReport, Ledger, Rejection};
pub use config::{ChainConfig, ConfigError};
pub use crypto::{Address, DigitalSignature, KeyPair};
pub use pow::{ProofOfWork, PuzzleHash};
pub use transaction::{Transaction, TransactionError};
