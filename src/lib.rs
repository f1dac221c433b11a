//! An in-memory ledger of single-transaction blocks, linked by SHA-256
//! content hashes, authenticated with Ed25519 signatures and admitted
//! through a proof-of-work puzzle.

pub mod blockchain;
