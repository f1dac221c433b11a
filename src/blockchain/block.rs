use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use super::pow::ProofOfWork;
use super::transaction::Transaction;

/// Upper bound (inclusive) of the random puzzle seed drawn for each block
pub const MAX_SEED: u64 = 999_999_999;

/// Timestamp text used both when hashing and when serializing a block
fn canonical_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn serialize_timestamp<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&canonical_timestamp(timestamp))
}

/// A block that has been built but whose puzzle is not yet solved
///
/// A candidate has no puzzle answer and therefore no hash. The only way to
/// turn it into a [`Block`] is [`CandidateBlock::seal`] or
/// [`CandidateBlock::mine`].
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateBlock {
    prev_hash: String,
    transaction: Transaction,
    timestamp: DateTime<Utc>,
    seed: u64,
}

impl CandidateBlock {
    /// Creates a candidate on top of `prev_hash` with the current time and a
    /// uniformly random puzzle seed
    pub fn new(prev_hash: String, transaction: Transaction) -> Self {
        let seed = rand::thread_rng().gen_range(0..=MAX_SEED);
        Self::with_parts(prev_hash, transaction, Utc::now(), seed)
    }

    /// Creates a candidate from explicit field values
    pub fn with_parts(
        prev_hash: String,
        transaction: Transaction,
        timestamp: DateTime<Utc>,
        seed: u64,
    ) -> Self {
        CandidateBlock {
            prev_hash,
            transaction,
            timestamp,
            seed,
        }
    }

    pub fn prev_hash(&self) -> &str {
        &self.prev_hash
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Freezes the candidate with the given puzzle answer
    pub fn seal(self, puzzle_answer: u64) -> Block {
        Block {
            prev_hash: self.prev_hash,
            transaction: self.transaction,
            timestamp: self.timestamp,
            seed: self.seed,
            puzzle_answer,
        }
    }

    /// Runs the puzzle search over this candidate's seed and seals the result
    pub fn mine(self, pow: &ProofOfWork) -> Block {
        let solution = pow.solve(self.seed);
        self.seal(solution)
    }
}

/// A sealed block
///
/// All fields are private and there are no setters, so a block's hash can
/// only change if a new block is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    prev_hash: String,
    transaction: Transaction,
    #[serde(serialize_with = "serialize_timestamp")]
    timestamp: DateTime<Utc>,
    seed: u64,
    puzzle_answer: u64,
}

impl Block {
    /// Creates the genesis block
    ///
    /// Genesis has an empty predecessor hash, a fixed transaction and is
    /// never mined, so its puzzle answer is zero.
    pub fn genesis() -> Self {
        CandidateBlock::new(String::new(), Transaction::genesis()).seal(0)
    }

    pub fn prev_hash(&self) -> &str {
        &self.prev_hash
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn puzzle_answer(&self) -> u64 {
        self.puzzle_answer
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_empty()
    }

    /// Calculates the hash of the block
    ///
    /// # Returns
    ///
    /// The SHA-256 hash of the block's canonical JSON as a hexadecimal string
    pub fn hash(&self) -> String {
        let block_data = serde_json::json!({
            "prev_hash": self.prev_hash,
            "transaction": self.transaction.canonical_value(),
            "timestamp": canonical_timestamp(&self.timestamp),
            "seed": self.seed,
            "puzzle_answer": self.puzzle_answer,
        });

        let mut hasher = Sha256::new();
        hasher.update(block_data.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Checks that the stored puzzle answer solves the puzzle for this
    /// block's seed. Genesis is admitted unconditionally.
    pub fn verify_proof(&self, pow: &ProofOfWork) -> bool {
        if self.is_genesis() {
            return true;
        }

        self.puzzle_answer >= 1 && pow.is_solution(self.seed, self.puzzle_answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::pow::PuzzleHash;
    use chrono::TimeZone;

    fn candidate() -> CandidateBlock {
        let transaction = Transaction::new(10.0, "alice".into(), "bob".into()).unwrap();
        let timestamp = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
        CandidateBlock::with_parts("previous_hash".to_string(), transaction, timestamp, 777)
    }

    #[test]
    fn test_new_candidate() {
        let transaction = Transaction::new(1.0, "alice".into(), "bob".into()).unwrap();
        let candidate = CandidateBlock::new("abc".to_string(), transaction);

        assert_eq!(candidate.prev_hash(), "abc");
        assert!(candidate.seed() <= MAX_SEED);
    }

    #[test]
    fn test_seal_keeps_fields() {
        let block = candidate().seal(100);

        assert_eq!(block.prev_hash(), "previous_hash");
        assert_eq!(block.seed(), 777);
        assert_eq!(block.puzzle_answer(), 100);
        assert_eq!(block.transaction().amount(), 10.0);
        assert!(!block.is_genesis());
    }

    #[test]
    fn test_hash_is_deterministic() {
        let block = candidate().seal(100);
        let copy = candidate().seal(100);

        assert_eq!(block.hash(), block.hash());
        assert_eq!(block.hash(), copy.hash());
        assert_eq!(block.hash().len(), 64); // SHA-256 hash is 64 characters in hex
    }

    #[test]
    fn test_hash_covers_every_field() {
        let base = candidate().seal(100).hash();

        assert_ne!(base, candidate().seal(101).hash());

        let c = candidate();
        let moved = CandidateBlock::with_parts(
            "other".to_string(),
            c.transaction.clone(),
            c.timestamp,
            c.seed,
        );
        assert_ne!(base, moved.seal(100).hash());

        let c = candidate();
        let reseeded =
            CandidateBlock::with_parts(c.prev_hash.clone(), c.transaction.clone(), c.timestamp, 778);
        assert_ne!(base, reseeded.seal(100).hash());

        let c = candidate();
        let later = CandidateBlock::with_parts(
            c.prev_hash.clone(),
            c.transaction.clone(),
            c.timestamp + chrono::Duration::milliseconds(1),
            c.seed,
        );
        assert_ne!(base, later.seal(100).hash());
    }

    #[test]
    fn test_serialized_timestamp_matches_hash_input() {
        let block = candidate().seal(100);
        let value = serde_json::to_value(&block).unwrap();

        assert_eq!(value["timestamp"], "2023-01-01T12:00:00.000000000Z");
        assert_eq!(value["transaction"]["payer"], "alice");
        assert_eq!(value["puzzle_answer"], 100);
    }

    #[test]
    fn test_mine_sets_valid_answer() {
        let pow = ProofOfWork::new(PuzzleHash::Blake3, 3);
        let block = candidate().mine(&pow);

        assert!(block.puzzle_answer() >= 1);
        assert!(block.verify_proof(&pow));
        assert!(!candidate().seal(0).verify_proof(&pow));
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis();
        let pow = ProofOfWork::default();

        assert!(genesis.is_genesis());
        assert_eq!(genesis.prev_hash(), "");
        assert_eq!(genesis.transaction().amount(), 100.0);
        assert_eq!(genesis.transaction().payer().as_str(), "genesis");
        assert_eq!(genesis.transaction().payee().as_str(), "godwin");
        assert!(genesis.verify_proof(&pow));
    }
}
