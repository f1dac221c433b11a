use serde::Deserialize;
use sha2::{Digest, Sha256};

use std::fmt;
use std::str::FromStr;

use log::debug;

use super::config::{ChainConfig, ConfigError};

/// Digest used by the proof-of-work puzzle
///
/// This is independent of the SHA-256 content hash that links blocks. The
/// puzzle only needs a fast, well-distributed function, so BLAKE3 is the
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PuzzleHash {
    #[default]
    Blake3,
    Sha256,
}

impl PuzzleHash {
    /// Hashes `input` and returns the lowercase hex digest
    pub fn digest_hex(&self, input: &[u8]) -> String {
        match self {
            PuzzleHash::Blake3 => blake3::hash(input).to_hex().to_string(),
            PuzzleHash::Sha256 => hex::encode(Sha256::digest(input)),
        }
    }
}

impl fmt::Display for PuzzleHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PuzzleHash::Blake3 => write!(f, "blake3"),
            PuzzleHash::Sha256 => write!(f, "sha256"),
        }
    }
}

impl FromStr for PuzzleHash {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blake3" => Ok(PuzzleHash::Blake3),
            "sha256" => Ok(PuzzleHash::Sha256),
            other => Err(ConfigError::UnknownPuzzleHash(other.to_string())),
        }
    }
}

/// The admission puzzle
///
/// For a seed `s`, the answer is the smallest `solution >= 1` such that the
/// hex digest of the decimal string of `s + solution` starts with
/// `difficulty` zeros.
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    hash: PuzzleHash,
    difficulty: usize,
    target: String,
}

impl ProofOfWork {
    pub fn new(hash: PuzzleHash, difficulty: usize) -> Self {
        ProofOfWork {
            hash,
            difficulty,
            target: "0".repeat(difficulty),
        }
    }

    pub fn from_config(config: &ChainConfig) -> Self {
        Self::new(config.puzzle_hash, config.difficulty)
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn hash(&self) -> PuzzleHash {
        self.hash
    }

    /// Hashes the decimal form of `seed + trial`
    ///
    /// The sum is widened so it cannot overflow for any pair of inputs.
    pub fn attempt(&self, seed: u64, trial: u64) -> String {
        let input = (u128::from(seed) + u128::from(trial)).to_string();
        self.hash.digest_hex(input.as_bytes())
    }

    /// Checks whether `trial` satisfies the puzzle for `seed`
    pub fn is_solution(&self, seed: u64, trial: u64) -> bool {
        self.attempt(seed, trial).starts_with(&self.target)
    }

    /// Searches sequentially from 1 until a solution is found
    ///
    /// Blocks the calling thread; there is no upper bound on the search.
    pub fn solve(&self, seed: u64) -> u64 {
        let mut solution = 1;

        loop {
            if self.is_solution(seed, solution) {
                debug!(
                    "Solved puzzle for seed {} after {} attempts",
                    seed, solution
                );
                return solution;
            }

            solution += 1;
        }
    }
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self::from_config(&ChainConfig::default())
    }
}
