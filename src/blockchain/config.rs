use serde::Deserialize;
use thiserror::Error;

use std::env;

use super::pow::PuzzleHash;

/// Longest zero prefix a 256-bit hex digest can have
pub const MAX_DIFFICULTY: usize = 64;

const DIFFICULTY_VAR: &str = "LEDGER_DIFFICULTY";
const PUZZLE_HASH_VAR: &str = "LEDGER_PUZZLE_HASH";
const ENFORCE_PAYER_KEY_VAR: &str = "LEDGER_ENFORCE_PAYER_KEY";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Difficulty {0} exceeds the maximum of 64")]
    DifficultyTooHigh(usize),

    #[error("Unknown puzzle hash: {0}")]
    UnknownPuzzleHash(String),
}

/// Ledger parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainConfig {
    /// Number of leading hex zeros the puzzle digest must have
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,

    /// Digest used by the proof-of-work search
    #[serde(default)]
    pub puzzle_hash: PuzzleHash,

    /// Reject transactions whose payer differs from the verifying key
    #[serde(default)]
    pub enforce_payer_key: bool,
}

fn default_difficulty() -> usize {
    4
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            difficulty: default_difficulty(),
            puzzle_hash: PuzzleHash::default(),
            enforce_payer_key: false,
        }
    }
}

impl ChainConfig {
    /// Builds a configuration from `LEDGER_*` environment variables
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = ChainConfig::default();

        if let Some(value) = lookup(DIFFICULTY_VAR) {
            config.difficulty = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: DIFFICULTY_VAR,
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup(PUZZLE_HASH_VAR) {
            config.puzzle_hash = value.parse()?;
        }

        if let Some(value) = lookup(ENFORCE_PAYER_KEY_VAR) {
            config.enforce_payer_key =
                value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    var: ENFORCE_PAYER_KEY_VAR,
                    value: value.clone(),
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_difficulty(mut self, difficulty: usize) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_puzzle_hash(mut self, puzzle_hash: PuzzleHash) -> Self {
        self.puzzle_hash = puzzle_hash;
        self
    }

    pub fn with_enforce_payer_key(mut self, enforce: bool) -> Self {
        self.enforce_payer_key = enforce;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::DifficultyTooHigh(self.difficulty));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ChainConfig::default();

        assert_eq!(config.difficulty, 4);
        assert_eq!(config.puzzle_hash, PuzzleHash::Blake3);
        assert!(!config.enforce_payer_key);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ChainConfig::from_lookup(lookup_from(&[
            (DIFFICULTY_VAR, "2"),
            (PUZZLE_HASH_VAR, "sha256"),
            (ENFORCE_PAYER_KEY_VAR, "true"),
        ]))
        .unwrap();

        assert_eq!(config.difficulty, 2);
        assert_eq!(config.puzzle_hash, PuzzleHash::Sha256);
        assert!(config.enforce_payer_key);
    }

    #[test]
    fn test_from_lookup_empty_is_default() {
        let config = ChainConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ChainConfig::default());
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let result = ChainConfig::from_lookup(lookup_from(&[(DIFFICULTY_VAR, "four")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = ChainConfig::from_lookup(lookup_from(&[(DIFFICULTY_VAR, "65")]));
        assert!(matches!(result, Err(ConfigError::DifficultyTooHigh(65))));

        let result = ChainConfig::from_lookup(lookup_from(&[(PUZZLE_HASH_VAR, "md5")]));
        assert!(matches!(result, Err(ConfigError::UnknownPuzzleHash(_))));

        let result = ChainConfig::from_lookup(lookup_from(&[(ENFORCE_PAYER_KEY_VAR, "yes")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ChainConfig = serde_json::from_str(r#"{"puzzle_hash": "sha256"}"#).unwrap();

        assert_eq!(config.difficulty, 4);
        assert_eq!(config.puzzle_hash, PuzzleHash::Sha256);
        assert!(!config.enforce_payer_key);
    }
}
