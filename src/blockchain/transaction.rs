use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::crypto::Address;

/// Errors that can occur during transaction operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// A transfer of `amount` from `payer` to `payee`
///
/// Transactions are immutable once built. No balance, sign or range checks
/// are applied to the amount; the only constraint is that it is finite, so
/// the canonical encoding is always a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    amount: f64,
    payer: Address,
    payee: Address,
}

impl Transaction {
    /// Creates a new transaction
    ///
    /// # Arguments
    ///
    /// * `amount` - The amount to transfer, any finite value
    /// * `payer` - The public key of the paying account
    /// * `payee` - The public key of the receiving account
    pub fn new(amount: f64, payer: Address, payee: Address) -> Result<Self, TransactionError> {
        if !amount.is_finite() {
            return Err(TransactionError::InvalidAmount(format!(
                "Amount must be finite: {}",
                amount
            )));
        }

        Ok(Transaction {
            amount,
            payer,
            payee,
        })
    }

    /// The fixed transaction held by the genesis block
    pub(crate) fn genesis() -> Self {
        Transaction {
            amount: 100.0,
            payer: Address::from("genesis"),
            payee: Address::from("godwin"),
        }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn payer(&self) -> &Address {
        &self.payer
    }

    pub fn payee(&self) -> &Address {
        &self.payee
    }

    /// The canonical JSON form, keys in the order `amount`, `payer`, `payee`
    pub fn canonical_value(&self) -> Value {
        serde_json::json!({
            "amount": self.amount,
            "payer": self.payer.0,
            "payee": self.payee.0,
        })
    }

    /// Serializes the transaction into the bytes that are signed and verified
    pub fn serialize(&self) -> Vec<u8> {
        self.canonical_value().to_string().into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::crypto::KeyPair;

    #[test]
    fn test_new_transaction() {
        let payer = KeyPair::generate();
        let payee = KeyPair::generate();

        let transaction =
            Transaction::new(10.5, payer.address().clone(), payee.address().clone()).unwrap();

        assert_eq!(transaction.amount(), 10.5);
        assert_eq!(transaction.payer(), payer.address());
        assert_eq!(transaction.payee(), payee.address());
    }

    #[test]
    fn test_amount_is_not_range_checked() {
        let transaction = Transaction::new(-42.0, "alice".into(), "bob".into()).unwrap();
        assert_eq!(transaction.amount(), -42.0);

        let transaction = Transaction::new(0.0, "alice".into(), "alice".into()).unwrap();
        assert_eq!(transaction.payer(), transaction.payee());
    }

    #[test]
    fn test_non_finite_amount_rejected() {
        for amount in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = Transaction::new(amount, "alice".into(), "bob".into());
            assert!(matches!(result, Err(TransactionError::InvalidAmount(_))));
        }
    }

    #[test]
    fn test_serialize_field_order() {
        let transaction = Transaction::new(50.0, "alice".into(), "bob".into()).unwrap();
        let encoded = String::from_utf8(transaction.serialize()).unwrap();

        assert_eq!(encoded, r#"{"amount":50.0,"payer":"alice","payee":"bob"}"#);
    }

    #[test]
    fn test_serialize_is_stable() {
        let first = Transaction::new(23.0, "alice".into(), "bob".into()).unwrap();
        let second = Transaction::new(23.0, "alice".into(), "bob".into()).unwrap();

        assert_eq!(first.serialize(), first.serialize());
        assert_eq!(first.serialize(), second.serialize());

        let swapped = Transaction::new(23.0, "bob".into(), "alice".into()).unwrap();
        assert_ne!(first.serialize(), swapped.serialize());
    }
}
