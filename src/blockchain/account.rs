use super::chain::{Admission, Ledger};
use super::crypto::{Address, DigitalSignature, KeyPair};
use super::transaction::{Transaction, TransactionError};

/// A participant holding a key pair
///
/// Only the public key and signatures ever leave an account.
#[derive(Debug, Clone)]
pub struct Account {
    keys: KeyPair,
}

impl Account {
    /// Creates an account with a freshly generated key pair
    pub fn new() -> Self {
        Account {
            keys: KeyPair::generate(),
        }
    }

    /// The account's public key in text form
    pub fn public_key(&self) -> &Address {
        self.keys.address()
    }

    /// Signs a transaction's canonical serialization
    pub fn sign(&self, transaction: &Transaction) -> DigitalSignature {
        self.keys.sign(&transaction.serialize())
    }

    /// Sends `amount` to `payee` through the ledger
    ///
    /// # Arguments
    ///
    /// * `amount` - The amount to send
    /// * `payee` - The public key of the receiving account
    /// * `ledger` - The ledger to submit the signed transaction to
    ///
    /// # Returns
    ///
    /// The ledger's admission outcome, or an error if the transaction
    /// could not be built
    pub fn transfer(
        &self,
        amount: f64,
        payee: &Address,
        ledger: &Ledger,
    ) -> Result<Admission, TransactionError> {
        let transaction = Transaction::new(amount, self.public_key().clone(), payee.clone())?;
        let signature = self.sign(&transaction);

        Ok(ledger.add_block(transaction, self.public_key(), &signature))
    }
}

impl Default for Account {
    fn default() -> Self {
        Self::new()
    }
}
