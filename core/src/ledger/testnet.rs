//! # Simulated Test Network
//!
//! An in-process stand-in for the hosted test network the platform issues
//! credentials against. It keeps accounts and transactions in concurrent
//! maps and applies the same operation semantics the real network would:
//! accounts must exist before they can act, assets require a trustline
//! before they can be held, and data entries obey the 64-byte value budget.
//!
//! The ledger is shared across request handlers via `Arc<TestnetLedger>` —
//! dashmap gives us lock-free concurrent reads without external
//! synchronization.

use dashmap::DashMap;
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::transaction::{Asset, LedgerTransaction, Operation};
use crate::config;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by ledger submission and lookups.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The submitting account does not exist on the ledger.
    #[error("source account not found: {0}")]
    SourceAccountNotFound(String),

    /// An operation referenced an account that does not exist.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// A create-account operation targeted an existing address.
    #[error("account already exists: {0}")]
    AccountAlreadyExists(String),

    /// A data entry value exceeded the channel budget.
    #[error("data entry '{name}' is {len} bytes, budget is {budget}")]
    DataEntryTooLarge {
        /// The entry name.
        name: String,
        /// Actual value length in bytes.
        len: usize,
        /// The enforced budget.
        budget: usize,
    },

    /// A text memo exceeded the memo budget.
    #[error("memo is {len} bytes, budget is {budget}")]
    MemoTooLarge {
        /// Actual memo length in bytes.
        len: usize,
        /// The enforced budget.
        budget: usize,
    },
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Balance in a single non-native asset. A zero-amount entry still counts
/// as an open trustline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBalance {
    /// The asset.
    pub asset: Asset,
    /// Held amount, in the asset's smallest unit.
    pub amount: u64,
}

/// An account as recorded on the simulated ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// The account address.
    pub address: String,
    /// Native balance, in stroops.
    pub native_balance: u64,
    /// Non-native asset balances (presence = open trustline).
    pub asset_balances: Vec<AssetBalance>,
    /// Named data entries attached via manage-data operations.
    pub data_entries: HashMap<String, String>,
    /// Number of transactions this account has submitted.
    pub sequence: u64,
}

impl AccountRecord {
    fn new(address: &str, native_balance: u64) -> Self {
        Self {
            address: address.to_string(),
            native_balance,
            asset_balances: Vec::new(),
            data_entries: HashMap::new(),
            sequence: 0,
        }
    }

    /// Returns the balance entry for an asset code, if a trustline exists.
    pub fn asset_balance(&self, code: &str) -> Option<&AssetBalance> {
        self.asset_balances.iter().find(|b| b.asset.code == code)
    }

    /// Whether the account holds a trustline for the asset code.
    pub fn has_trustline(&self, code: &str) -> bool {
        self.asset_balance(code).is_some()
    }
}

/// An Ed25519 keypair for a test account. The secret seed is hex-encoded;
/// the address is `EDU` followed by the base58 of the verifying key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestKeypair {
    /// Public address.
    pub address: String,
    /// Hex-encoded 32-byte secret seed. Test networks only.
    pub secret_seed: String,
}

// ---------------------------------------------------------------------------
// TestnetLedger
// ---------------------------------------------------------------------------

/// The simulated test network.
#[derive(Debug, Default)]
pub struct TestnetLedger {
    accounts: DashMap<String, AccountRecord>,
    transactions: DashMap<String, LedgerTransaction>,
}

impl TestnetLedger {
    /// Creates an empty ledger with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger with the platform issuer and credential contract
    /// accounts funded — the state every deployment starts from.
    pub fn bootstrap() -> Self {
        let ledger = Self::new();
        ledger.fund_account(config::PLATFORM_ISSUER_ADDRESS);
        ledger.fund_account(config::CREDENTIAL_CONTRACT_ID);
        tracing::info!(
            issuer = config::PLATFORM_ISSUER_ADDRESS,
            contract = config::CREDENTIAL_CONTRACT_ID,
            "testnet ledger bootstrapped"
        );
        ledger
    }

    // -- accounts ----------------------------------------------------------

    /// Friendbot: creates the account if needed and credits the standard
    /// starting balance. Idempotent in effect — refunding an account just
    /// tops it up again.
    pub fn fund_account(&self, address: &str) {
        self.accounts
            .entry(address.to_string())
            .and_modify(|acct| acct.native_balance += config::FRIENDBOT_STARTING_BALANCE)
            .or_insert_with(|| {
                AccountRecord::new(address, config::FRIENDBOT_STARTING_BALANCE)
            });
        tracing::debug!(address, "account funded");
    }

    /// Whether an account exists on the ledger.
    pub fn account_exists(&self, address: &str) -> bool {
        self.accounts.contains_key(address)
    }

    /// Loads an account snapshot, if it exists.
    pub fn load_account(&self, address: &str) -> Option<AccountRecord> {
        self.accounts.get(address).map(|a| a.clone())
    }

    /// Next sequence number for transactions from `address`.
    pub fn sequence_for(&self, address: &str) -> u64 {
        self.accounts
            .get(address)
            .map(|a| a.sequence + 1)
            .unwrap_or(1)
    }

    /// Number of accounts on the ledger.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    // -- keypairs ----------------------------------------------------------

    /// Generates a fresh Ed25519 keypair with a platform-style address.
    pub fn generate_keypair() -> TestKeypair {
        let mut csprng = rand::rngs::OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let verifying_key = signing_key.verifying_key();
        TestKeypair {
            address: format!("EDU{}", bs58::encode(verifying_key.to_bytes()).into_string()),
            secret_seed: hex::encode(signing_key.to_bytes()),
        }
    }

    /// Generates a keypair and funds it via friendbot. The test-network
    /// equivalent of "create me an account I can play with".
    pub fn create_test_account(&self) -> TestKeypair {
        let pair = Self::generate_keypair();
        self.fund_account(&pair.address);
        pair
    }

    // -- transactions ------------------------------------------------------

    /// Submits a transaction: validates budgets, applies every operation in
    /// order, charges the fee, and records the transaction under its hash.
    ///
    /// Validation happens before any state change, so a rejected
    /// transaction leaves the ledger untouched.
    pub fn submit(&self, tx: LedgerTransaction) -> Result<String, LedgerError> {
        if !self.account_exists(&tx.source) {
            return Err(LedgerError::SourceAccountNotFound(tx.source));
        }

        if let Some(ref memo) = tx.memo {
            if memo.len() > config::MEMO_TEXT_BUDGET {
                return Err(LedgerError::MemoTooLarge {
                    len: memo.len(),
                    budget: config::MEMO_TEXT_BUDGET,
                });
            }
        }

        for op in &tx.operations {
            self.validate_operation(&tx.source, op)?;
        }

        for op in &tx.operations {
            self.apply_operation(&tx.source, op);
        }

        if let Some(mut source) = self.accounts.get_mut(&tx.source) {
            source.native_balance = source.native_balance.saturating_sub(tx.fee);
            source.sequence += 1;
        }

        let hash = tx.id.clone();
        tracing::info!(
            hash = %hash,
            source = %tx.source,
            ops = tx.operations.len(),
            "transaction recorded"
        );
        self.transactions.insert(hash.clone(), tx);
        Ok(hash)
    }

    /// Looks up a recorded transaction by hash.
    pub fn transaction(&self, hash: &str) -> Option<LedgerTransaction> {
        self.transactions.get(hash).map(|t| t.clone())
    }

    /// Number of recorded transactions.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    // -- operation semantics ----------------------------------------------

    fn validate_operation(&self, tx_source: &str, op: &Operation) -> Result<(), LedgerError> {
        match op {
            Operation::CreateAccount { destination, .. } => {
                if self.account_exists(destination) {
                    return Err(LedgerError::AccountAlreadyExists(destination.clone()));
                }
                Ok(())
            }
            // The trusting account may be created earlier in the same
            // transaction, so existence is resolved at apply time.
            Operation::ChangeTrust { .. } => Ok(()),
            Operation::Payment {
                destination: _,
                asset: _,
                amount: _,
                source,
            } => {
                if !self.account_exists(source) && source != tx_source {
                    return Err(LedgerError::AccountNotFound(source.clone()));
                }
                Ok(())
            }
            Operation::ManageData { name, value } => {
                if value.len() > config::MANAGE_DATA_VALUE_BUDGET {
                    return Err(LedgerError::DataEntryTooLarge {
                        name: name.clone(),
                        len: value.len(),
                        budget: config::MANAGE_DATA_VALUE_BUDGET,
                    });
                }
                Ok(())
            }
        }
    }

    fn apply_operation(&self, tx_source: &str, op: &Operation) {
        match op {
            Operation::CreateAccount {
                destination,
                starting_balance,
            } => {
                self.accounts.insert(
                    destination.clone(),
                    AccountRecord::new(destination, *starting_balance),
                );
            }
            Operation::ChangeTrust { asset, source } => {
                if let Some(mut acct) = self.accounts.get_mut(source) {
                    if !acct.has_trustline(&asset.code) {
                        acct.asset_balances.push(AssetBalance {
                            asset: asset.clone(),
                            amount: 0,
                        });
                    }
                }
            }
            Operation::Payment {
                destination,
                asset,
                amount,
                source,
            } => {
                // The issuer mints on payment; anyone else spends balance.
                if source != &asset.issuer {
                    if let Some(mut acct) = self.accounts.get_mut(source) {
                        if let Some(bal) = acct
                            .asset_balances
                            .iter_mut()
                            .find(|b| b.asset.code == asset.code)
                        {
                            bal.amount = bal.amount.saturating_sub(*amount);
                        }
                    }
                }
                if let Some(mut acct) = self.accounts.get_mut(destination) {
                    if let Some(bal) = acct
                        .asset_balances
                        .iter_mut()
                        .find(|b| b.asset.code == asset.code)
                    {
                        bal.amount += *amount;
                    }
                }
            }
            Operation::ManageData { name, value } => {
                if let Some(mut acct) = self.accounts.get_mut(tx_source) {
                    acct.data_entries.insert(name.clone(), value.clone());
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::transaction::TransactionBuilder;

    fn funded_ledger() -> TestnetLedger {
        let ledger = TestnetLedger::new();
        ledger.fund_account("EDUALICE");
        ledger
    }

    #[test]
    fn bootstrap_funds_platform_accounts() {
        let ledger = TestnetLedger::bootstrap();
        assert!(ledger.account_exists(config::PLATFORM_ISSUER_ADDRESS));
        assert!(ledger.account_exists(config::CREDENTIAL_CONTRACT_ID));
    }

    #[test]
    fn fund_account_creates_and_tops_up() {
        let ledger = TestnetLedger::new();
        ledger.fund_account("EDUALICE");
        let first = ledger.load_account("EDUALICE").unwrap().native_balance;
        ledger.fund_account("EDUALICE");
        let second = ledger.load_account("EDUALICE").unwrap().native_balance;
        assert_eq!(second, first * 2);
    }

    #[test]
    fn generated_keypairs_are_unique() {
        let a = TestnetLedger::generate_keypair();
        let b = TestnetLedger::generate_keypair();
        assert_ne!(a.address, b.address);
        assert!(a.address.starts_with("EDU"));
        assert_eq!(a.secret_seed.len(), 64); // 32-byte seed, hex-encoded
    }

    #[test]
    fn create_test_account_is_funded() {
        let ledger = TestnetLedger::new();
        let pair = ledger.create_test_account();
        let acct = ledger.load_account(&pair.address).unwrap();
        assert_eq!(acct.native_balance, config::FRIENDBOT_STARTING_BALANCE);
    }

    #[test]
    fn submit_from_unknown_source_rejected() {
        let ledger = TestnetLedger::new();
        let tx = TransactionBuilder::new("EDUGHOST").build();
        let result = ledger.submit(tx);
        assert!(matches!(result, Err(LedgerError::SourceAccountNotFound(_))));
    }

    #[test]
    fn submit_records_transaction_and_bumps_sequence() {
        let ledger = funded_ledger();
        let tx = TransactionBuilder::new("EDUALICE")
            .sequence(ledger.sequence_for("EDUALICE"))
            .build();
        let hash = ledger.submit(tx).unwrap();

        assert!(ledger.transaction(&hash).is_some());
        assert_eq!(ledger.transaction_count(), 1);
        assert_eq!(ledger.load_account("EDUALICE").unwrap().sequence, 1);
    }

    #[test]
    fn oversized_data_entry_rejected_without_state_change() {
        let ledger = funded_ledger();
        let tx = TransactionBuilder::new("EDUALICE")
            .operation(Operation::ManageData {
                name: "BIG".into(),
                value: "x".repeat(config::MANAGE_DATA_VALUE_BUDGET + 1),
            })
            .build();

        let result = ledger.submit(tx);
        assert!(matches!(result, Err(LedgerError::DataEntryTooLarge { .. })));
        assert_eq!(ledger.transaction_count(), 0);
        assert_eq!(ledger.load_account("EDUALICE").unwrap().sequence, 0);
    }

    #[test]
    fn oversized_memo_rejected() {
        let ledger = funded_ledger();
        let tx = TransactionBuilder::new("EDUALICE")
            .memo_text(&"m".repeat(config::MEMO_TEXT_BUDGET + 1))
            .build();
        assert!(matches!(ledger.submit(tx), Err(LedgerError::MemoTooLarge { .. })));
    }

    #[test]
    fn create_account_then_trust_then_mint_in_one_transaction() {
        let ledger = funded_ledger();
        let asset = Asset::new("EDU0042", "EDUALICE");
        let tx = TransactionBuilder::new("EDUALICE")
            .operation(Operation::CreateAccount {
                destination: "EDUBOB".into(),
                starting_balance: config::ISSUANCE_STARTING_BALANCE,
            })
            .operation(Operation::ChangeTrust {
                asset: asset.clone(),
                source: "EDUBOB".into(),
            })
            .operation(Operation::Payment {
                destination: "EDUBOB".into(),
                asset: asset.clone(),
                amount: 1,
                source: "EDUALICE".into(),
            })
            .build();

        ledger.submit(tx).unwrap();

        let bob = ledger.load_account("EDUBOB").unwrap();
        assert!(bob.has_trustline("EDU0042"));
        assert_eq!(bob.asset_balance("EDU0042").unwrap().amount, 1);
    }

    #[test]
    fn manage_data_lands_on_source_account() {
        let ledger = funded_ledger();
        let tx = TransactionBuilder::new("EDUALICE")
            .operation(Operation::ManageData {
                name: "CONTRACT_REF".into(),
                value: "ref".into(),
            })
            .build();
        ledger.submit(tx).unwrap();

        let alice = ledger.load_account("EDUALICE").unwrap();
        assert_eq!(alice.data_entries.get("CONTRACT_REF").unwrap(), "ref");
    }

    #[test]
    fn create_existing_account_rejected() {
        let ledger = funded_ledger();
        ledger.fund_account("EDUBOB");
        let tx = TransactionBuilder::new("EDUALICE")
            .operation(Operation::CreateAccount {
                destination: "EDUBOB".into(),
                starting_balance: 1,
            })
            .build();
        assert!(matches!(
            ledger.submit(tx),
            Err(LedgerError::AccountAlreadyExists(_))
        ));
    }

    #[test]
    fn fee_charged_on_submission() {
        let ledger = funded_ledger();
        let before = ledger.load_account("EDUALICE").unwrap().native_balance;
        let tx = TransactionBuilder::new("EDUALICE").build();
        let fee = tx.fee;
        ledger.submit(tx).unwrap();
        let after = ledger.load_account("EDUALICE").unwrap().native_balance;
        assert_eq!(before - after, fee);
    }
}
