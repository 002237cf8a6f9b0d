//! Ledger transaction construction.
//!
//! The [`TransactionBuilder`] enforces a disciplined construction flow: set
//! the source account, append operations, optionally attach a memo, and call
//! `.build()` to get a [`LedgerTransaction`] with a deterministic ID derived
//! from its contents. The builder does not submit — that happens in
//! [`super::testnet`]. The separation keeps construction testable without a
//! running ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config;

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// An asset on the test network, identified by code and issuing account.
///
/// Credential tokens use short `EDUxxxx` codes issued by the platform
/// account; the native asset is represented separately in balances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    /// Asset code, at most 12 characters (e.g. `EDU0042`, `USDC`).
    pub code: String,
    /// Address of the issuing account.
    pub issuer: String,
}

impl Asset {
    /// Creates a new asset.
    pub fn new(code: &str, issuer: &str) -> Self {
        Self {
            code: code.to_string(),
            issuer: issuer.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// A single operation inside a ledger transaction.
///
/// The variants mirror the subset of the hosted network's operation set the
/// platform actually uses for credential issuance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Creates a new account funded with `starting_balance` stroops.
    CreateAccount {
        /// Address of the account to create.
        destination: String,
        /// Initial native balance, in stroops.
        starting_balance: u64,
    },

    /// Establishes a trustline from `source` to the asset, allowing the
    /// account to hold it.
    ChangeTrust {
        /// The asset being trusted.
        asset: Asset,
        /// Account opening the trustline.
        source: String,
    },

    /// Sends `amount` units of `asset` from `source` to `destination`.
    Payment {
        /// Receiving address.
        destination: String,
        /// The asset being transferred.
        asset: Asset,
        /// Transfer amount in the asset's smallest unit.
        amount: u64,
        /// Sending address.
        source: String,
    },

    /// Attaches a named data entry to the source account. The value is
    /// limited to [`config::MANAGE_DATA_VALUE_BUDGET`] bytes — the codec
    /// guarantees this, and [`super::testnet::TestnetLedger::submit`]
    /// enforces it.
    ManageData {
        /// Entry name (e.g. `CREDENTIAL_EDU0042`, `CONTRACT_REF`).
        name: String,
        /// Entry value.
        value: String,
    },
}

impl Operation {
    /// Short machine name, matching the hosted network's operation types.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::CreateAccount { .. } => "create_account",
            Self::ChangeTrust { .. } => "change_trust",
            Self::Payment { .. } => "payment",
            Self::ManageData { .. } => "manage_data",
        }
    }
}

// ---------------------------------------------------------------------------
// LedgerTransaction
// ---------------------------------------------------------------------------

/// A transaction as recorded on the (simulated) test network.
///
/// The `id` is `hex(sha256(sha256(canonical_bytes)))` — deterministic over
/// source, sequence, fee, operations, memo, and timestamp, so the same
/// submission always produces the same hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Transaction hash, hex-encoded.
    pub id: String,

    /// Source account that submitted the transaction.
    pub source: String,

    /// Per-source sequence number.
    pub sequence: u64,

    /// Fee charged, in stroops.
    pub fee: u64,

    /// The operations, applied in order.
    pub operations: Vec<Operation>,

    /// Optional text memo, limited to [`config::MEMO_TEXT_BUDGET`] bytes.
    pub memo: Option<String>,

    /// When the transaction was recorded on the ledger.
    pub created_at: DateTime<Utc>,
}

impl LedgerTransaction {
    /// Canonical byte representation used for ID computation.
    ///
    /// Deterministic concatenation with null separators and fixed-width
    /// little-endian integers. JSON is intentionally avoided because field
    /// ordering is not guaranteed across serializers.
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(self.source.as_bytes());
        buf.push(0x00);
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&self.fee.to_le_bytes());
        buf.extend_from_slice(&(self.created_at.timestamp_millis()).to_le_bytes());

        for op in &self.operations {
            buf.extend_from_slice(op.type_name().as_bytes());
            buf.push(0x00);
            match op {
                Operation::CreateAccount {
                    destination,
                    starting_balance,
                } => {
                    buf.extend_from_slice(destination.as_bytes());
                    buf.push(0x00);
                    buf.extend_from_slice(&starting_balance.to_le_bytes());
                }
                Operation::ChangeTrust { asset, source } => {
                    buf.extend_from_slice(asset.code.as_bytes());
                    buf.push(0x00);
                    buf.extend_from_slice(asset.issuer.as_bytes());
                    buf.push(0x00);
                    buf.extend_from_slice(source.as_bytes());
                    buf.push(0x00);
                }
                Operation::Payment {
                    destination,
                    asset,
                    amount,
                    source,
                } => {
                    buf.extend_from_slice(destination.as_bytes());
                    buf.push(0x00);
                    buf.extend_from_slice(asset.code.as_bytes());
                    buf.push(0x00);
                    buf.extend_from_slice(&amount.to_le_bytes());
                    buf.extend_from_slice(source.as_bytes());
                    buf.push(0x00);
                }
                Operation::ManageData { name, value } => {
                    buf.extend_from_slice(name.as_bytes());
                    buf.push(0x00);
                    buf.extend_from_slice(value.as_bytes());
                    buf.push(0x00);
                }
            }
        }

        if let Some(ref memo) = self.memo {
            buf.push(0x01);
            buf.extend_from_slice(memo.as_bytes());
        } else {
            buf.push(0x00);
        }

        buf
    }

    /// Computes the transaction hash from the current field values.
    pub fn compute_id(&self) -> String {
        let first = Sha256::digest(self.canonical_bytes());
        let second = Sha256::digest(first);
        hex::encode(second)
    }

    /// Returns the value of the first manage-data entry whose name starts
    /// with `prefix`, if any.
    pub fn data_entry_with_prefix(&self, prefix: &str) -> Option<(&str, &str)> {
        self.operations.iter().find_map(|op| match op {
            Operation::ManageData { name, value } if name.starts_with(prefix) => {
                Some((name.as_str(), value.as_str()))
            }
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`LedgerTransaction`] instances.
///
/// Defaults: fee = [`config::BASE_TX_FEE`], sequence = 0 (assigned by the
/// ledger at submission), timestamp = now at build time.
pub struct TransactionBuilder {
    source: String,
    sequence: u64,
    fee: u64,
    operations: Vec<Operation>,
    memo: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl TransactionBuilder {
    /// Creates a builder for a transaction from `source`.
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            sequence: 0,
            fee: config::BASE_TX_FEE,
            operations: Vec::new(),
            memo: None,
            created_at: None,
        }
    }

    /// Sets the sequence number. Normally assigned by the ledger.
    pub fn sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Overrides the flat base fee.
    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    /// Appends an operation.
    pub fn operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    /// Attaches a text memo.
    pub fn memo_text(mut self, memo: &str) -> Self {
        self.memo = Some(memo.to_string());
        self
    }

    /// Sets the timestamp explicitly. If not called, `build()` uses now.
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Consumes the builder and produces a transaction with its ID computed.
    pub fn build(self) -> LedgerTransaction {
        let mut tx = LedgerTransaction {
            id: String::new(),
            source: self.source,
            sequence: self.sequence,
            fee: self.fee,
            operations: self.operations,
            memo: self.memo,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        };
        tx.id = tx.compute_id();
        tx
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
