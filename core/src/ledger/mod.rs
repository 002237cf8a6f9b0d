//! # Ledger Layer
//!
//! Transaction envelopes plus the simulated test network they are submitted
//! to. Everything above this module (issuance, verification, lending) talks
//! to the ledger through [`TestnetLedger`] and never holds network state of
//! its own.

pub mod testnet;
pub mod transaction;

pub use testnet::{AccountRecord, AssetBalance, LedgerError, TestKeypair, TestnetLedger};
pub use transaction::{Asset, LedgerTransaction, Operation, TransactionBuilder};
