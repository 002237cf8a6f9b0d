//! # Credential Issuance & Verification
//!
//! The [`CredentialIssuer`] anchors credential records to the test network
//! and reconstructs them later from the transaction record. Issuance mints a
//! one-of-one `EDUxxxx` token to the recipient and rides the annotation
//! payloads along in the transaction's data entries and memo; verification
//! walks those channels back in fidelity order and always produces *some*
//! answer for a transaction that exists.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::codec::{self, AnnotationChannel, DecodedCredential};
use super::record::CredentialRecord;
use crate::config;
use crate::ledger::{Asset, LedgerError, Operation, TestnetLedger, TransactionBuilder};

/// Data entry name holding the credential contract reference.
pub const CONTRACT_REF_ENTRY: &str = "CONTRACT_REF";

/// Data entry name prefix for credential annotations; the asset code is
/// appended (e.g. `CREDENTIAL_EDU0042`).
pub const CREDENTIAL_ENTRY_PREFIX: &str = "CREDENTIAL_";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while anchoring a credential.
#[derive(Debug, Error)]
pub enum IssueError {
    /// The ledger rejected the issuance transaction.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Errors raised while verifying a credential.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The supplied hash is too short to be a transaction hash.
    #[error("transaction hash too short ({0} characters)")]
    InvalidHash(usize),

    /// No transaction with this hash exists on the ledger.
    #[error("transaction not found: {0}")]
    TransactionNotFound(String),
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// The outcome of a successful issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReceipt {
    /// Hash of the anchoring transaction.
    pub transaction_hash: String,
    /// Asset code of the minted credential token.
    pub asset_code: String,
    /// Whether the recipient account was created as part of issuance.
    pub recipient_created: bool,
    /// Whether the full annotation was cut to fit its channel.
    pub annotation_truncated: bool,
    /// Explorer link for the anchoring transaction.
    pub explorer_url: String,
}

/// The outcome of a successful verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// Always true for a report; failures return [`VerifyError`] instead.
    pub verified: bool,
    /// Hash of the anchoring transaction.
    pub transaction_hash: String,
    /// When the transaction was recorded on the ledger.
    pub ledger_time: DateTime<Utc>,
    /// Operation types carried by the transaction, in order.
    pub operations: Vec<String>,
    /// The reconstructed credential, at whatever fidelity survived.
    pub credential: DecodedCredential,
    /// Explorer link for the anchoring transaction.
    pub explorer_url: String,
}

// ---------------------------------------------------------------------------
// CredentialIssuer
// ---------------------------------------------------------------------------

/// Issues credentials on behalf of the platform account and verifies them
/// against the ledger.
pub struct CredentialIssuer {
    ledger: Arc<TestnetLedger>,
    issuer_address: String,
    contract_id: String,
}

impl CredentialIssuer {
    /// Creates an issuer bound to the platform account and contract.
    pub fn new(ledger: Arc<TestnetLedger>) -> Self {
        Self {
            ledger,
            issuer_address: config::PLATFORM_ISSUER_ADDRESS.to_string(),
            contract_id: config::CREDENTIAL_CONTRACT_ID.to_string(),
        }
    }

    /// Anchors `record` to the ledger for `destination`.
    ///
    /// The issuance transaction carries, in order: an account creation when
    /// the recipient does not exist yet, a trustline from the recipient to a
    /// fresh `EDUxxxx` asset, a payment of exactly one token, a
    /// `CONTRACT_REF` data entry, and a `CREDENTIAL_<code>` data entry with
    /// the bounded full annotation. The compact annotation rides in the memo.
    pub fn issue(
        &self,
        destination: &str,
        record: &CredentialRecord,
    ) -> Result<IssueReceipt, IssueError> {
        let asset_code = format!("EDU{:04}", rand::thread_rng().gen_range(0..10_000u32));
        let asset = Asset::new(&asset_code, &self.issuer_address);

        let full = codec::encode_full(record, AnnotationChannel::ManageData);
        let compact = codec::encode_compact(record, AnnotationChannel::MemoText);

        let recipient_created = !self.ledger.account_exists(destination);

        let mut builder = TransactionBuilder::new(&self.issuer_address)
            .sequence(self.ledger.sequence_for(&self.issuer_address));

        if recipient_created {
            builder = builder.operation(Operation::CreateAccount {
                destination: destination.to_string(),
                starting_balance: config::ISSUANCE_STARTING_BALANCE,
            });
        }

        let tx = builder
            .operation(Operation::ChangeTrust {
                asset: asset.clone(),
                source: destination.to_string(),
            })
            .operation(Operation::Payment {
                destination: destination.to_string(),
                asset,
                amount: 1,
                source: self.issuer_address.clone(),
            })
            .operation(Operation::ManageData {
                name: CONTRACT_REF_ENTRY.to_string(),
                value: self.contract_id.clone(),
            })
            .operation(Operation::ManageData {
                name: format!("{CREDENTIAL_ENTRY_PREFIX}{asset_code}"),
                value: full.text.clone(),
            })
            .memo_text(compact.as_str())
            .build();

        let hash = self.ledger.submit(tx)?;

        tracing::info!(
            credential = %record.id,
            recipient = destination,
            asset = %asset_code,
            hash = %hash,
            recipient_created,
            "credential issued"
        );

        Ok(IssueReceipt {
            explorer_url: explorer_tx_url(&hash),
            transaction_hash: hash,
            asset_code,
            recipient_created,
            annotation_truncated: full.truncated,
        })
    }

    /// Reconstructs the credential anchored by `tx_hash`.
    ///
    /// Fidelity order: the `CREDENTIAL_*` data entry (full tier), then the
    /// memo (memo or raw tier), then a transaction-only stub. A data entry
    /// that no longer parses (the usual case, since the full annotation is
    /// cut at 64 bytes) is treated like an absent one, so a normally issued
    /// credential still recovers its id from the compact memo. Verification
    /// only fails when the hash is malformed or the transaction does not
    /// exist.
    pub fn verify(&self, tx_hash: &str) -> Result<VerificationReport, VerifyError> {
        if tx_hash.len() < config::MIN_TX_HASH_LEN {
            return Err(VerifyError::InvalidHash(tx_hash.len()));
        }

        let tx = self
            .ledger
            .transaction(tx_hash)
            .ok_or_else(|| VerifyError::TransactionNotFound(tx_hash.to_string()))?;

        let full = tx
            .data_entry_with_prefix(CREDENTIAL_ENTRY_PREFIX)
            .and_then(|(_, value)| codec::decode_full(value));

        let credential = match full {
            Some(payload) => DecodedCredential::Full(payload),
            None => match tx.memo.as_deref() {
                Some(memo) => match codec::decode_compact(memo) {
                    Some(compact) => DecodedCredential::Memo {
                        id: compact.cred,
                        credential_type: compact.type_tag,
                        version: compact.ver,
                        issue_date: tx.created_at,
                    },
                    None => DecodedCredential::Raw {
                        raw_data: memo.to_string(),
                        issue_date: tx.created_at,
                    },
                },
                None => codec::decode(None, &tx.id, tx.created_at),
            },
        };

        tracing::debug!(hash = tx_hash, "credential verified");

        Ok(VerificationReport {
            verified: true,
            transaction_hash: tx.id.clone(),
            ledger_time: tx.created_at,
            operations: tx.operations.iter().map(|op| op.type_name().into()).collect(),
            credential,
            explorer_url: explorer_tx_url(&tx.id),
        })
    }
}

/// Explorer link for a transaction hash.
pub fn explorer_tx_url(hash: &str) -> String {
    format!("{}/tx/{}", config::EXPLORER_BASE_URL, hash)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer_with_ledger() -> (CredentialIssuer, Arc<TestnetLedger>) {
        let ledger = Arc::new(TestnetLedger::bootstrap());
        (CredentialIssuer::new(Arc::clone(&ledger)), ledger)
    }

    fn sample_record() -> CredentialRecord {
        CredentialRecord::platform_issued(
            "cred-1716208934",
            "Stellar Development Certificate",
            "EDU7RECIPIENT",
            vec!["Blockchain".into(), "Rust".into()],
        )
    }

    #[test]
    fn issuance_creates_recipient_and_mints_token() {
        let (issuer, ledger) = issuer_with_ledger();
        let receipt = issuer.issue("EDU7RECIPIENT", &sample_record()).unwrap();

        assert!(receipt.recipient_created);
        assert!(receipt.asset_code.starts_with("EDU"));
        assert_eq!(receipt.asset_code.len(), 7);

        let recipient = ledger.load_account("EDU7RECIPIENT").unwrap();
        assert_eq!(
            recipient.asset_balance(&receipt.asset_code).unwrap().amount,
            1
        );
    }

    #[test]
    fn issuance_to_existing_account_skips_creation() {
        let (issuer, ledger) = issuer_with_ledger();
        ledger.fund_account("EDU7RECIPIENT");
        let receipt = issuer.issue("EDU7RECIPIENT", &sample_record()).unwrap();
        assert!(!receipt.recipient_created);
    }

    #[test]
    fn issuance_attaches_contract_ref_and_annotation() {
        let (issuer, ledger) = issuer_with_ledger();
        let receipt = issuer.issue("EDU7RECIPIENT", &sample_record()).unwrap();

        let tx = ledger.transaction(&receipt.transaction_hash).unwrap();
        let platform = ledger.load_account(config::PLATFORM_ISSUER_ADDRESS).unwrap();
        assert_eq!(
            platform.data_entries.get(CONTRACT_REF_ENTRY).unwrap(),
            config::CREDENTIAL_CONTRACT_ID
        );
        let (name, value) = tx.data_entry_with_prefix(CREDENTIAL_ENTRY_PREFIX).unwrap();
        assert!(name.ends_with(&receipt.asset_code));
        assert!(value.len() <= config::MANAGE_DATA_VALUE_BUDGET);
        assert!(tx.memo.as_ref().unwrap().len() <= config::MEMO_TEXT_BUDGET);
    }

    #[test]
    fn verify_recovers_issued_credential_from_memo() {
        let (issuer, _ledger) = issuer_with_ledger();
        let receipt = issuer.issue("EDU7RECIPIENT", &sample_record()).unwrap();

        // A realistic record outgrows the 64-byte channel, so the data
        // entry no longer parses. The compact memo still carries the id.
        assert!(receipt.annotation_truncated);

        let report = issuer.verify(&receipt.transaction_hash).unwrap();
        assert!(report.verified);
        assert!(report.operations.contains(&"payment".to_string()));
        match report.credential {
            DecodedCredential::Memo {
                id,
                credential_type,
                ..
            } => {
                assert_eq!(id.as_deref(), Some("cred-1716208934"));
                assert_eq!(credential_type.as_deref(), Some("education"));
            }
            other => panic!("expected memo tier, got {:?}", other),
        }
    }

    #[test]
    fn verify_reads_back_a_parseable_data_entry() {
        let (issuer, ledger) = issuer_with_ledger();
        let tx = TransactionBuilder::new(config::PLATFORM_ISSUER_ADDRESS)
            .sequence(ledger.sequence_for(config::PLATFORM_ISSUER_ADDRESS))
            .operation(Operation::ManageData {
                name: format!("{CREDENTIAL_ENTRY_PREFIX}EDU0001"),
                value: "{\"id\":\"cred-7\"}".to_string(),
            })
            .memo_text("{\"cred\":\"ignored\"}")
            .build();
        let hash = ledger.submit(tx).unwrap();

        let report = issuer.verify(&hash).unwrap();
        match report.credential {
            DecodedCredential::Full(payload) => {
                assert_eq!(payload.id.as_deref(), Some("cred-7"));
            }
            other => panic!("expected full tier, got {:?}", other),
        }
    }

    #[test]
    fn verify_falls_back_to_memo_tier() {
        let (issuer, ledger) = issuer_with_ledger();
        let tx = TransactionBuilder::new(config::PLATFORM_ISSUER_ADDRESS)
            .sequence(ledger.sequence_for(config::PLATFORM_ISSUER_ADDRESS))
            .memo_text("{\"cred\":\"cred-9\"}")
            .build();
        let hash = ledger.submit(tx).unwrap();

        let report = issuer.verify(&hash).unwrap();
        match report.credential {
            DecodedCredential::Memo { id, .. } => assert_eq!(id.as_deref(), Some("cred-9")),
            other => panic!("expected memo tier, got {:?}", other),
        }
    }

    #[test]
    fn verify_unparseable_memo_lands_on_raw_tier() {
        let (issuer, ledger) = issuer_with_ledger();
        let tx = TransactionBuilder::new(config::PLATFORM_ISSUER_ADDRESS)
            .sequence(ledger.sequence_for(config::PLATFORM_ISSUER_ADDRESS))
            .memo_text("plain text memo")
            .build();
        let hash = ledger.submit(tx).unwrap();

        let report = issuer.verify(&hash).unwrap();
        assert!(matches!(report.credential, DecodedCredential::Raw { .. }));
    }

    #[test]
    fn verify_bare_transaction_lands_on_stub_tier() {
        let (issuer, ledger) = issuer_with_ledger();
        let tx = TransactionBuilder::new(config::PLATFORM_ISSUER_ADDRESS)
            .sequence(ledger.sequence_for(config::PLATFORM_ISSUER_ADDRESS))
            .build();
        let hash = ledger.submit(tx).unwrap();

        let report = issuer.verify(&hash).unwrap();
        assert!(matches!(report.credential, DecodedCredential::Stub { .. }));
    }

    #[test]
    fn verify_rejects_short_hash() {
        let (issuer, _) = issuer_with_ledger();
        assert!(matches!(
            issuer.verify("short"),
            Err(VerifyError::InvalidHash(5))
        ));
    }

    #[test]
    fn verify_rejects_unknown_hash() {
        let (issuer, _) = issuer_with_ledger();
        assert!(matches!(
            issuer.verify("0000000000000000"),
            Err(VerifyError::TransactionNotFound(_))
        ));
    }
}
