//! # Annotation Codec
//!
//! Credentials ride to the ledger inside two byte-limited side channels: a
//! manage-data entry (64 bytes) and a text memo (28 bytes). Neither channel
//! is big enough for a full record, so encoding is *deliberately lossy*:
//! the payload is serialized to compact JSON and then cut at the channel's
//! byte budget, even if that slices through the middle of the structure.
//!
//! Decoding mirrors that reality with a three-tier fallback chain, each tier
//! strictly less informative than the last:
//!
//! 1. full JSON parse of the annotation (missing fields tolerated);
//! 2. the annotation wrapped as opaque raw text;
//! 3. a stub built only from the transaction's own ID and timestamp.
//!
//! Neither direction ever fails. Truncation silently drops information and
//! the decoder always returns *some* record. Truncated JSON is not expected
//! to re-parse — any payload that outgrew its budget lands in the raw tier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{CredentialRecord, VerificationMetadata};
use crate::config;

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// The side channel an annotation is destined for. Each channel carries a
/// fixed byte budget; the codec never emits more than the budget allows.
///
/// `Custom` exists for callers (and tests) that need a budget other than
/// the two the ledger imposes — the truncation policy is the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationChannel {
    /// Manage-data entry value: 64 bytes.
    ManageData,
    /// Text memo: 28 bytes.
    MemoText,
    /// Arbitrary budget, in bytes.
    Custom(usize),
}

impl AnnotationChannel {
    /// The channel's byte budget.
    pub fn byte_budget(&self) -> usize {
        match self {
            Self::ManageData => config::MANAGE_DATA_VALUE_BUDGET,
            Self::MemoText => config::MEMO_TEXT_BUDGET,
            Self::Custom(budget) => *budget,
        }
    }
}

/// An encoded annotation, guaranteed to fit its channel.
///
/// `truncated` records whether the payload was cut to fit. A truncated
/// annotation is usually no longer valid JSON; see the module docs.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedAnnotation {
    /// The (possibly cut) annotation text. `text.len() <= budget` always.
    pub text: String,
    /// Whether information was dropped to fit the budget.
    pub truncated: bool,
    /// The byte budget this annotation was encoded against.
    pub budget: usize,
}

impl BoundedAnnotation {
    /// The annotation text.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

// ---------------------------------------------------------------------------
// Payload Shapes
// ---------------------------------------------------------------------------

/// The full annotation payload carried in the manage-data channel.
///
/// Every field is optional: after a trip through the 64-byte budget, a
/// decoder may see only a prefix of these keys, and older issuers omitted
/// some of them entirely. Absent fields decode to `None`/empty rather than
/// failing the whole parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnotationPayload {
    /// Credential identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Credential title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Recipient ledger address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    /// Issuing institution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Issue date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<DateTime<Utc>>,
    /// Skill tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    /// How the credential is anchored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationMetadata>,
}

impl From<&CredentialRecord> for AnnotationPayload {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            id: Some(record.id.clone()),
            title: Some(record.title.clone()),
            recipient: Some(record.recipient.clone()),
            issuer: Some(record.issuer.clone()),
            issue_date: Some(record.issue_date),
            skills: record.skills.clone(),
            verification: Some(VerificationMetadata::stamp()),
        }
    }
}

/// The compact annotation carried in the memo channel. Legacy key names
/// (`cred`, `type`, `ver`, `contract`) are part of the wire format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactAnnotation {
    /// Credential identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cred: Option<String>,
    /// Type tag, normally `"education"`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    /// Annotation format version, normally `"1.0"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
    /// Truncated reference to the credential contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
}

impl From<&CredentialRecord> for CompactAnnotation {
    fn from(record: &CredentialRecord) -> Self {
        let contract_ref: String = config::CREDENTIAL_CONTRACT_ID
            .chars()
            .take(config::CONTRACT_REF_PREFIX_LEN)
            .collect();
        Self {
            cred: Some(record.id.clone()),
            type_tag: Some(config::ANNOTATION_TYPE_TAG.to_string()),
            ver: Some(config::ANNOTATION_VERSION_TAG.to_string()),
            contract: Some(contract_ref),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encodes the full annotation payload for the given channel.
///
/// Serializes `{id, title, recipient, issuer, issueDate, skills,
/// verification}` as compact JSON and cuts the result at the channel's byte
/// budget. Truncation is the expected outcome for real-world records — the
/// 64-byte channel holds roughly the first two fields.
///
/// Never fails; never exceeds the budget.
pub fn encode_full(record: &CredentialRecord, channel: AnnotationChannel) -> BoundedAnnotation {
    let payload = AnnotationPayload::from(record);
    let json = serde_json::to_string(&payload).unwrap_or_default();
    bound(json, channel)
}

/// Encodes the compact annotation (`{cred, type, ver, contract}`) for the
/// given channel. Intended for the 28-byte memo channel.
///
/// Never fails; never exceeds the budget.
pub fn encode_compact(record: &CredentialRecord, channel: AnnotationChannel) -> BoundedAnnotation {
    let payload = CompactAnnotation::from(record);
    let json = serde_json::to_string(&payload).unwrap_or_default();
    bound(json, channel)
}

/// Cuts `text` to the channel budget on a UTF-8 character boundary.
fn bound(text: String, channel: AnnotationChannel) -> BoundedAnnotation {
    let budget = channel.byte_budget();
    if text.len() <= budget {
        return BoundedAnnotation {
            text,
            truncated: false,
            budget,
        };
    }

    let mut end = budget;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }

    tracing::debug!(
        budget,
        full_len = text.len(),
        kept = end,
        "annotation truncated to fit channel budget"
    );

    BoundedAnnotation {
        text: text[..end].to_string(),
        truncated: true,
        budget,
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Text attached to transaction-only stubs.
pub const STUB_NOTE: &str = "Limited credential data available";

/// A credential reconstructed from a ledger transaction, at one of four
/// fidelity tiers. Ordered from most to least informative; the decoder
/// always lands on exactly one of them and never errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "camelCase")]
pub enum DecodedCredential {
    /// The annotation parsed as a full payload (fields may still be absent).
    #[serde(rename = "full")]
    Full(AnnotationPayload),

    /// Reconstructed from the compact memo annotation.
    #[serde(rename = "memo", rename_all = "camelCase")]
    Memo {
        /// Credential identifier from the `cred` key, if present.
        id: Option<String>,
        /// The `type` tag, if present.
        credential_type: Option<String>,
        /// The `ver` tag, if present.
        version: Option<String>,
        /// The transaction's ledger timestamp.
        issue_date: DateTime<Utc>,
    },

    /// The annotation was not parseable; carried as opaque text.
    #[serde(rename = "raw", rename_all = "camelCase")]
    Raw {
        /// The annotation text, verbatim.
        raw_data: String,
        /// The transaction's ledger timestamp.
        issue_date: DateTime<Utc>,
    },

    /// No annotation at all; only the transaction itself is known.
    #[serde(rename = "stub", rename_all = "camelCase")]
    Stub {
        /// The anchoring transaction's ID.
        transaction_id: String,
        /// The transaction's ledger timestamp.
        issue_date: DateTime<Utc>,
        /// Always [`STUB_NOTE`].
        note: String,
    },
}

/// Decodes an annotation back into a credential.
///
/// Fallback order: full JSON parse, then opaque raw-text wrap, then (when no
/// annotation is present) a stub carrying only the transaction ID and
/// timestamp. Always returns a value.
pub fn decode(
    annotation: Option<&str>,
    tx_id: &str,
    ledger_time: DateTime<Utc>,
) -> DecodedCredential {
    match annotation {
        Some(text) => match serde_json::from_str::<AnnotationPayload>(text) {
            Ok(payload) => DecodedCredential::Full(payload),
            Err(_) => DecodedCredential::Raw {
                raw_data: text.to_string(),
                issue_date: ledger_time,
            },
        },
        None => DecodedCredential::Stub {
            transaction_id: tx_id.to_string(),
            issue_date: ledger_time,
            note: STUB_NOTE.to_string(),
        },
    }
}

/// Attempts to parse an annotation as a full payload. Returns `None` when
/// the text is not valid JSON — the caller falls back to the memo chain,
/// treating a truncated data entry the same as an absent one.
pub fn decode_full(text: &str) -> Option<AnnotationPayload> {
    serde_json::from_str(text).ok()
}

/// Attempts to parse a memo as a compact annotation. Returns `None` when the
/// memo is not valid JSON — the caller falls back to the raw tier.
pub fn decode_compact(text: &str) -> Option<CompactAnnotation> {
    serde_json::from_str(text).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> CredentialRecord {
        CredentialRecord {
            id: "cred-1716208934".into(),
            title: "Stellar Development Certificate".into(),
            recipient: "EDU7RECIPIENTADDRESS".into(),
            issuer: "EduChain".into(),
            issue_date: Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap(),
            skills: vec!["Blockchain".into(), "Smart Contracts".into()],
        }
    }

    fn ledger_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 21, 9, 30, 0).unwrap()
    }

    // -- encoding ----------------------------------------------------------

    #[test]
    fn full_encoding_respects_manage_data_budget() {
        let ann = encode_full(&sample_record(), AnnotationChannel::ManageData);
        assert!(ann.text.len() <= config::MANAGE_DATA_VALUE_BUDGET);
        assert!(ann.truncated, "a realistic record does not fit 64 bytes");
    }

    #[test]
    fn compact_encoding_respects_memo_budget() {
        let ann = encode_compact(&sample_record(), AnnotationChannel::MemoText);
        assert!(ann.text.len() <= config::MEMO_TEXT_BUDGET);
    }

    #[test]
    fn truncation_lands_on_char_boundary() {
        let mut record = sample_record();
        // Multibyte title positioned to straddle the cut point.
        record.title = "Certificação em Criptografia Avançada ááááááá".into();
        for budget in 1..config::MANAGE_DATA_VALUE_BUDGET {
            let ann = encode_full(&record, AnnotationChannel::Custom(budget));
            assert!(ann.text.len() <= budget);
            // Slicing succeeded, so the cut was on a boundary; also make
            // sure the text is still valid UTF-8 end to end.
            assert!(std::str::from_utf8(ann.text.as_bytes()).is_ok());
        }
    }

    #[test]
    fn encoding_never_fails_on_empty_record() {
        let record = CredentialRecord {
            id: String::new(),
            title: String::new(),
            recipient: String::new(),
            issuer: String::new(),
            issue_date: ledger_time(),
            skills: vec![],
        };
        let ann = encode_full(&record, AnnotationChannel::ManageData);
        assert!(ann.text.len() <= config::MANAGE_DATA_VALUE_BUDGET);
    }

    // -- under-budget round trip -------------------------------------------

    #[test]
    fn under_budget_full_round_trip_is_exact() {
        let record = sample_record();
        // A budget big enough that nothing is cut.
        let ann = encode_full(&record, AnnotationChannel::Custom(4096));
        assert!(!ann.truncated);

        match decode(Some(ann.as_str()), "txid", ledger_time()) {
            DecodedCredential::Full(payload) => {
                assert_eq!(payload.id.as_deref(), Some("cred-1716208934"));
                assert_eq!(
                    payload.title.as_deref(),
                    Some("Stellar Development Certificate")
                );
                assert_eq!(payload.recipient.as_deref(), Some("EDU7RECIPIENTADDRESS"));
                assert_eq!(payload.issuer.as_deref(), Some("EduChain"));
                assert_eq!(payload.issue_date, Some(record.issue_date));
                assert_eq!(payload.skills, record.skills);
                let verification = payload.verification.expect("verification stamped");
                assert_eq!(verification.contract_id, config::CREDENTIAL_CONTRACT_ID);
            }
            other => panic!("expected full tier, got {:?}", other),
        }
    }

    #[test]
    fn under_budget_compact_round_trip_is_exact() {
        let record = sample_record();
        let ann = encode_compact(&record, AnnotationChannel::Custom(512));
        assert!(!ann.truncated);

        let compact = decode_compact(ann.as_str()).expect("valid compact JSON");
        assert_eq!(compact.cred.as_deref(), Some("cred-1716208934"));
        assert_eq!(compact.type_tag.as_deref(), Some("education"));
        assert_eq!(compact.ver.as_deref(), Some("1.0"));
        assert_eq!(
            compact.contract.as_deref().map(str::len),
            Some(config::CONTRACT_REF_PREFIX_LEN)
        );
    }

    // -- lossy boundary ----------------------------------------------------

    #[test]
    fn truncated_annotation_falls_to_raw_tier() {
        let ann = encode_full(&sample_record(), AnnotationChannel::ManageData);
        assert!(ann.truncated);

        // The cut JSON no longer parses; the decoder must wrap, not fail.
        match decode(Some(ann.as_str()), "txid", ledger_time()) {
            DecodedCredential::Raw { raw_data, issue_date } => {
                assert_eq!(raw_data, ann.text);
                assert_eq!(issue_date, ledger_time());
            }
            other => panic!("expected raw tier, got {:?}", other),
        }
    }

    // -- decode fallback chain ---------------------------------------------

    #[test]
    fn empty_object_decodes_as_sparse_full_tier() {
        // Valid JSON with no recognized keys is still the full tier — all
        // fields simply come back absent.
        match decode(Some("{}"), "txid", ledger_time()) {
            DecodedCredential::Full(payload) => {
                assert!(payload.id.is_none());
                assert!(payload.skills.is_empty());
            }
            other => panic!("expected full tier, got {:?}", other),
        }
    }

    #[test]
    fn garbage_annotation_decodes_as_raw() {
        match decode(Some("not json at all"), "txid", ledger_time()) {
            DecodedCredential::Raw { raw_data, .. } => {
                assert_eq!(raw_data, "not json at all");
            }
            other => panic!("expected raw tier, got {:?}", other),
        }
    }

    #[test]
    fn absent_annotation_decodes_as_stub() {
        match decode(None, "abc123def456", ledger_time()) {
            DecodedCredential::Stub {
                transaction_id,
                issue_date,
                note,
            } => {
                assert_eq!(transaction_id, "abc123def456");
                assert_eq!(issue_date, ledger_time());
                assert_eq!(note, STUB_NOTE);
            }
            other => panic!("expected stub tier, got {:?}", other),
        }
    }

    #[test]
    fn stub_note_matches_wire_text() {
        assert_eq!(STUB_NOTE, "Limited credential data available");
    }

    #[test]
    fn decode_full_rejects_truncated_json() {
        let ann = encode_full(&sample_record(), AnnotationChannel::ManageData);
        assert!(ann.truncated);
        assert!(decode_full(ann.as_str()).is_none());
        assert_eq!(
            decode_full("{\"id\":\"cred-7\"}").unwrap().id.as_deref(),
            Some("cred-7")
        );
    }

    #[test]
    fn decode_compact_rejects_non_json() {
        assert!(decode_compact("nope").is_none());
        assert!(decode_compact("{\"cred\":\"c1\"").is_none());
    }

    #[test]
    fn decoded_credential_serializes_with_tier_tag() {
        let decoded = decode(None, "tx1", ledger_time());
        let json = serde_json::to_value(&decoded).unwrap();
        assert_eq!(json["tier"], "stub");
        assert_eq!(json["transactionId"], "tx1");
    }
}
