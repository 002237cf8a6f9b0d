//! Core credential record types.
//!
//! A [`CredentialRecord`] asserts that a recipient completed some educational
//! achievement. Records are immutable once issued: the issuing flow creates
//! one, anchors it to a ledger transaction, and never mutates it afterward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config;

/// A credential as issued by the platform.
///
/// Field names serialize in camelCase because the annotation wire format
/// predates this crate and existing verifiers parse those exact keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// Platform-unique credential identifier (e.g. `cred-1716208934`).
    pub id: String,

    /// Human-readable credential title (e.g. "Stellar Development Certificate").
    pub title: String,

    /// Ledger address of the credential recipient.
    pub recipient: String,

    /// Name of the issuing institution.
    pub issuer: String,

    /// When the credential was issued.
    pub issue_date: DateTime<Utc>,

    /// Skill tags covered by the credential. Unordered; may be empty.
    #[serde(default)]
    pub skills: Vec<String>,
}

impl CredentialRecord {
    /// Creates a record issued by the platform itself, dated now.
    pub fn platform_issued(id: &str, title: &str, recipient: &str, skills: Vec<String>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            recipient: recipient.to_string(),
            issuer: config::PLATFORM_NAME.to_string(),
            issue_date: Utc::now(),
            skills,
        }
    }
}

/// Verification metadata embedded in the full annotation so third parties
/// can tell how (and against which contract) a credential was anchored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMetadata {
    /// Anchoring method. Always [`config::VERIFICATION_METHOD`] for records
    /// issued by this crate.
    pub method: String,

    /// Issuing platform name.
    pub platform: String,

    /// Credential contract the record is anchored to.
    pub contract_id: String,

    /// Unix timestamp (milliseconds) at which the annotation was built.
    pub timestamp: i64,
}

impl VerificationMetadata {
    /// Metadata stamped onto annotations produced by this platform.
    pub fn stamp() -> Self {
        Self {
            method: config::VERIFICATION_METHOD.to_string(),
            platform: config::PLATFORM_NAME.to_string(),
            contract_id: config::CREDENTIAL_CONTRACT_ID.to_string(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_issued_defaults() {
        let rec = CredentialRecord::platform_issued(
            "cred-1",
            "Blockchain Fundamentals Certificate",
            "EDU7RECIPIENT",
            vec!["Blockchain".into()],
        );
        assert_eq!(rec.issuer, config::PLATFORM_NAME);
        assert_eq!(rec.skills.len(), 1);
    }

    #[test]
    fn record_serializes_camel_case() {
        let rec = CredentialRecord::platform_issued("cred-1", "T", "EDU7R", vec![]);
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("issueDate").is_some());
        assert!(json.get("issue_date").is_none());
    }

    #[test]
    fn skills_default_to_empty_on_missing_field() {
        // Records decoded from older annotations may lack the skills key.
        let json = r#"{
            "id": "cred-9",
            "title": "T",
            "recipient": "EDU7R",
            "issuer": "EduChain",
            "issueDate": "2024-05-20T12:00:00Z"
        }"#;
        let rec: CredentialRecord = serde_json::from_str(json).unwrap();
        assert!(rec.skills.is_empty());
    }

    #[test]
    fn verification_stamp_points_at_contract() {
        let meta = VerificationMetadata::stamp();
        assert_eq!(meta.contract_id, config::CREDENTIAL_CONTRACT_ID);
        assert_eq!(meta.method, config::VERIFICATION_METHOD);
        assert!(meta.timestamp > 0);
    }
}
