//! # Credential Layer
//!
//! Record types, the lossy annotation codec, and the issuance/verification
//! flow that anchors credentials to the ledger.

pub mod codec;
pub mod issuer;
pub mod record;

pub use codec::{AnnotationChannel, BoundedAnnotation, DecodedCredential};
pub use issuer::{CredentialIssuer, IssueError, IssueReceipt, VerificationReport, VerifyError};
pub use record::{CredentialRecord, VerificationMetadata};
