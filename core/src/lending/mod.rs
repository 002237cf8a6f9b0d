//! # Lending Layer
//!
//! Credential-based loan scoring and the offer flow built on top of it.

pub mod offer;
pub mod scoring;

pub use offer::{
    validate_borrower, BorrowerStatus, LendingContractInfo, LoanError, LoanOffer, LoanRequest,
    PoolStatistics,
};
pub use scoring::{assess, CredentialProfile, LoanAssessment};
