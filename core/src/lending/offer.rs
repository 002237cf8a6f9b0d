//! # Loan Offers & Pool Views
//!
//! Turns a scoring assessment into a concrete offer, checks borrower
//! standing on the ledger, and exposes the demo lending pool's statistics.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scoring::{self, CredentialProfile, LoanAssessment};
use crate::config;
use crate::ledger::TestnetLedger;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while validating a loan application.
#[derive(Debug, Error)]
pub enum LoanError {
    /// The requested amount must be positive.
    #[error("requested amount must be greater than zero")]
    InvalidAmount,

    /// The borrower address was empty.
    #[error("borrower address is required")]
    MissingBorrower,
}

// ---------------------------------------------------------------------------
// Requests & Offers
// ---------------------------------------------------------------------------

/// A loan application as submitted by a borrower.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    /// Ledger address of the borrower.
    pub borrower: String,
    /// Requested principal, in currency units.
    pub amount: u64,
}

impl LoanRequest {
    fn validate(&self) -> Result<(), LoanError> {
        if self.borrower.trim().is_empty() {
            return Err(LoanError::MissingBorrower);
        }
        if self.amount == 0 {
            return Err(LoanError::InvalidAmount);
        }
        Ok(())
    }
}

/// A concrete loan offer. Produced for every valid application — a rejected
/// application still gets an offer, just one with `approved: false` and a
/// zero principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanOffer {
    /// Offer identifier, `LOAN-<millis>-<suffix>`.
    pub loan_id: String,
    /// Borrower address the offer was made to.
    pub borrower: String,
    /// The scoring assessment the terms derive from.
    #[serde(flatten)]
    pub assessment: LoanAssessment,
    /// Collateral the borrower must post, in currency units.
    pub collateral_required: u64,
    /// When the offer was generated.
    pub created_at: DateTime<Utc>,
}

fn loan_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!(
        "LOAN-{}-{}",
        Utc::now().timestamp_millis(),
        suffix.to_lowercase()
    )
}

/// Validates an application, scores the credential set, and produces an
/// offer. The only failures are malformed applications; an applicant with
/// weak credentials gets an unapproved offer, not an error.
pub fn process_application(
    credentials: &[CredentialProfile],
    request: &LoanRequest,
) -> Result<LoanOffer, LoanError> {
    request.validate()?;

    let assessment = scoring::assess(credentials, request.amount);
    let collateral_required = (assessment.approved_amount as f64
        * f64::from(assessment.collateral_ratio)
        / 100.0)
        .round() as u64;

    let offer = LoanOffer {
        loan_id: loan_id(),
        borrower: request.borrower.clone(),
        collateral_required,
        created_at: Utc::now(),
        assessment,
    };

    tracing::info!(
        loan_id = %offer.loan_id,
        borrower = %offer.borrower,
        approved = offer.assessment.approved,
        amount = offer.assessment.approved_amount,
        "loan application processed"
    );

    Ok(offer)
}

// ---------------------------------------------------------------------------
// Borrower standing
// ---------------------------------------------------------------------------

/// A borrower's standing on the ledger. Unknown accounts come back all-zero
/// rather than as an error, so callers can render "not on the network yet".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerStatus {
    /// Whether the account exists on the ledger.
    pub account_exists: bool,
    /// Native balance, in stroops.
    pub native_balance: u64,
    /// Number of open trustlines.
    pub trustlines: usize,
    /// Number of credential tokens held (assets with the platform prefix).
    pub credential_tokens: usize,
}

/// Looks up a borrower's account and summarizes their standing.
pub fn validate_borrower(ledger: &TestnetLedger, address: &str) -> BorrowerStatus {
    match ledger.load_account(address) {
        Some(account) => BorrowerStatus {
            account_exists: true,
            native_balance: account.native_balance,
            trustlines: account.asset_balances.len(),
            credential_tokens: account
                .asset_balances
                .iter()
                .filter(|b| b.asset.code.starts_with("EDU") && b.amount > 0)
                .count(),
        },
        None => BorrowerStatus {
            account_exists: false,
            native_balance: 0,
            trustlines: 0,
            credential_tokens: 0,
        },
    }
}

// ---------------------------------------------------------------------------
// Pool views
// ---------------------------------------------------------------------------

/// Demo lending pool statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatistics {
    /// Total supplied to the pool, in currency units.
    pub total_supplied: u64,
    /// Total borrowed from the pool, in currency units.
    pub total_borrowed: u64,
    /// Utilization, in percent.
    pub utilization_pct: f64,
    /// Supply APY, in percent.
    pub supply_apy: f64,
    /// Borrow APY, in percent.
    pub borrow_apy: f64,
}

/// Current pool statistics. The pool figures are fixed demo values; the
/// rates derive from them.
pub fn pool_statistics() -> PoolStatistics {
    let utilization =
        config::POOL_TOTAL_BORROWED as f64 / config::POOL_TOTAL_SUPPLIED as f64 * 100.0;
    let supply_apy = utilization * config::POOL_SUPPLY_RATE_FACTOR;
    let borrow_apy = supply_apy * config::POOL_BORROW_RATE_MULTIPLIER;

    PoolStatistics {
        total_supplied: config::POOL_TOTAL_SUPPLIED,
        total_borrowed: config::POOL_TOTAL_BORROWED,
        utilization_pct: round2(utilization),
        supply_apy: round2(supply_apy),
        borrow_apy: round2(borrow_apy),
    }
}

/// Static information about the lending integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LendingContractInfo {
    /// Network the contract lives on.
    pub network: String,
    /// Credential contract offers are anchored against.
    pub contract_id: String,
    /// Explorer link for the contract account.
    pub explorer_url: String,
}

/// Contract metadata for status endpoints.
pub fn contract_info() -> LendingContractInfo {
    LendingContractInfo {
        network: config::NETWORK_NAME.to_string(),
        contract_id: config::CREDENTIAL_CONTRACT_ID.to_string(),
        explorer_url: format!(
            "{}/account/{}",
            config::EXPLORER_BASE_URL,
            config::CREDENTIAL_CONTRACT_ID
        ),
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount: u64) -> LoanRequest {
        LoanRequest {
            borrower: "EDU7BORROWER".into(),
            amount,
        }
    }

    #[test]
    fn offer_collateral_derives_from_assessment() {
        // 36 points -> approved 3,600 at collateral ratio 150%.
        let creds = vec![CredentialProfile::new("MIT", &["a", "b", "c"])];
        let offer = process_application(&creds, &request(10_000)).unwrap();

        assert_eq!(offer.assessment.approved_amount, 3_600);
        assert_eq!(offer.collateral_required, 5_400);
        assert!(offer.loan_id.starts_with("LOAN-"));
        assert_eq!(offer.borrower, "EDU7BORROWER");
    }

    #[test]
    fn weak_credentials_yield_unapproved_offer_not_error() {
        let creds = vec![CredentialProfile::new("Unknown College", &[])];
        let offer = process_application(&creds, &request(10_000)).unwrap();
        assert!(!offer.assessment.approved);
    }

    #[test]
    fn zero_amount_rejected() {
        assert!(matches!(
            process_application(&[], &request(0)),
            Err(LoanError::InvalidAmount)
        ));
    }

    #[test]
    fn blank_borrower_rejected() {
        let req = LoanRequest {
            borrower: "  ".into(),
            amount: 100,
        };
        assert!(matches!(
            process_application(&[], &req),
            Err(LoanError::MissingBorrower)
        ));
    }

    #[test]
    fn loan_ids_are_unique() {
        let creds = vec![CredentialProfile::new("MIT", &[])];
        let a = process_application(&creds, &request(100)).unwrap();
        let b = process_application(&creds, &request(100)).unwrap();
        assert_ne!(a.loan_id, b.loan_id);
    }

    #[test]
    fn unknown_borrower_status_is_all_zero() {
        let ledger = TestnetLedger::new();
        let status = validate_borrower(&ledger, "EDUNOBODY");
        assert_eq!(
            status,
            BorrowerStatus {
                account_exists: false,
                native_balance: 0,
                trustlines: 0,
                credential_tokens: 0,
            }
        );
    }

    #[test]
    fn borrower_status_counts_credential_tokens() {
        use crate::credential::{CredentialIssuer, CredentialRecord};
        use std::sync::Arc;

        let ledger = Arc::new(TestnetLedger::bootstrap());
        let issuer = CredentialIssuer::new(Arc::clone(&ledger));
        let record =
            CredentialRecord::platform_issued("cred-1", "Title", "EDU7BORROWER", vec![]);
        issuer.issue("EDU7BORROWER", &record).unwrap();

        let status = validate_borrower(&ledger, "EDU7BORROWER");
        assert!(status.account_exists);
        assert_eq!(status.trustlines, 1);
        assert_eq!(status.credential_tokens, 1);
    }

    #[test]
    fn pool_statistics_match_demo_figures() {
        let stats = pool_statistics();
        assert_eq!(stats.total_supplied, 2_750_000);
        assert_eq!(stats.total_borrowed, 1_980_000);
        assert_eq!(stats.utilization_pct, 72.0);
        assert_eq!(stats.supply_apy, 5.76);
        assert_eq!(stats.borrow_apy, 8.64);
    }

    #[test]
    fn contract_info_links_to_explorer() {
        let info = contract_info();
        assert_eq!(info.network, config::NETWORK_NAME);
        assert!(info.explorer_url.contains(&info.contract_id));
    }
}
