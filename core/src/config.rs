//! # Platform Configuration & Constants
//!
//! Every magic number in EduChain lives here. The scoring weights and byte
//! budgets below were fixed early in the platform's life and are load-bearing:
//! changing any of them changes which applicants get approved and which
//! credentials survive the trip through the ledger's annotation channels.
//!
//! None of the scoring constants have a published derivation. They are kept
//! verbatim as configuration, not recomputed from some "intended" formula.

// ---------------------------------------------------------------------------
// Network Identity
// ---------------------------------------------------------------------------

/// Human-readable network name used in status responses and logs.
pub const NETWORK_NAME: &str = "testnet";

/// Base URL of the block explorer for the test network. Transaction and
/// account links in API responses are built from this.
pub const EXPLORER_BASE_URL: &str = "https://explorer.educhain.dev/testnet";

/// Platform account that issues credentials on behalf of EduChain.
///
/// On the hosted test network this account holds enough balance to create
/// recipient accounts and pay transaction fees. The simulated ledger funds
/// it at bootstrap.
pub const PLATFORM_ISSUER_ADDRESS: &str =
    "EDUBSJF7HiECSePB7S4TzSHRFxxVSEJUNZVN5WiCWGVAX2PZWiX6X43K";

/// The deployed credential contract account on the test network.
///
/// Every issuance transaction carries a `CONTRACT_REF` data entry pointing
/// here so that third-party verifiers can anchor a credential to the
/// platform contract.
pub const CREDENTIAL_CONTRACT_ID: &str =
    "EDUK6STDAZKYRiT2ZMQAMNRKXoDTOBMNQiXLQ5H3F2QSD2E2BHVCZNZL";

/// How many leading characters of the contract ID fit in the memo channel's
/// compact annotation.
pub const CONTRACT_REF_PREFIX_LEN: usize = 10;

// ---------------------------------------------------------------------------
// Annotation Byte Budgets
// ---------------------------------------------------------------------------

/// Byte budget for a manage-data entry value. The ledger rejects larger
/// values, so the codec truncates to exactly this many bytes.
pub const MANAGE_DATA_VALUE_BUDGET: usize = 64;

/// Byte budget for a text memo. Smaller than the manage-data budget, so the
/// memo carries only the compact annotation form.
pub const MEMO_TEXT_BUDGET: usize = 28;

/// Type tag carried in the compact (memo) annotation.
pub const ANNOTATION_TYPE_TAG: &str = "education";

/// Version tag carried in the compact (memo) annotation.
pub const ANNOTATION_VERSION_TAG: &str = "1.0";

/// Verification method name embedded in the full annotation.
pub const VERIFICATION_METHOD: &str = "educhain-ledger";

/// Platform name embedded in the full annotation.
pub const PLATFORM_NAME: &str = "EduChain";

// ---------------------------------------------------------------------------
// Loan Scoring Weights
// ---------------------------------------------------------------------------

/// Flat points awarded per credential, regardless of content.
pub const POINTS_PER_CREDENTIAL: u32 = 10;

/// Institution bonus when the issuer matches the preferred set.
pub const PREFERRED_INSTITUTION_BONUS: u32 = 20;

/// Institution bonus for any other issuer.
pub const STANDARD_INSTITUTION_BONUS: u32 = 5;

/// Points per skill tag on a credential.
pub const POINTS_PER_SKILL: u32 = 2;

/// Institutions whose credentials earn the preferred bonus. Matching is a
/// case-insensitive substring test against the issuer name.
pub const PREFERRED_INSTITUTIONS: [&str; 5] =
    ["MIT", "Stanford", "Harvard", "Berkeley", "Caltech"];

/// Risk score floor. No applicant is ever "risk-free".
pub const MIN_RISK_SCORE: u32 = 10;

/// Risk score assigned to an applicant with no credentials at all.
pub const MAX_RISK_SCORE: u32 = 100;

/// Currency units of credit extended per total score point.
pub const CREDIT_PER_POINT: u64 = 100;

/// Minimum total score required for approval.
pub const APPROVAL_SCORE_THRESHOLD: u32 = 20;

/// Interest rate floor, in percent.
pub const MIN_INTEREST_RATE_PCT: f64 = 5.0;

/// Interest rate per risk point, in percent.
pub const INTEREST_RATE_PER_RISK_POINT: f64 = 0.1;

/// Base collateral requirement, in percent of principal.
pub const BASE_COLLATERAL_RATIO_PCT: u32 = 100;

/// Collateral requirement ceiling, in percent of principal.
pub const MAX_COLLATERAL_RATIO_PCT: u32 = 150;

// ---------------------------------------------------------------------------
// Lending Pool (demo figures)
// ---------------------------------------------------------------------------

/// Total supplied to the demo lending pool, in currency units.
pub const POOL_TOTAL_SUPPLIED: u64 = 2_750_000;

/// Total borrowed from the demo lending pool, in currency units.
pub const POOL_TOTAL_BORROWED: u64 = 1_980_000;

/// Supply APY per utilization point.
pub const POOL_SUPPLY_RATE_FACTOR: f64 = 0.08;

/// Borrow APY multiplier over the supply rate.
pub const POOL_BORROW_RATE_MULTIPLIER: f64 = 1.5;

// ---------------------------------------------------------------------------
// Ledger Parameters
// ---------------------------------------------------------------------------

/// Starting balance (in stroops, 10^-7 units) for accounts created as a
/// side effect of credential issuance. Just enough for basic operations.
pub const ISSUANCE_STARTING_BALANCE: u64 = 2_0000000;

/// Balance granted by the simulated friendbot to freshly created test
/// accounts, in stroops.
pub const FRIENDBOT_STARTING_BALANCE: u64 = 10_000_0000000;

/// Flat fee charged per submitted transaction, in stroops.
pub const BASE_TX_FEE: u64 = 100;

/// Minimum plausible length of a transaction hash. Shorter strings are
/// rejected before the ledger lookup.
pub const MIN_TX_HASH_LEN: usize = 10;

// ---------------------------------------------------------------------------
// Server Defaults
// ---------------------------------------------------------------------------

/// Default REST API port.
pub const DEFAULT_API_PORT: u16 = 8745;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 8746;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_budgets_ordering() {
        // The memo channel is strictly smaller than the manage-data channel;
        // the compact form exists precisely because of this.
        assert!(MEMO_TEXT_BUDGET < MANAGE_DATA_VALUE_BUDGET);
        assert!(CONTRACT_REF_PREFIX_LEN < MEMO_TEXT_BUDGET);
    }

    #[test]
    fn scoring_constants_sanity() {
        assert!(MIN_RISK_SCORE < MAX_RISK_SCORE);
        assert!(STANDARD_INSTITUTION_BONUS < PREFERRED_INSTITUTION_BONUS);
        // A single no-skill credential from an unknown issuer must stay
        // below the approval gate (10 + 5 = 15 < 20).
        assert!(POINTS_PER_CREDENTIAL + STANDARD_INSTITUTION_BONUS < APPROVAL_SCORE_THRESHOLD);
        // A single preferred-institution credential alone clears it.
        assert!(POINTS_PER_CREDENTIAL + PREFERRED_INSTITUTION_BONUS >= APPROVAL_SCORE_THRESHOLD);
    }

    #[test]
    fn collateral_band_sanity() {
        assert!(BASE_COLLATERAL_RATIO_PCT < MAX_COLLATERAL_RATIO_PCT);
        // The ceiling binds for any risk score above 50.
        assert!(BASE_COLLATERAL_RATIO_PCT + MIN_RISK_SCORE <= MAX_COLLATERAL_RATIO_PCT);
    }

    #[test]
    fn pool_figures_sanity() {
        assert!(POOL_TOTAL_BORROWED < POOL_TOTAL_SUPPLIED);
    }
}
