//! # Credential-Based Loan Scoring
//!
//! Pure scoring over a borrower's credential set. The function is total:
//! any input produces an assessment, the same input always produces the
//! same assessment, and credential order never matters.
//!
//! The weights live in [`crate::config`] and are treated as fixed platform
//! policy, not tunables.

use serde::{Deserialize, Serialize};

use crate::config;

/// The slice of a credential the scorer looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialProfile {
    /// Issuing institution name.
    pub issuer: String,
    /// Skill tags on the credential.
    pub skills: Vec<String>,
}

impl CredentialProfile {
    /// Convenience constructor.
    pub fn new(issuer: &str, skills: &[&str]) -> Self {
        Self {
            issuer: issuer.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A loan assessment for one borrower and one requested amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanAssessment {
    /// Risk score in `[MIN_RISK_SCORE, MAX_RISK_SCORE]`; lower is better.
    pub risk_score: u32,
    /// Approved principal, capped by the credential-derived credit line.
    pub approved_amount: u64,
    /// Annual interest rate in percent, rounded to two decimals.
    pub interest_rate: f64,
    /// Required collateral as a percent of principal.
    pub collateral_ratio: u32,
    /// Whether the application clears the approval gate.
    pub approved: bool,
}

/// Points earned by a single credential.
fn credential_points(credential: &CredentialProfile) -> u32 {
    let issuer_lower = credential.issuer.to_lowercase();
    let institution_bonus = if config::PREFERRED_INSTITUTIONS
        .iter()
        .any(|name| issuer_lower.contains(&name.to_lowercase()))
    {
        config::PREFERRED_INSTITUTION_BONUS
    } else {
        config::STANDARD_INSTITUTION_BONUS
    };

    config::POINTS_PER_CREDENTIAL
        + institution_bonus
        + config::POINTS_PER_SKILL * credential.skills.len() as u32
}

/// Scores a credential set against a requested principal.
///
/// With no credentials at all the borrower is maximum-risk and the terms are
/// all-zero: nothing approved, no rate, no collateral band. Otherwise every
/// credential contributes a flat award, an institution bonus (preferred
/// institutions are matched case-insensitively by substring), and a per-skill
/// award; risk, rate, credit line, and collateral all derive from that total.
pub fn assess(credentials: &[CredentialProfile], requested_amount: u64) -> LoanAssessment {
    if credentials.is_empty() {
        return LoanAssessment {
            risk_score: config::MAX_RISK_SCORE,
            approved_amount: 0,
            interest_rate: 0.0,
            collateral_ratio: 0,
            approved: false,
        };
    }

    let total: u32 = credentials.iter().map(credential_points).sum();

    let risk_score = config::MAX_RISK_SCORE
        .saturating_sub(total)
        .max(config::MIN_RISK_SCORE);

    let credit_line = u64::from(total) * config::CREDIT_PER_POINT;
    let approved_amount = requested_amount.min(credit_line);

    let raw_rate =
        (f64::from(risk_score) * config::INTEREST_RATE_PER_RISK_POINT).max(config::MIN_INTEREST_RATE_PCT);
    let interest_rate = (raw_rate * 100.0).round() / 100.0;

    let collateral_ratio =
        (config::BASE_COLLATERAL_RATIO_PCT + risk_score).min(config::MAX_COLLATERAL_RATIO_PCT);

    LoanAssessment {
        risk_score,
        approved_amount,
        interest_rate,
        collateral_ratio,
        approved: total >= config::APPROVAL_SCORE_THRESHOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_credentials_is_maximum_risk_all_zero_terms() {
        let assessment = assess(&[], 50_000);
        assert_eq!(
            assessment,
            LoanAssessment {
                risk_score: 100,
                approved_amount: 0,
                interest_rate: 0.0,
                collateral_ratio: 0,
                approved: false,
            }
        );
    }

    #[test]
    fn preferred_institution_with_skills_worked_example() {
        // 10 flat + 20 institution + 3 * 2 skills = 36 points.
        let creds = vec![CredentialProfile::new(
            "MIT OpenCourseWare",
            &["Rust", "Distributed Systems", "Cryptography"],
        )];
        let assessment = assess(&creds, 10_000);

        assert_eq!(assessment.risk_score, 64);
        assert_eq!(assessment.approved_amount, 3_600);
        assert_eq!(assessment.interest_rate, 6.4);
        assert_eq!(assessment.collateral_ratio, 150);
        assert!(assessment.approved);
    }

    #[test]
    fn unknown_institution_no_skills_is_rejected() {
        // 10 flat + 5 institution = 15 points, below the approval gate.
        let creds = vec![CredentialProfile::new("Unknown College", &[])];
        let assessment = assess(&creds, 10_000);

        assert_eq!(assessment.risk_score, 85);
        assert_eq!(assessment.approved_amount, 1_500);
        assert_eq!(assessment.interest_rate, 8.5);
        assert_eq!(assessment.collateral_ratio, 150);
        assert!(!assessment.approved);
    }

    #[test]
    fn institution_match_is_case_insensitive_substring() {
        let upper = assess(&[CredentialProfile::new("STANFORD UNIVERSITY", &[])], 1_000);
        let lower = assess(&[CredentialProfile::new("stanford online", &[])], 1_000);
        let miss = assess(&[CredentialProfile::new("Stanfield Academy", &[])], 1_000);

        assert_eq!(upper.risk_score, 70);
        assert_eq!(lower.risk_score, 70);
        assert_eq!(miss.risk_score, 85);
    }

    #[test]
    fn order_of_credentials_never_matters() {
        let a = CredentialProfile::new("Harvard", &["Finance"]);
        let b = CredentialProfile::new("Local Bootcamp", &["Rust", "SQL"]);
        let c = CredentialProfile::new("Berkeley", &[]);

        let forward = assess(&[a.clone(), b.clone(), c.clone()], 25_000);
        let backward = assess(&[c, b, a], 25_000);
        assert_eq!(forward, backward);
    }

    #[test]
    fn risk_floor_holds_for_large_credential_sets() {
        // 20 preferred credentials with 5 skills each: far past 100 points.
        let creds: Vec<_> = (0..20)
            .map(|_| CredentialProfile::new("Caltech", &["a", "b", "c", "d", "e"]))
            .collect();
        let assessment = assess(&creds, 1_000_000);

        assert_eq!(assessment.risk_score, config::MIN_RISK_SCORE);
        assert_eq!(assessment.interest_rate, config::MIN_INTEREST_RATE_PCT);
        assert_eq!(
            assessment.collateral_ratio,
            config::BASE_COLLATERAL_RATIO_PCT + config::MIN_RISK_SCORE
        );
        assert!(assessment.approved);
    }

    #[test]
    fn approved_amount_caps_at_request() {
        // 36 points -> 3,600 credit line; a smaller request passes through.
        let creds = vec![CredentialProfile::new("MIT", &["a", "b", "c"])];
        let assessment = assess(&creds, 2_000);
        assert_eq!(assessment.approved_amount, 2_000);
    }

    #[test]
    fn assessment_bounds_hold_across_inputs() {
        let cases: Vec<Vec<CredentialProfile>> = vec![
            vec![CredentialProfile::new("X", &[])],
            vec![CredentialProfile::new("MIT", &[]); 3],
            vec![CredentialProfile::new("Y", &["s"; 40])],
        ];
        for creds in cases {
            let a = assess(&creds, 77_777);
            assert!(a.risk_score >= config::MIN_RISK_SCORE);
            assert!(a.risk_score <= config::MAX_RISK_SCORE);
            assert!(a.interest_rate >= config::MIN_INTEREST_RATE_PCT);
            assert!(a.collateral_ratio <= config::MAX_COLLATERAL_RATIO_PCT);
            assert!(a.approved_amount <= 77_777);
        }
    }
}
