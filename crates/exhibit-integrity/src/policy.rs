//! # Scoring Policy
//!
//! The fixed, deterministic weights behind verification confidence and
//! tamper integrity scores. These are not a statistical model. The defaults
//! are the values stored proofs were scored with and must not drift.
//!
//! | Verification check | Weight | | Tamper severity | Deduction |
//! |---|---|---|---|---|
//! | hash match | 40 | | CRITICAL | 40 |
//! | signature valid | 30 | | HIGH | 25 |
//! | timestamp valid | 20 | | MEDIUM | 15 |
//! | Merkle root present | 10 | | LOW | 5 |
//!
//! Confidence ≥ 80 is `VERIFIED`, 60 to 79 `INCONCLUSIVE`, below 60 `FAILED`.

use serde::{Deserialize, Serialize};

use crate::proof::VerificationResult;
use crate::tamper::{Severity, TamperIndicator};
use crate::verification::PrimitiveChecks;

/// Ceiling for confidence and integrity scores.
pub const MAX_SCORE: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub hash_match_weight: u8,
    pub signature_weight: u8,
    pub timestamp_weight: u8,
    pub merkle_weight: u8,
    /// Minimum confidence for `VERIFIED`.
    pub verified_threshold: u8,
    /// Minimum confidence for `INCONCLUSIVE`.
    pub inconclusive_threshold: u8,
    pub critical_deduction: u8,
    pub high_deduction: u8,
    pub medium_deduction: u8,
    pub low_deduction: u8,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            hash_match_weight: 40,
            signature_weight: 30,
            timestamp_weight: 20,
            merkle_weight: 10,
            verified_threshold: 80,
            inconclusive_threshold: 60,
            critical_deduction: 40,
            high_deduction: 25,
            medium_deduction: 15,
            low_deduction: 5,
        }
    }
}

impl ScoringPolicy {
    /// Additive confidence, capped at [`MAX_SCORE`].
    pub fn confidence(&self, checks: &PrimitiveChecks) -> u8 {
        let score: u32 = [
            (checks.hash_match, self.hash_match_weight),
            (checks.signature_valid, self.signature_weight),
            (checks.timestamp_valid, self.timestamp_weight),
            (checks.merkle_present, self.merkle_weight),
        ]
        .iter()
        .filter(|(passed, _)| *passed)
        .map(|(_, weight)| u32::from(*weight))
        .sum();
        score.min(u32::from(MAX_SCORE)) as u8
    }

    pub fn verdict(&self, confidence: u8) -> VerificationResult {
        if confidence >= self.verified_threshold {
            VerificationResult::Verified
        } else if confidence >= self.inconclusive_threshold {
            VerificationResult::Inconclusive
        } else {
            VerificationResult::Failed
        }
    }

    pub fn deduction(&self, severity: Severity) -> u8 {
        match severity {
            Severity::Critical => self.critical_deduction,
            Severity::High => self.high_deduction,
            Severity::Medium => self.medium_deduction,
            Severity::Low => self.low_deduction,
        }
    }

    /// `100 - Σ deductions`, floored at 0.
    pub fn integrity_score(&self, indicators: &[TamperIndicator]) -> u8 {
        indicators
            .iter()
            .fold(MAX_SCORE, |score, i| score.saturating_sub(self.deduction(i.severity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tamper::IndicatorType;

    fn checks(hash: bool, sig: bool, ts: bool, merkle: bool) -> PrimitiveChecks {
        PrimitiveChecks {
            hash_match: hash,
            signature_valid: sig,
            timestamp_valid: ts,
            merkle_present: merkle,
        }
    }

    fn indicator(severity: Severity) -> TamperIndicator {
        TamperIndicator {
            indicator_type: IndicatorType::HashMismatch,
            severity,
            description: String::new(),
            evidence: String::new(),
            confidence: 95,
        }
    }

    #[test]
    fn all_checks_pass_scores_100() {
        let p = ScoringPolicy::default();
        assert_eq!(p.confidence(&checks(true, true, true, true)), 100);
        assert_eq!(p.verdict(100), VerificationResult::Verified);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let p = ScoringPolicy::default();
        assert_eq!(p.verdict(80), VerificationResult::Verified);
        assert_eq!(p.verdict(79), VerificationResult::Inconclusive);
        assert_eq!(p.verdict(60), VerificationResult::Inconclusive);
        assert_eq!(p.verdict(59), VerificationResult::Failed);
        assert_eq!(p.verdict(0), VerificationResult::Failed);
    }

    #[test]
    fn oversized_weights_are_capped() {
        let p = ScoringPolicy {
            hash_match_weight: 90,
            signature_weight: 90,
            ..ScoringPolicy::default()
        };
        assert_eq!(p.confidence(&checks(true, true, true, true)), 100);
    }

    #[test]
    fn integrity_score_floors_at_zero() {
        let p = ScoringPolicy::default();
        assert_eq!(p.integrity_score(&[]), 100);
        assert_eq!(p.integrity_score(&[indicator(Severity::Critical)]), 60);
        assert_eq!(
            p.integrity_score(&[indicator(Severity::High), indicator(Severity::Low)]),
            70
        );
        let many = vec![indicator(Severity::Critical); 3];
        assert_eq!(p.integrity_score(&many), 0);
    }

    #[test]
    fn deductions_by_severity() {
        let p = ScoringPolicy::default();
        assert_eq!(p.deduction(Severity::Critical), 40);
        assert_eq!(p.deduction(Severity::High), 25);
        assert_eq!(p.deduction(Severity::Medium), 15);
        assert_eq!(p.deduction(Severity::Low), 5);
    }
}
